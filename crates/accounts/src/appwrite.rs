//! Appwrite REST API client.
//!
//! A thin wrapper around `reqwest` that carries the project and API-key
//! headers and turns Appwrite's JSON error bodies into [`AppwriteError`].
//! The directory and OTP modules build their calls on top of it.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::AppwriteConfig;

/// Errors that can occur when talking to the Appwrite API.
#[derive(Debug, Error)]
pub enum AppwriteError {
    /// HTTP request failed (connection, timeout, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} {kind} - {message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },

    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configured endpoint or a derived URL is invalid.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// A header value could not be built from configuration.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl AppwriteError {
    /// HTTP status of an API error, if this is one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error body returned by Appwrite on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(rename = "type", default)]
    kind: String,
}

/// Appwrite API client scoped to one project.
#[derive(Clone)]
pub struct AppwriteClient {
    client: reqwest::Client,
    endpoint: String,
}

impl AppwriteClient {
    /// Create a new Appwrite API client.
    ///
    /// # Errors
    ///
    /// Returns error if a header cannot be built or the HTTP client fails to build.
    pub fn new(config: &AppwriteConfig) -> Result<Self, AppwriteError> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "X-Appwrite-Project",
            HeaderValue::from_str(&config.project_id)
                .map_err(|e| AppwriteError::InvalidHeader(format!("project id: {e}")))?,
        );

        let mut key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|e| AppwriteError::InvalidHeader(format!("api key: {e}")))?;
        key.set_sensitive(true);
        headers.insert("X-Appwrite-Key", key);

        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Build an absolute URL for an API path such as `/account/tokens/email`.
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint and path do not form a valid URL.
    pub fn url(&self, path: &str) -> Result<Url, AppwriteError> {
        Ok(Url::parse(&format!("{}{path}", self.endpoint))?)
    }

    /// Send a GET request and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the API answers with an error,
    /// or the body does not decode as `T`.
    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, AppwriteError> {
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    /// Send a POST request with a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the API answers with an error,
    /// or the body does not decode as `T`.
    pub async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &serde_json::Value,
    ) -> Result<T, AppwriteError> {
        let response = self.client.post(url).json(body).send().await?;
        decode(response).await
    }
}

/// Decode a successful response, or turn an error response into [`AppwriteError::Api`].
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppwriteError> {
    let status = response.status();

    if !status.is_success() {
        return Err(api_error(status, &response.text().await.unwrap_or_default()));
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| AppwriteError::Parse(e.to_string()))
}

fn api_error(status: StatusCode, body: &str) -> AppwriteError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) => AppwriteError::Api {
            status: status.as_u16(),
            kind: err.kind,
            message: err.message,
        },
        // Proxies in front of Appwrite answer with HTML or plain text
        Err(_) => AppwriteError::Api {
            status: status.as_u16(),
            kind: String::new(),
            message: body.chars().take(200).collect(),
        },
    }
}
