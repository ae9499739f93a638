//! Integration tests for Stashbox accounts.
//!
//! Drives the real axum router end to end, with a `wiremock` server standing
//! in for the Appwrite API (both the users collection and email tokens).
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p stashbox-integration-tests
//! ```

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::MockServer;

use stashbox_accounts::appwrite::AppwriteClient;
use stashbox_accounts::config::AppwriteConfig;
use stashbox_accounts::directory::AppwriteDirectory;
use stashbox_accounts::otp::AppwriteOtpIssuer;
use stashbox_accounts::routes;
use stashbox_accounts::state::AppState;
use stashbox_core::Avatar;

/// Path of the users collection's documents on the mock server.
pub const DOCUMENTS_PATH: &str = "/v1/databases/main/collections/users/documents";

/// Path of the email-token endpoint on the mock server.
pub const TOKENS_PATH: &str = "/v1/account/tokens/email";

/// A router wired to a mock Appwrite.
pub struct TestContext {
    pub appwrite: MockServer,
    app: Router,
}

impl TestContext {
    /// Start a mock Appwrite and build the application against it.
    ///
    /// # Panics
    ///
    /// Panics if the Appwrite client cannot be built.
    pub async fn new() -> Self {
        let appwrite = MockServer::start().await;

        let config = AppwriteConfig::for_endpoint(
            &format!("{}/v1", appwrite.uri()),
            SecretString::from("test-api-key"),
        );
        let client = AppwriteClient::new(&config).expect("Failed to build Appwrite client");

        let state = AppState::new(
            Arc::new(AppwriteDirectory::new(
                client.clone(),
                &config.database_id,
                &config.users_collection_id,
            )),
            Arc::new(AppwriteOtpIssuer::new(client)),
            Avatar::default(),
        );

        Self {
            appwrite,
            app: routes::app(state),
        }
    }

    /// `POST /api/accounts` with a JSON body, from the given client IP.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body is not JSON.
    pub async fn create_account_from(&self, client_ip: &str, body: &Value) -> (StatusCode, Value) {
        let request = Request::post("/api/accounts")
            .header("content-type", "application/json")
            .header("x-forwarded-for", client_ip)
            .body(Body::from(body.to_string()))
            .expect("Failed to build request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }

    /// `POST /api/accounts` from a fixed client IP.
    pub async fn create_account(&self, full_name: &str, email: &str) -> (StatusCode, Value) {
        self.create_account_from(
            "203.0.113.10",
            &json!({ "fullName": full_name, "email": email }),
        )
        .await
    }

    /// `GET` a path and return its status.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn get_status(&self, path: &str) -> StatusCode {
        let request = Request::get(path)
            .body(Body::empty())
            .expect("Failed to build request");

        self.app
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible")
            .status()
    }
}

/// A user document as Appwrite returns it.
#[must_use]
pub fn user_document(id: &str, full_name: &str, email: &str, account_id: &str) -> Value {
    json!({
        "$id": id,
        "$collectionId": "users",
        "$databaseId": "main",
        "$createdAt": "2024-03-12T10:15:30.123+00:00",
        "$updatedAt": "2024-03-12T10:15:30.123+00:00",
        "$permissions": [],
        "fullName": full_name,
        "email": email,
        "avatar": "https://cdn.example.com/avatar.png",
        "accountId": account_id
    })
}

/// An email-token response for `user_id`.
#[must_use]
pub fn token_response(user_id: &str) -> Value {
    json!({
        "$id": "bb8ea5c16897e",
        "$createdAt": "2024-03-12T10:15:30.123+00:00",
        "userId": user_id,
        "secret": "",
        "expire": "2024-03-12T10:30:30.123+00:00",
        "phrase": ""
    })
}

/// An Appwrite error body.
#[must_use]
pub fn appwrite_error(code: u16, kind: &str, message: &str) -> Value {
    json!({ "message": message, "code": code, "type": kind })
}
