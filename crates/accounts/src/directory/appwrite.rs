//! Appwrite Databases backend.
//!
//! User records are documents in one collection with the attributes
//! `fullName`, `email`, `avatar` and `accountId`. To make email uniqueness
//! hold under concurrent sign-ups, give the collection a unique index on
//! `email`; Appwrite then answers a duplicate create with 409, surfaced
//! here as [`DirectoryError::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use stashbox_core::{Avatar, Email, UserRecordId};

use super::{DirectoryError, DirectoryStore, DocumentList};
use crate::appwrite::{AppwriteClient, AppwriteError};
use crate::models::{NewUserRecord, UserRecord};

/// Directory stored in an Appwrite collection.
#[derive(Clone)]
pub struct AppwriteDirectory {
    client: AppwriteClient,
    database_id: String,
    collection_id: String,
}

impl AppwriteDirectory {
    /// Create a directory over `database_id`/`collection_id`.
    #[must_use]
    pub fn new(client: AppwriteClient, database_id: &str, collection_id: &str) -> Self {
        Self {
            client,
            database_id: database_id.to_owned(),
            collection_id: collection_id.to_owned(),
        }
    }

    fn collection_url(&self) -> Result<Url, AppwriteError> {
        self.client.url(&format!(
            "/databases/{}/collections/{}",
            self.database_id, self.collection_id
        ))
    }

    fn documents_url(&self) -> Result<Url, AppwriteError> {
        self.client.url(&format!(
            "/databases/{}/collections/{}/documents",
            self.database_id, self.collection_id
        ))
    }
}

/// An Appwrite `equal` query, serialized the way the REST API expects it.
fn equal_query(attribute: &str, value: &str) -> String {
    json!({
        "method": "equal",
        "attribute": attribute,
        "values": [value],
    })
    .to_string()
}

#[async_trait]
impl DirectoryStore for AppwriteDirectory {
    async fn list_by_email(&self, email: &Email) -> Result<DocumentList, DirectoryError> {
        let mut url = self.documents_url()?;
        url.query_pairs_mut()
            .append_pair("queries[]", &equal_query("email", email.as_str()));

        let list: DocumentListBody = self.client.get(url).await?;

        let documents = list
            .documents
            .into_iter()
            .map(UserRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DocumentList {
            total: list.total,
            documents,
        })
    }

    async fn create(
        &self,
        id: &UserRecordId,
        record: NewUserRecord,
    ) -> Result<UserRecord, DirectoryError> {
        let body = json!({
            "documentId": id,
            "data": {
                "fullName": record.full_name,
                "email": record.email,
                "avatar": record.avatar,
                "accountId": record.account_id,
            },
        });

        let document: UserDocument = self
            .client
            .post(self.documents_url()?, &body)
            .await
            .map_err(|e| match e {
                AppwriteError::Api {
                    status: 409,
                    message,
                    ..
                } => DirectoryError::Conflict(message),
                other => DirectoryError::Appwrite(other),
            })?;

        UserRecord::try_from(document)
    }

    async fn ping(&self) -> Result<(), DirectoryError> {
        let _: serde_json::Value = self.client.get(self.collection_url()?).await?;
        Ok(())
    }
}

/// Wire format of `GET .../documents`.
#[derive(Debug, Deserialize)]
struct DocumentListBody {
    total: u64,
    documents: Vec<UserDocument>,
}

/// Wire format of one user document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDocument {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "$createdAt", default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    full_name: String,
    email: String,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    account_id: Option<String>,
}

impl TryFrom<UserDocument> for UserRecord {
    type Error = DirectoryError;

    fn try_from(doc: UserDocument) -> Result<Self, Self::Error> {
        let email = Email::parse(&doc.email).map_err(|e| {
            DirectoryError::DataCorruption(format!("document {}: invalid email: {e}", doc.id))
        })?;
        let avatar = doc
            .avatar
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| Avatar::default().into_inner());

        Ok(Self {
            id: doc.id,
            full_name: doc.full_name,
            email,
            avatar,
            account_id: doc.account_id.filter(|a| !a.is_empty()),
            created_at: doc.created_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use stashbox_core::{AccountId, FullName};

    use super::*;
    use crate::config::AppwriteConfig;

    const DOCUMENTS_PATH: &str = "/v1/databases/main/collections/users/documents";

    fn directory_for(server: &MockServer) -> AppwriteDirectory {
        let config = AppwriteConfig::for_endpoint(
            &format!("{}/v1", server.uri()),
            SecretString::from("test-api-key"),
        );
        let client = AppwriteClient::new(&config).unwrap();
        AppwriteDirectory::new(client, "main", "users")
    }

    fn ada_document() -> serde_json::Value {
        json!({
            "$id": "65f0c1a2000b3d4e5f6a",
            "$collectionId": "users",
            "$databaseId": "main",
            "$createdAt": "2024-03-12T10:15:30.123+00:00",
            "$updatedAt": "2024-03-12T10:15:30.123+00:00",
            "$permissions": [],
            "fullName": "Ada Lovelace",
            "email": "ada@example.com",
            "avatar": "https://cdn.example.com/ada.png",
            "accountId": "tok-123"
        })
    }

    #[test]
    fn test_equal_query_format() {
        let query: serde_json::Value =
            serde_json::from_str(&equal_query("email", "ada@example.com")).unwrap();
        assert_eq!(
            query,
            json!({"method": "equal", "attribute": "email", "values": ["ada@example.com"]})
        );
    }

    #[tokio::test]
    async fn test_list_by_email_sends_equal_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DOCUMENTS_PATH))
            .and(query_param(
                "queries[]",
                equal_query("email", "ada@example.com"),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 1,
                "documents": [ada_document()]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let list = directory_for(&server)
            .list_by_email(&Email::parse("ada@example.com").unwrap())
            .await
            .unwrap();

        assert_eq!(list.total, 1);
        let record = &list.documents[0];
        assert_eq!(record.id.as_str(), "65f0c1a2000b3d4e5f6a");
        assert_eq!(record.full_name.as_str(), "Ada Lovelace");
        assert_eq!(record.account_id.as_ref().unwrap().as_str(), "tok-123");
        assert!(record.created_at.is_some());
    }

    #[tokio::test]
    async fn test_list_by_email_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DOCUMENTS_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "total": 0, "documents": [] })),
            )
            .mount(&server)
            .await;

        let list = directory_for(&server)
            .list_by_email(&Email::parse("nobody@example.com").unwrap())
            .await
            .unwrap();

        assert_eq!(list.total, 0);
        assert!(list.documents.is_empty());
    }

    #[tokio::test]
    async fn test_missing_avatar_reads_as_default() {
        let server = MockServer::start().await;
        let mut doc = ada_document();
        doc["avatar"] = serde_json::Value::Null;

        Mock::given(method("GET"))
            .and(path(DOCUMENTS_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "total": 1, "documents": [doc] })),
            )
            .mount(&server)
            .await;

        let list = directory_for(&server)
            .list_by_email(&Email::parse("ada@example.com").unwrap())
            .await
            .unwrap();

        assert_eq!(list.documents[0].avatar, Avatar::default().as_str());
    }

    #[tokio::test]
    async fn test_stored_fields_are_kept_verbatim() {
        let server = MockServer::start().await;
        let mut doc = ada_document();
        doc["$id"] = json!("-legacy id");
        doc["fullName"] = json!("A".repeat(200));
        doc["avatar"] = json!("ftp://legacy.example.com/ada.png");
        doc["accountId"] = json!("");

        Mock::given(method("GET"))
            .and(path(DOCUMENTS_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "total": 1, "documents": [doc] })),
            )
            .mount(&server)
            .await;

        let list = directory_for(&server)
            .list_by_email(&Email::parse("ada@example.com").unwrap())
            .await
            .unwrap();

        let record = &list.documents[0];
        assert_eq!(record.id, "-legacy id");
        assert_eq!(record.full_name.chars().count(), 200);
        assert_eq!(record.avatar, "ftp://legacy.example.com/ada.png");
        assert_eq!(record.account_id, None);
    }

    #[tokio::test]
    async fn test_corrupt_document_is_reported() {
        let server = MockServer::start().await;
        let mut doc = ada_document();
        doc["email"] = json!("not-an-email");

        Mock::given(method("GET"))
            .and(path(DOCUMENTS_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "total": 1, "documents": [doc] })),
            )
            .mount(&server)
            .await;

        let err = directory_for(&server)
            .list_by_email(&Email::parse("ada@example.com").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, DirectoryError::DataCorruption(_)));
    }

    #[tokio::test]
    async fn test_create_posts_document() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(DOCUMENTS_PATH))
            .and(body_partial_json(json!({
                "documentId": "65f0c1a2000b3d4e5f6a",
                "data": {
                    "fullName": "Ada Lovelace",
                    "email": "ada@example.com",
                    "avatar": "https://cdn.example.com/ada.png",
                    "accountId": "tok-123"
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(ada_document()))
            .expect(1)
            .mount(&server)
            .await;

        let record = directory_for(&server)
            .create(
                &UserRecordId::parse("65f0c1a2000b3d4e5f6a").unwrap(),
                NewUserRecord {
                    full_name: FullName::parse("Ada Lovelace").unwrap(),
                    email: Email::parse("ada@example.com").unwrap(),
                    avatar: Avatar::parse("https://cdn.example.com/ada.png").unwrap(),
                    account_id: AccountId::parse("tok-123").unwrap(),
                },
            )
            .await
            .unwrap();

        assert_eq!(record.email.as_str(), "ada@example.com");
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(DOCUMENTS_PATH))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "message": "Document with the requested ID already exists.",
                "code": 409,
                "type": "document_already_exists"
            })))
            .mount(&server)
            .await;

        let err = directory_for(&server)
            .create(
                &UserRecordId::unique(),
                NewUserRecord {
                    full_name: FullName::parse("Ada Lovelace").unwrap(),
                    email: Email::parse("ada@example.com").unwrap(),
                    avatar: Avatar::default(),
                    account_id: AccountId::parse("tok-123").unwrap(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DirectoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_ping_reads_collection() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/databases/main/collections/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "$id": "users" })))
            .expect(1)
            .mount(&server)
            .await;

        directory_for(&server).ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_server_error_is_not_conflict() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DOCUMENTS_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "message": "Service unavailable",
                "code": 503,
                "type": "general_server_error"
            })))
            .mount(&server)
            .await;

        let err = directory_for(&server)
            .list_by_email(&Email::parse("ada@example.com").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DirectoryError::Appwrite(AppwriteError::Api { status: 503, .. })
        ));
    }
}
