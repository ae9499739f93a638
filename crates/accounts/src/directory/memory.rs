//! Process-local directory.
//!
//! Rejects a second record for the same email, so it behaves like a store
//! with a unique index. Nothing survives a restart.

use async_trait::async_trait;
use tokio::sync::RwLock;

use stashbox_core::{Email, UserRecordId};

use super::{DirectoryError, DirectoryStore, DocumentList};
use crate::models::{NewUserRecord, UserRecord};

/// In-memory [`DirectoryStore`].
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    records: RwLock<Vec<UserRecord>>,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory pre-populated with `records`.
    ///
    /// Records are taken as-is, duplicates included.
    #[must_use]
    pub fn with_records(records: Vec<UserRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Snapshot of every stored record, in insertion order.
    pub async fn records(&self) -> Vec<UserRecord> {
        self.records.read().await.clone()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the directory holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl DirectoryStore for InMemoryDirectory {
    async fn list_by_email(&self, email: &Email) -> Result<DocumentList, DirectoryError> {
        let documents: Vec<UserRecord> = self
            .records
            .read()
            .await
            .iter()
            .filter(|r| &r.email == email)
            .cloned()
            .collect();

        Ok(DocumentList {
            total: documents.len() as u64,
            documents,
        })
    }

    async fn create(
        &self,
        id: &UserRecordId,
        record: NewUserRecord,
    ) -> Result<UserRecord, DirectoryError> {
        // Check and insert under one write lock
        let mut records = self.records.write().await;

        if records.iter().any(|r| r.id == id.as_str()) {
            return Err(DirectoryError::Conflict(format!(
                "record {id} already exists"
            )));
        }
        if records.iter().any(|r| r.email == record.email) {
            return Err(DirectoryError::Conflict("email already exists".to_owned()));
        }

        let created = record.into_record(id.clone(), Some(chrono::Utc::now()));
        records.push(created.clone());
        Ok(created)
    }

    async fn ping(&self) -> Result<(), DirectoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stashbox_core::{AccountId, Avatar, FullName};

    use super::*;

    fn new_record(email: &str) -> NewUserRecord {
        NewUserRecord {
            full_name: FullName::parse("Grace Hopper").unwrap(),
            email: Email::parse(email).unwrap(),
            avatar: Avatar::default(),
            account_id: AccountId::unique(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = InMemoryDirectory::new();
        store
            .create(&UserRecordId::unique(), new_record("grace@example.com"))
            .await
            .unwrap();

        let err = store
            .create(&UserRecordId::unique(), new_record("grace@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, DirectoryError::Conflict(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts() {
        let store = InMemoryDirectory::new();
        let id = UserRecordId::unique();
        store.create(&id, new_record("a@example.com")).await.unwrap();

        let err = store
            .create(&id, new_record("b@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, DirectoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_counts_matches_only() {
        let store = InMemoryDirectory::new();
        store
            .create(&UserRecordId::unique(), new_record("a@example.com"))
            .await
            .unwrap();
        store
            .create(&UserRecordId::unique(), new_record("b@example.com"))
            .await
            .unwrap();

        let list = store
            .list_by_email(&Email::parse("b@example.com").unwrap())
            .await
            .unwrap();

        assert_eq!(list.total, 1);
        assert_eq!(list.documents[0].email.as_str(), "b@example.com");
    }
}
