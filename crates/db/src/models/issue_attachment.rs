use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Record, Storage, StoreError};

/// File reference hanging off an issue. The core stores the reference
/// only; the bytes live wherever presentation put them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueAttachment {
    pub id: Uuid,
    pub issue_id: Uuid,
    pub file_name: String,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Record for IssueAttachment {
    const COLLECTION: &'static str = "issue_attachments";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl IssueAttachment {
    pub fn find_by_issue_id(storage: &Storage, issue_id: Uuid) -> Result<Vec<Self>, StoreError> {
        let attachments = storage.load_all::<Self>()?;
        Ok(attachments
            .into_iter()
            .filter(|attachment| attachment.issue_id == issue_id)
            .collect())
    }

    pub fn create(
        storage: &Storage,
        issue_id: Uuid,
        file_name: &str,
        uploaded_by: Option<Uuid>,
        id: Uuid,
    ) -> Result<Self, StoreError> {
        storage.insert(IssueAttachment {
            id,
            issue_id,
            file_name: file_name.to_string(),
            uploaded_by,
            created_at: Utc::now(),
        })
    }

    pub fn delete(storage: &Storage, id: Uuid) -> Result<u64, StoreError> {
        storage.remove::<Self>(id)
    }

    pub fn delete_by_issue_id(storage: &Storage, issue_id: Uuid) -> Result<u64, StoreError> {
        let mut attachments = storage.load_all::<Self>()?;
        let before = attachments.len();
        attachments.retain(|attachment| attachment.issue_id != issue_id);
        let removed = (before - attachments.len()) as u64;
        if removed > 0 {
            storage.persist_all(&attachments)?;
        }
        Ok(removed)
    }
}
