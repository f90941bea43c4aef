use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Record, Storage, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: Uuid,
    pub issue_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for IssueComment {
    const COLLECTION: &'static str = "issue_comments";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateIssueComment {
    pub issue_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub content: String,
}

impl IssueComment {
    /// Comments for one issue, oldest first.
    pub fn find_by_issue_id(storage: &Storage, issue_id: Uuid) -> Result<Vec<Self>, StoreError> {
        let mut comments: Vec<Self> = storage
            .load_all::<Self>()?
            .into_iter()
            .filter(|comment| comment.issue_id == issue_id)
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    pub fn create(
        storage: &Storage,
        data: &CreateIssueComment,
        id: Uuid,
    ) -> Result<Self, StoreError> {
        storage.insert(IssueComment {
            id,
            issue_id: data.issue_id,
            author_id: data.author_id,
            author_name: data.author_name.clone(),
            content: data.content.clone(),
            created_at: Utc::now(),
            updated_at: None,
        })
    }

    pub fn update_content(
        storage: &Storage,
        id: Uuid,
        content: &str,
    ) -> Result<Option<Self>, StoreError> {
        let Some(mut comment) = storage.find_by_id::<Self>(id)? else {
            return Ok(None);
        };
        comment.content = content.to_string();
        comment.updated_at = Some(Utc::now());
        storage.replace(comment)
    }

    pub fn delete(storage: &Storage, id: Uuid) -> Result<u64, StoreError> {
        storage.remove::<Self>(id)
    }

    pub fn delete_by_issue_id(storage: &Storage, issue_id: Uuid) -> Result<u64, StoreError> {
        let mut comments = storage.load_all::<Self>()?;
        let before = comments.len();
        comments.retain(|comment| comment.issue_id != issue_id);
        let removed = (before - comments.len()) as u64;
        if removed > 0 {
            storage.persist_all(&comments)?;
        }
        Ok(removed)
    }
}
