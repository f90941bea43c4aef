use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Record, Storage, StoreError, types::MessageType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub message_type: MessageType,
    /// Absent for synthesized system messages.
    pub sender_id: Option<Uuid>,
    pub sender_name: String,
    /// Direct messages address a member...
    pub receiver_id: Option<Uuid>,
    /// ...channel messages address a project channel.
    pub project_id: Option<Uuid>,
    pub content: String,
    /// Tracked for direct messages only.
    pub read: Option<bool>,
    pub related_issue_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Message {
    const COLLECTION: &'static str = "messages";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMessage {
    pub message_type: MessageType,
    pub sender_id: Option<Uuid>,
    pub sender_name: String,
    pub receiver_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub content: String,
    pub related_issue_id: Option<Uuid>,
}

impl Message {
    pub fn find_all(storage: &Storage) -> Result<Vec<Self>, StoreError> {
        storage.load_all()
    }

    pub fn find_by_id(storage: &Storage, id: Uuid) -> Result<Option<Self>, StoreError> {
        storage.find_by_id(id)
    }

    /// Direct messages addressed to one member, newest first.
    pub fn find_for_receiver(storage: &Storage, member_id: Uuid) -> Result<Vec<Self>, StoreError> {
        let mut messages: Vec<Self> = storage
            .load_all::<Self>()?
            .into_iter()
            .filter(|message| message.receiver_id == Some(member_id))
            .collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(messages)
    }

    /// Channel history for one project, oldest first.
    pub fn find_channel(storage: &Storage, project_id: Uuid) -> Result<Vec<Self>, StoreError> {
        let mut messages: Vec<Self> = storage
            .load_all::<Self>()?
            .into_iter()
            .filter(|message| {
                message.message_type == MessageType::Channel
                    && message.project_id == Some(project_id)
            })
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    pub fn create(storage: &Storage, data: &CreateMessage, id: Uuid) -> Result<Self, StoreError> {
        let now = Utc::now();
        let read = match data.message_type {
            MessageType::Direct => Some(false),
            MessageType::Channel | MessageType::System => None,
        };
        storage.insert(Message {
            id,
            message_type: data.message_type.clone(),
            sender_id: data.sender_id,
            sender_name: data.sender_name.clone(),
            receiver_id: data.receiver_id,
            project_id: data.project_id,
            content: data.content.clone(),
            read,
            related_issue_id: data.related_issue_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Flips the read flag of a direct message. Messages without a read
    /// flag are left untouched.
    pub fn mark_read(storage: &Storage, id: Uuid) -> Result<Option<Self>, StoreError> {
        let Some(mut message) = storage.find_by_id::<Self>(id)? else {
            return Ok(None);
        };
        if message.read.is_none() {
            return Ok(Some(message));
        }
        message.read = Some(true);
        message.updated_at = Utc::now();
        storage.replace(message)
    }

    pub fn delete(storage: &Storage, id: Uuid) -> Result<u64, StoreError> {
        storage.remove::<Self>(id)
    }
}
