use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{Record, Storage, StoreError, types::EntityKind};

/// Durable fan-out buffer between a primary mutation and its subscribers.
/// Entries are written in the same command that mutates the owning
/// collection and drained synchronously afterwards; a failed dispatch is
/// recorded on the row and never retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: Uuid,
    pub event_type: String,
    pub entity_kind: EntityKind,
    pub entity_id: Uuid,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub attempts: i32,
    pub last_error: Option<String>,
}

impl Record for OutboxEntry {
    const COLLECTION: &'static str = "event_outbox";

    fn id(&self) -> Uuid {
        self.id
    }
}

pub struct EventOutbox;

impl EventOutbox {
    pub fn enqueue(
        storage: &Storage,
        event_type: &str,
        entity_kind: EntityKind,
        entity_id: Uuid,
        payload: Value,
    ) -> Result<(), StoreError> {
        storage.insert(OutboxEntry {
            id: Uuid::new_v4(),
            event_type: event_type.to_string(),
            entity_kind,
            entity_id,
            payload,
            created_at: Utc::now(),
            published_at: None,
            attempts: 0,
            last_error: None,
        })?;
        Ok(())
    }

    /// Entries still awaiting their single dispatch attempt, oldest first.
    /// Rows that already failed stay behind with their error recorded.
    pub fn fetch_undispatched(
        storage: &Storage,
        limit: usize,
    ) -> Result<Vec<OutboxEntry>, StoreError> {
        let entries = storage.load_all::<OutboxEntry>()?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.published_at.is_none() && entry.attempts == 0)
            .take(limit)
            .collect())
    }

    pub fn mark_published(storage: &Storage, id: Uuid) -> Result<(), StoreError> {
        let Some(mut entry) = storage.find_by_id::<OutboxEntry>(id)? else {
            return Ok(());
        };
        entry.published_at = Some(Utc::now());
        entry.attempts += 1;
        storage.replace(entry)?;
        Ok(())
    }

    pub fn mark_failed(storage: &Storage, id: Uuid, error: &str) -> Result<(), StoreError> {
        let Some(mut entry) = storage.find_by_id::<OutboxEntry>(id)? else {
            return Ok(());
        };
        entry.attempts += 1;
        entry.last_error = Some(error.to_string());
        storage.replace(entry)?;
        Ok(())
    }
}
