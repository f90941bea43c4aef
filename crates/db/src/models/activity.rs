use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Record, Storage, StoreError,
    types::{ActivityAction, EntityKind},
};

/// One line of the who-did-what-to-which-entity log. Appended by the event
/// dispatcher, read only by presentation queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub entity_kind: EntityKind,
    pub entity_id: Uuid,
    pub action: ActivityAction,
    pub actor_id: Option<Uuid>,
    pub actor_name: String,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for Activity {
    const COLLECTION: &'static str = "activities";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Activity {
    pub fn append(
        storage: &Storage,
        entity_kind: EntityKind,
        entity_id: Uuid,
        action: ActivityAction,
        actor_id: Option<Uuid>,
        actor_name: &str,
        detail: Option<String>,
    ) -> Result<Self, StoreError> {
        storage.insert(Activity {
            id: Uuid::new_v4(),
            entity_kind,
            entity_id,
            action,
            actor_id,
            actor_name: actor_name.to_string(),
            detail,
            created_at: Utc::now(),
        })
    }

    /// Newest entries first, capped at `limit`.
    pub fn find_recent(storage: &Storage, limit: usize) -> Result<Vec<Self>, StoreError> {
        let mut activities = storage.load_all::<Self>()?;
        activities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        activities.truncate(limit);
        Ok(activities)
    }

    pub fn find_for_entity(storage: &Storage, entity_id: Uuid) -> Result<Vec<Self>, StoreError> {
        let mut activities: Vec<Self> = storage
            .load_all::<Self>()?
            .into_iter()
            .filter(|activity| activity.entity_id == entity_id)
            .collect();
        activities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(activities)
    }
}
