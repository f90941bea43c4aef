use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Record, Storage, StoreError};

/// Broadcast announcement. An absent audience means everyone sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub important: bool,
    pub audience: Option<Vec<Uuid>>,
    pub author_id: Option<Uuid>,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Notice {
    const COLLECTION: &'static str = "notices";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotice {
    pub title: String,
    pub content: String,
    pub important: Option<bool>,
    pub audience: Option<Vec<Uuid>>,
    pub author_id: Option<Uuid>,
    pub author_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateNotice {
    pub title: Option<String>,
    pub content: Option<String>,
    pub important: Option<bool>,
    pub audience: Option<Vec<Uuid>>,
}

impl Notice {
    /// Important notices first, then newest first.
    pub fn find_all(storage: &Storage) -> Result<Vec<Self>, StoreError> {
        let mut notices = storage.load_all::<Self>()?;
        notices.sort_by(|a, b| {
            b.important
                .cmp(&a.important)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(notices)
    }

    pub fn find_by_id(storage: &Storage, id: Uuid) -> Result<Option<Self>, StoreError> {
        storage.find_by_id(id)
    }

    /// Notices visible to one member: unrestricted ones plus those whose
    /// audience names the member.
    pub fn find_visible_to(storage: &Storage, member_id: Uuid) -> Result<Vec<Self>, StoreError> {
        let notices = Self::find_all(storage)?;
        Ok(notices
            .into_iter()
            .filter(|notice| match &notice.audience {
                None => true,
                Some(audience) => audience.contains(&member_id),
            })
            .collect())
    }

    pub fn create(storage: &Storage, data: &CreateNotice, id: Uuid) -> Result<Self, StoreError> {
        let now = Utc::now();
        storage.insert(Notice {
            id,
            title: data.title.clone(),
            content: data.content.clone(),
            important: data.important.unwrap_or(false),
            audience: data.audience.clone(),
            author_id: data.author_id,
            author_name: data.author_name.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update(
        storage: &Storage,
        id: Uuid,
        payload: &UpdateNotice,
    ) -> Result<Option<Self>, StoreError> {
        let Some(mut notice) = storage.find_by_id::<Self>(id)? else {
            return Ok(None);
        };
        if let Some(title) = payload.title.clone() {
            notice.title = title;
        }
        if let Some(content) = payload.content.clone() {
            notice.content = content;
        }
        if let Some(important) = payload.important {
            notice.important = important;
        }
        if payload.audience.is_some() {
            notice.audience = payload.audience.clone();
        }
        notice.updated_at = Utc::now();
        storage.replace(notice)
    }

    pub fn delete(storage: &Storage, id: Uuid) -> Result<u64, StoreError> {
        storage.remove::<Self>(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audience_restricts_visibility() {
        let dir = test_support::tmp_data_dir();
        let storage = Storage::open(dir.path()).unwrap();
        let insider = Uuid::new_v4();
        let outsider = Uuid::new_v4();

        Notice::create(
            &storage,
            &CreateNotice {
                title: "Managers only".to_string(),
                content: "Q3 numbers".to_string(),
                important: None,
                audience: Some(vec![insider]),
                author_id: None,
                author_name: "system".to_string(),
            },
            Uuid::new_v4(),
        )
        .unwrap();
        Notice::create(
            &storage,
            &CreateNotice {
                title: "Office closed Friday".to_string(),
                content: "Maintenance".to_string(),
                important: Some(true),
                audience: None,
                author_id: None,
                author_name: "system".to_string(),
            },
            Uuid::new_v4(),
        )
        .unwrap();

        assert_eq!(Notice::find_visible_to(&storage, insider).unwrap().len(), 2);
        let visible = Notice::find_visible_to(&storage, outsider).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Office closed Friday");
    }
}
