use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Record, Storage, StoreError, types::WikiCategory};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiPage {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: WikiCategory,
    pub author_id: Option<Uuid>,
    pub author_name: String,
    /// Reserved for page hierarchy; pages are currently a flat list.
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for WikiPage {
    const COLLECTION: &'static str = "wiki_pages";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWikiPage {
    pub title: String,
    pub content: String,
    pub category: Option<WikiCategory>,
    pub author_id: Option<Uuid>,
    pub author_name: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateWikiPage {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<WikiCategory>,
    pub parent_id: Option<Uuid>,
}

impl WikiPage {
    pub fn find_all(storage: &Storage) -> Result<Vec<Self>, StoreError> {
        storage.load_all()
    }

    pub fn find_by_id(storage: &Storage, id: Uuid) -> Result<Option<Self>, StoreError> {
        storage.find_by_id(id)
    }

    pub fn find_by_category(
        storage: &Storage,
        category: &WikiCategory,
    ) -> Result<Vec<Self>, StoreError> {
        let pages = storage.load_all::<Self>()?;
        Ok(pages
            .into_iter()
            .filter(|page| page.category == *category)
            .collect())
    }

    pub fn create(storage: &Storage, data: &CreateWikiPage, id: Uuid) -> Result<Self, StoreError> {
        let now = Utc::now();
        storage.insert(WikiPage {
            id,
            title: data.title.clone(),
            content: data.content.clone(),
            category: data.category.clone().unwrap_or_default(),
            author_id: data.author_id,
            author_name: data.author_name.clone(),
            parent_id: data.parent_id,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update(
        storage: &Storage,
        id: Uuid,
        payload: &UpdateWikiPage,
    ) -> Result<Option<Self>, StoreError> {
        let Some(mut page) = storage.find_by_id::<Self>(id)? else {
            return Ok(None);
        };
        if let Some(title) = payload.title.clone() {
            page.title = title;
        }
        if let Some(content) = payload.content.clone() {
            page.content = content;
        }
        if let Some(category) = payload.category.clone() {
            page.category = category;
        }
        if payload.parent_id.is_some() {
            page.parent_id = payload.parent_id;
        }
        page.updated_at = Utc::now();
        storage.replace(page)
    }

    pub fn delete(storage: &Storage, id: Uuid) -> Result<u64, StoreError> {
        storage.remove::<Self>(id)
    }
}
