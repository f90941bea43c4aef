use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Record, Storage, StoreError, models::issue::Issue, types::Industry};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    /// Which project industry offers this label. Untagged labels behave
    /// like general ones.
    pub industry: Option<Industry>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Label {
    const COLLECTION: &'static str = "labels";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLabel {
    pub name: String,
    pub color: String,
    pub industry: Option<Industry>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateLabel {
    pub name: Option<String>,
    pub color: Option<String>,
    pub industry: Option<Industry>,
    pub category: Option<String>,
}

impl Label {
    pub fn is_eligible_for(&self, industry: &Industry) -> bool {
        match &self.industry {
            None => true,
            Some(Industry::General) => true,
            Some(tag) => tag == industry,
        }
    }

    pub fn find_all(storage: &Storage) -> Result<Vec<Self>, StoreError> {
        storage.load_all()
    }

    pub fn find_by_id(storage: &Storage, id: Uuid) -> Result<Option<Self>, StoreError> {
        storage.find_by_id(id)
    }

    pub fn create(storage: &Storage, data: &CreateLabel, id: Uuid) -> Result<Self, StoreError> {
        let now = Utc::now();
        storage.insert(Label {
            id,
            name: data.name.clone(),
            color: data.color.clone(),
            industry: data.industry.clone(),
            category: data.category.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update(
        storage: &Storage,
        id: Uuid,
        payload: &UpdateLabel,
    ) -> Result<Option<Self>, StoreError> {
        let Some(mut label) = storage.find_by_id::<Self>(id)? else {
            return Ok(None);
        };
        if let Some(name) = payload.name.clone() {
            label.name = name;
        }
        if let Some(color) = payload.color.clone() {
            label.color = color;
        }
        if payload.industry.is_some() {
            label.industry = payload.industry.clone();
        }
        if payload.category.is_some() {
            label.category = payload.category.clone();
        }
        label.updated_at = Utc::now();
        storage.replace(label)
    }

    /// Removes the label and strips its id from every issue referencing it.
    pub fn delete(storage: &Storage, id: Uuid) -> Result<u64, StoreError> {
        let rows_affected = storage.remove::<Self>(id)?;
        if rows_affected > 0 {
            let stripped = Issue::strip_label(storage, id)?;
            if stripped > 0 {
                tracing::debug!(label_id = %id, issues = stripped, "stripped deleted label");
            }
        }
        Ok(rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_and_untagged_labels_fit_every_industry() {
        let now = Utc::now();
        let label = |industry: Option<Industry>| Label {
            id: Uuid::new_v4(),
            name: "probe".to_string(),
            color: "#888888".to_string(),
            industry,
            category: None,
            created_at: now,
            updated_at: now,
        };

        assert!(label(None).is_eligible_for(&Industry::Software));
        assert!(label(Some(Industry::General)).is_eligible_for(&Industry::Manufacturing));
        assert!(label(Some(Industry::Software)).is_eligible_for(&Industry::Software));
        assert!(!label(Some(Industry::Manufacturing)).is_eligible_for(&Industry::Software));
    }
}
