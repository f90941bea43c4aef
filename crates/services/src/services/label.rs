use db::{
    Storage, StoreError,
    models::label::{CreateLabel, Label, UpdateLabel},
    types::Industry,
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LabelServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Label name must not be empty")]
    EmptyName,
}

pub type Result<T> = std::result::Result<T, LabelServiceError>;

/// The canonical default set the working labels are reconciled against.
const DEFAULT_LABELS: &[(&str, &str, Industry)] = &[
    ("bug", "#d73a4a", Industry::Software),
    ("feature", "#a2eeef", Industry::Software),
    ("regression", "#5319e7", Industry::Software),
    ("quality", "#fbca04", Industry::Manufacturing),
    ("safety", "#e99695", Industry::Manufacturing),
    ("equipment", "#c2e0c6", Industry::Manufacturing),
    ("customer", "#0e8a16", Industry::Service),
    ("urgent", "#b60205", Industry::General),
    ("documentation", "#0075ca", Industry::General),
];

#[derive(Clone, Default)]
pub struct LabelService;

impl LabelService {
    pub fn new() -> Self {
        Self
    }

    /// Reconciles the stored labels against the canonical defaults. A set
    /// that is too small or carries no industry tags is replaced wholesale;
    /// otherwise only defaults missing by name are appended. Idempotent.
    pub fn initialize_labels(&self, storage: &Storage) -> Result<Vec<Label>> {
        let existing = Label::find_all(storage)?;
        let tagged = existing.iter().any(|label| label.industry.is_some());

        if existing.len() < 5 || !tagged {
            tracing::info!(
                existing = existing.len(),
                "replacing label set with defaults"
            );
            let defaults: Vec<Label> = DEFAULT_LABELS
                .iter()
                .map(|(name, color, industry)| Label {
                    id: Uuid::new_v4(),
                    name: (*name).to_string(),
                    color: (*color).to_string(),
                    industry: Some(industry.clone()),
                    category: None,
                    created_at: chrono::Utc::now(),
                    updated_at: chrono::Utc::now(),
                })
                .collect();
            storage.persist_all(&defaults)?;
            return Ok(defaults);
        }

        let mut labels = existing;
        for (name, color, industry) in DEFAULT_LABELS {
            if labels.iter().any(|label| label.name == *name) {
                continue;
            }
            labels.push(Label {
                id: Uuid::new_v4(),
                name: (*name).to_string(),
                color: (*color).to_string(),
                industry: Some(industry.clone()),
                category: None,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            });
        }
        storage.persist_all(&labels)?;
        Ok(labels)
    }

    /// Labels offered for a project of the given industry: its own tag
    /// plus everything general.
    pub fn eligible_labels(&self, storage: &Storage, industry: &Industry) -> Result<Vec<Label>> {
        let labels = Label::find_all(storage)?;
        Ok(labels
            .into_iter()
            .filter(|label| label.is_eligible_for(industry))
            .collect())
    }

    /// Re-checks a draft's selected label ids after the governing project
    /// changed industry, keeping only the still-eligible ones.
    pub fn prune_draft_labels(
        &self,
        storage: &Storage,
        selected: &[Uuid],
        industry: &Industry,
    ) -> Result<Vec<Uuid>> {
        let labels = Label::find_all(storage)?;
        Ok(selected
            .iter()
            .filter(|id| {
                labels
                    .iter()
                    .any(|label| label.id == **id && label.is_eligible_for(industry))
            })
            .copied()
            .collect())
    }

    pub fn create_label(&self, storage: &Storage, payload: CreateLabel) -> Result<Label> {
        if payload.name.trim().is_empty() {
            return Err(LabelServiceError::EmptyName);
        }
        Ok(Label::create(storage, &payload, Uuid::new_v4())?)
    }

    pub fn update_label(
        &self,
        storage: &Storage,
        id: Uuid,
        payload: UpdateLabel,
    ) -> Result<Option<Label>> {
        if payload
            .name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(LabelServiceError::EmptyName);
        }
        Ok(Label::update(storage, id, &payload)?)
    }

    pub fn delete_label(&self, storage: &Storage, id: Uuid) -> Result<u64> {
        Ok(Label::delete(storage, id)?)
    }
}
