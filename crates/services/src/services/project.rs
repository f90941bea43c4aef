use db::{
    Storage, StoreError,
    events::Actor,
    models::project::{CreateProject, Project, UpdateProject},
};
use thiserror::Error;
use uuid::Uuid;

use super::events::EventService;

#[derive(Debug, Error)]
pub enum ProjectServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Project name must not be empty")]
    EmptyName,
    #[error("Progress must be between 0 and 100")]
    ProgressOutOfRange,
    #[error("Budget values must not be negative")]
    NegativeBudget,
    #[error("Project end date precedes its start date")]
    InvalidDateRange,
}

pub type Result<T> = std::result::Result<T, ProjectServiceError>;

#[derive(Clone, Default)]
pub struct ProjectService;

impl ProjectService {
    pub fn new() -> Self {
        Self
    }

    fn validate_create(payload: &CreateProject) -> Result<()> {
        if payload.name.trim().is_empty() {
            return Err(ProjectServiceError::EmptyName);
        }
        if payload.progress.is_some_and(|progress| progress > 100) {
            return Err(ProjectServiceError::ProgressOutOfRange);
        }
        if payload.budget.is_some_and(|budget| budget < 0.0)
            || payload.spent_budget.is_some_and(|spent| spent < 0.0)
        {
            return Err(ProjectServiceError::NegativeBudget);
        }
        if let (Some(start), Some(end)) = (payload.start_date, payload.end_date)
            && end < start
        {
            return Err(ProjectServiceError::InvalidDateRange);
        }
        Ok(())
    }

    fn validate_update(payload: &UpdateProject) -> Result<()> {
        if payload
            .name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(ProjectServiceError::EmptyName);
        }
        if payload.progress.is_some_and(|progress| progress > 100) {
            return Err(ProjectServiceError::ProgressOutOfRange);
        }
        if payload.budget.is_some_and(|budget| budget < 0.0)
            || payload.spent_budget.is_some_and(|spent| spent < 0.0)
        {
            return Err(ProjectServiceError::NegativeBudget);
        }
        if let (Some(start), Some(end)) = (payload.start_date, payload.end_date)
            && end < start
        {
            return Err(ProjectServiceError::InvalidDateRange);
        }
        Ok(())
    }

    pub fn create_project(
        &self,
        storage: &Storage,
        events: &EventService,
        payload: CreateProject,
        actor: &Actor,
    ) -> Result<Project> {
        Self::validate_create(&payload)?;

        let id = Uuid::new_v4();
        let project = Project::create(storage, &payload, id, actor)?;
        tracing::info!(project_id = %project.id, name = %project.name, "created project");
        events.flush_best_effort(storage);
        Ok(project)
    }

    pub fn update_project(
        &self,
        storage: &Storage,
        events: &EventService,
        id: Uuid,
        payload: UpdateProject,
        actor: &Actor,
    ) -> Result<Option<Project>> {
        Self::validate_update(&payload)?;

        let project = Project::update(storage, id, &payload, actor)?;
        if project.is_some() {
            events.flush_best_effort(storage);
        }
        Ok(project)
    }

    pub fn toggle_favorite(&self, storage: &Storage, id: Uuid) -> Result<Option<Project>> {
        Ok(Project::toggle_favorite(storage, id)?)
    }

    pub fn delete_project(
        &self,
        storage: &Storage,
        events: &EventService,
        id: Uuid,
        actor: &Actor,
    ) -> Result<u64> {
        let rows_affected = Project::delete(storage, id, actor)?;
        if rows_affected > 0 {
            tracing::info!(project_id = %id, "deleted project");
            events.flush_best_effort(storage);
        }
        Ok(rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn create_payload() -> CreateProject {
        CreateProject {
            name: "Billing revamp".to_string(),
            description: "Replace the invoicing pipeline".to_string(),
            status: None,
            priority: None,
            industry: None,
            team_members: None,
            progress: None,
            budget: None,
            spent_budget: None,
            start_date: None,
            end_date: None,
        }
    }

    #[test]
    fn create_rejects_empty_name_before_any_write() {
        let dir = test_support::tmp_data_dir();
        let storage = Storage::open(dir.path()).unwrap();
        let events = EventService::new(Default::default(), Default::default());

        let payload = CreateProject {
            name: "   ".to_string(),
            ..create_payload()
        };
        let result = ProjectService::new().create_project(&storage, &events, payload, &Actor::system());
        assert!(matches!(result, Err(ProjectServiceError::EmptyName)));
        assert!(Project::find_all(&storage).unwrap().is_empty());
    }

    #[test]
    fn create_rejects_inverted_date_range() {
        let payload = CreateProject {
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 5, 1),
            ..create_payload()
        };
        assert!(matches!(
            ProjectService::validate_create(&payload),
            Err(ProjectServiceError::InvalidDateRange)
        ));
    }

    #[test]
    fn update_rejects_out_of_range_progress() {
        let payload = UpdateProject {
            progress: Some(101),
            ..UpdateProject::default()
        };
        assert!(matches!(
            ProjectService::validate_update(&payload),
            Err(ProjectServiceError::ProgressOutOfRange)
        ));
    }

    #[test]
    fn update_of_unknown_project_is_a_quiet_miss() {
        let dir = test_support::tmp_data_dir();
        let storage = Storage::open(dir.path()).unwrap();
        let events = EventService::new(Default::default(), Default::default());

        let result = ProjectService::new()
            .update_project(
                &storage,
                &events,
                Uuid::new_v4(),
                UpdateProject::default(),
                &Actor::system(),
            )
            .unwrap();
        assert!(result.is_none());
    }
}
