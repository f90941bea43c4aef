use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Record, Storage, StoreError,
    events::{
        Actor, EVENT_PROJECT_COMPLETED, EVENT_PROJECT_CREATED, EVENT_PROJECT_DELETED,
        EVENT_PROJECT_TEAM_CHANGED, EVENT_PROJECT_UPDATED, ProjectEventPayload,
        ProjectTeamChangedPayload,
    },
    models::event_outbox::EventOutbox,
    types::{EntityKind, Industry, Priority, ProjectStatus},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub industry: Industry,
    pub team_members: Vec<Uuid>,
    pub progress: u8,
    pub budget: f64,
    pub spent_budget: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Project {
    const COLLECTION: &'static str = "projects";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: String,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub industry: Option<Industry>,
    pub team_members: Option<Vec<Uuid>>,
    pub progress: Option<u8>,
    pub budget: Option<f64>,
    pub spent_budget: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub industry: Option<Industry>,
    pub team_members: Option<Vec<Uuid>>,
    pub progress: Option<u8>,
    pub budget: Option<f64>,
    pub spent_budget: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Project {
    pub fn find_all(storage: &Storage) -> Result<Vec<Self>, StoreError> {
        let mut projects = storage.load_all::<Self>()?;
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    pub fn find_by_id(storage: &Storage, id: Uuid) -> Result<Option<Self>, StoreError> {
        storage.find_by_id(id)
    }

    pub fn create(
        storage: &Storage,
        data: &CreateProject,
        id: Uuid,
        actor: &Actor,
    ) -> Result<Self, StoreError> {
        let now = Utc::now();
        let project = storage.insert(Project {
            id,
            name: data.name.clone(),
            description: data.description.clone(),
            status: data.status.clone().unwrap_or_default(),
            priority: data.priority.clone().unwrap_or_default(),
            industry: data.industry.clone().unwrap_or_default(),
            team_members: data.team_members.clone().unwrap_or_default(),
            progress: data.progress.unwrap_or(0),
            budget: data.budget.unwrap_or(0.0),
            spent_budget: data.spent_budget.unwrap_or(0.0),
            start_date: data.start_date,
            end_date: data.end_date,
            favorite: false,
            created_at: now,
            updated_at: now,
        })?;

        let payload = serde_json::to_value(ProjectEventPayload {
            project_id: project.id,
            project_name: project.name.clone(),
            actor: actor.clone(),
        })?;
        EventOutbox::enqueue(storage, EVENT_PROJECT_CREATED, EntityKind::Project, id, payload)?;
        Self::enqueue_team_changed(storage, &project, &[], actor)?;

        Ok(project)
    }

    pub fn update(
        storage: &Storage,
        id: Uuid,
        payload: &UpdateProject,
        actor: &Actor,
    ) -> Result<Option<Self>, StoreError> {
        let Some(existing) = storage.find_by_id::<Self>(id)? else {
            return Ok(None);
        };
        let previous_status = existing.status.clone();
        let previous_team = existing.team_members.clone();

        let mut project = existing;
        if let Some(name) = payload.name.clone() {
            project.name = name;
        }
        if let Some(description) = payload.description.clone() {
            project.description = description;
        }
        if let Some(status) = payload.status.clone() {
            project.status = status;
        }
        if let Some(priority) = payload.priority.clone() {
            project.priority = priority;
        }
        if let Some(industry) = payload.industry.clone() {
            project.industry = industry;
        }
        if let Some(team_members) = payload.team_members.clone() {
            project.team_members = team_members;
        }
        if let Some(progress) = payload.progress {
            project.progress = progress;
        }
        if let Some(budget) = payload.budget {
            project.budget = budget;
        }
        if let Some(spent_budget) = payload.spent_budget {
            project.spent_budget = spent_budget;
        }
        if payload.start_date.is_some() {
            project.start_date = payload.start_date;
        }
        if payload.end_date.is_some() {
            project.end_date = payload.end_date;
        }
        project.updated_at = Utc::now();

        let Some(project) = storage.replace(project)? else {
            return Ok(None);
        };

        // A project completes once, on the transition into the status.
        let event_type = if project.status == ProjectStatus::Completed
            && previous_status != ProjectStatus::Completed
        {
            EVENT_PROJECT_COMPLETED
        } else {
            EVENT_PROJECT_UPDATED
        };
        let event_payload = serde_json::to_value(ProjectEventPayload {
            project_id: project.id,
            project_name: project.name.clone(),
            actor: actor.clone(),
        })?;
        EventOutbox::enqueue(storage, event_type, EntityKind::Project, id, event_payload)?;
        Self::enqueue_team_changed(storage, &project, &previous_team, actor)?;

        Ok(Some(project))
    }

    pub fn toggle_favorite(storage: &Storage, id: Uuid) -> Result<Option<Self>, StoreError> {
        let Some(mut project) = storage.find_by_id::<Self>(id)? else {
            return Ok(None);
        };
        project.favorite = !project.favorite;
        project.updated_at = Utc::now();
        storage.replace(project)
    }

    /// Removes the project row only. Issues and messages keep their
    /// project id; readers render the dangling reference as "-".
    pub fn delete(storage: &Storage, id: Uuid, actor: &Actor) -> Result<u64, StoreError> {
        let Some(project) = storage.find_by_id::<Self>(id)? else {
            return Ok(0);
        };

        let rows_affected = storage.remove::<Self>(id)?;
        if rows_affected > 0 {
            let payload = serde_json::to_value(ProjectEventPayload {
                project_id: id,
                project_name: project.name.clone(),
                actor: actor.clone(),
            })?;
            EventOutbox::enqueue(storage, EVENT_PROJECT_DELETED, EntityKind::Project, id, payload)?;
        }
        Ok(rows_affected)
    }

    /// Members newly on the team get an event; removed members get nothing.
    fn enqueue_team_changed(
        storage: &Storage,
        project: &Project,
        previous_team: &[Uuid],
        actor: &Actor,
    ) -> Result<(), StoreError> {
        let added_member_ids: Vec<Uuid> = project
            .team_members
            .iter()
            .filter(|member_id| !previous_team.contains(member_id))
            .copied()
            .collect();
        if added_member_ids.is_empty() {
            return Ok(());
        }

        let payload = serde_json::to_value(ProjectTeamChangedPayload {
            project_id: project.id,
            project_name: project.name.clone(),
            added_member_ids,
            actor: actor.clone(),
        })?;
        EventOutbox::enqueue(
            storage,
            EVENT_PROJECT_TEAM_CHANGED,
            EntityKind::Project,
            project.id,
            payload,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::models::event_outbox::OutboxEntry;

    use super::*;

    fn setup_storage() -> (tempfile::TempDir, Storage) {
        let dir = test_support::tmp_data_dir();
        let storage = Storage::open(dir.path()).unwrap();
        (dir, storage)
    }

    fn create_project(storage: &Storage, team: Vec<Uuid>) -> Project {
        Project::create(
            storage,
            &CreateProject {
                name: "Line 4 retrofit".to_string(),
                description: "Retrofit the packaging line".to_string(),
                status: None,
                priority: None,
                industry: Some(Industry::Manufacturing),
                team_members: Some(team),
                progress: None,
                budget: Some(250_000.0),
                spent_budget: None,
                start_date: None,
                end_date: None,
            },
            Uuid::new_v4(),
            &Actor::system(),
        )
        .unwrap()
    }

    fn event_types(storage: &Storage) -> Vec<String> {
        storage
            .load_all::<OutboxEntry>()
            .unwrap()
            .into_iter()
            .map(|entry| entry.event_type)
            .collect()
    }

    #[test]
    fn create_defaults_to_planning_and_enqueues_created() {
        let (_dir, storage) = setup_storage();
        let project = create_project(&storage, Vec::new());

        assert_eq!(project.status, ProjectStatus::Planning);
        assert_eq!(project.progress, 0);
        assert!(!project.favorite);
        assert_eq!(event_types(&storage), vec![EVENT_PROJECT_CREATED.to_string()]);
    }

    #[test]
    fn create_with_initial_team_enqueues_team_changed() {
        let (_dir, storage) = setup_storage();
        let member = Uuid::new_v4();
        create_project(&storage, vec![member]);

        let types = event_types(&storage);
        assert!(types.contains(&EVENT_PROJECT_TEAM_CHANGED.to_string()));
    }

    #[test]
    fn update_into_completed_fires_completed_once() {
        let (_dir, storage) = setup_storage();
        let project = create_project(&storage, Vec::new());

        Project::update(
            &storage,
            project.id,
            &UpdateProject {
                status: Some(ProjectStatus::Completed),
                ..UpdateProject::default()
            },
            &Actor::system(),
        )
        .unwrap()
        .unwrap();

        // A second write while already completed is a plain update.
        Project::update(
            &storage,
            project.id,
            &UpdateProject {
                progress: Some(100),
                ..UpdateProject::default()
            },
            &Actor::system(),
        )
        .unwrap()
        .unwrap();

        let types = event_types(&storage);
        assert_eq!(
            types.iter().filter(|t| *t == EVENT_PROJECT_COMPLETED).count(),
            1
        );
        assert_eq!(
            types.iter().filter(|t| *t == EVENT_PROJECT_UPDATED).count(),
            1
        );
    }

    #[test]
    fn team_diff_only_covers_added_members() {
        let (_dir, storage) = setup_storage();
        let kept = Uuid::new_v4();
        let removed = Uuid::new_v4();
        let added = Uuid::new_v4();
        let project = create_project(&storage, vec![kept, removed]);

        Project::update(
            &storage,
            project.id,
            &UpdateProject {
                team_members: Some(vec![kept, added]),
                ..UpdateProject::default()
            },
            &Actor::system(),
        )
        .unwrap()
        .unwrap();

        let entries = storage.load_all::<OutboxEntry>().unwrap();
        let team_changed: Vec<_> = entries
            .iter()
            .filter(|entry| entry.event_type == EVENT_PROJECT_TEAM_CHANGED)
            .collect();
        // One for the initial team, one for the update.
        assert_eq!(team_changed.len(), 2);

        let payload: ProjectTeamChangedPayload =
            serde_json::from_value(team_changed[1].payload.clone()).unwrap();
        assert_eq!(payload.added_member_ids, vec![added]);
    }

    #[test]
    fn toggle_favorite_is_self_inverse() {
        let (_dir, storage) = setup_storage();
        let project = create_project(&storage, Vec::new());
        assert!(!project.favorite);

        let toggled = Project::toggle_favorite(&storage, project.id).unwrap().unwrap();
        assert!(toggled.favorite);
        let restored = Project::toggle_favorite(&storage, project.id).unwrap().unwrap();
        assert_eq!(restored.favorite, project.favorite);
    }

    #[test]
    fn delete_does_not_touch_other_collections() {
        let (_dir, storage) = setup_storage();
        let project = create_project(&storage, Vec::new());

        assert_eq!(Project::delete(&storage, project.id, &Actor::system()).unwrap(), 1);
        assert_eq!(Project::delete(&storage, project.id, &Actor::system()).unwrap(), 0);
        assert!(event_types(&storage).contains(&EVENT_PROJECT_DELETED.to_string()));
    }
}
