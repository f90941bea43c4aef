use db::{Storage, StoreError};
use services::services::{
    activity::ActivityService,
    approval::ApprovalService,
    auth::AuthService,
    config::{ConfigError, RuntimeConfig, load_config_from_file, save_config_to_file},
    events::EventService,
    issue::IssueService,
    label::{LabelService, LabelServiceError},
    message::MessageService,
    notification::NotificationService,
    project::ProjectService,
};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, prelude::*};
use utils::assets::config_path;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Label(#[from] LabelServiceError),
}

/// Process-start wiring: one storage handle and one instance of every
/// service, constructed once and threaded through the callers.
#[derive(Clone)]
pub struct AppRuntime {
    config: RuntimeConfig,
    storage: Storage,
    events: EventService,
    projects: ProjectService,
    issues: IssueService,
    labels: LabelService,
    approvals: ApprovalService,
    messages: MessageService,
    auth: AuthService,
}

impl AppRuntime {
    pub fn new() -> Result<Self, RuntimeError> {
        let config = load_config_from_file(&config_path());
        save_config_to_file(&config, &config_path())?;

        let storage = match &config.data_dir {
            Some(dir) => Storage::open(dir)?,
            None => Storage::new()?,
        };
        Self::assemble(config, storage)
    }

    /// Builds a runtime over an explicit storage root. Test entry point.
    pub fn with_storage(storage: Storage) -> Result<Self, RuntimeError> {
        Self::assemble(RuntimeConfig::default(), storage)
    }

    fn assemble(config: RuntimeConfig, storage: Storage) -> Result<Self, RuntimeError> {
        let events = EventService::new(ActivityService::new(), NotificationService::new());
        let labels = LabelService::new();
        labels.initialize_labels(&storage)?;
        tracing::info!(root = %storage.root().display(), "storage ready");

        Ok(Self {
            config,
            storage,
            events,
            projects: ProjectService::new(),
            issues: IssueService::new(),
            labels,
            approvals: ApprovalService::new(),
            messages: MessageService::new(),
            auth: AuthService::new(),
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn events(&self) -> &EventService {
        &self.events
    }

    pub fn projects(&self) -> &ProjectService {
        &self.projects
    }

    pub fn issues(&self) -> &IssueService {
        &self.issues
    }

    pub fn labels(&self) -> &LabelService {
        &self.labels
    }

    pub fn approvals(&self) -> &ApprovalService {
        &self.approvals
    }

    pub fn messages(&self) -> &MessageService {
        &self.messages
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }
}

/// Installs the global tracing subscriber. `RUST_LOG` wins over the
/// configured filter.
pub fn init_tracing(config: &RuntimeConfig) {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_filter.clone());
    let filter_string = format!(
        "warn,db={level},services={level},app_runtime={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(filter_string).expect("Failed to create tracing filter");
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();
}

#[cfg(test)]
mod tests {
    use db::{
        events::Actor,
        models::{
            activity::Activity,
            issue::{CreateIssue, Issue},
            member::{CreateMember, Member},
            message::Message,
            project::{CreateProject, Project, UpdateProject},
        },
        types::{IssueStatus, IssueType, MemberRole},
    };
    use uuid::Uuid;

    use super::*;

    fn setup_runtime() -> (tempfile::TempDir, AppRuntime) {
        let dir = test_support::tmp_data_dir();
        let storage = Storage::open(dir.path()).unwrap();
        let runtime = AppRuntime::with_storage(storage).unwrap();
        (dir, runtime)
    }

    fn create_member(runtime: &AppRuntime, name: &str, contact: &str) -> Member {
        Member::create(
            runtime.storage(),
            &CreateMember {
                name: name.to_string(),
                contact: contact.to_string(),
                role: MemberRole::Developer,
                department: None,
                skills: None,
                status: None,
            },
            Uuid::new_v4(),
        )
        .unwrap()
    }

    #[test]
    fn startup_seeds_the_default_labels() {
        let (_dir, runtime) = setup_runtime();
        let labels = db::models::label::Label::find_all(runtime.storage()).unwrap();
        assert!(labels.len() >= 5);
    }

    #[test]
    fn end_to_end_team_and_issue_flow() {
        let (_dir, runtime) = setup_runtime();
        let storage = runtime.storage();

        let mira = create_member(&runtime, "Mira", "mira@example.com");
        let current_user = runtime
            .auth()
            .authenticate(storage, "mira@example.com", "1234")
            .unwrap()
            .expect("member login");
        let actor = current_user.actor();

        let noah = create_member(&runtime, "Noah", "noah@example.com");

        let project = runtime
            .projects()
            .create_project(
                storage,
                runtime.events(),
                CreateProject {
                    name: "Ticketing portal".to_string(),
                    description: "Self-service support portal".to_string(),
                    status: None,
                    priority: None,
                    industry: None,
                    team_members: Some(vec![mira.id]),
                    progress: None,
                    budget: None,
                    spent_budget: None,
                    start_date: None,
                    end_date: None,
                },
                &actor,
            )
            .unwrap();

        // Noah joins the team and gets exactly one direct message.
        runtime
            .projects()
            .update_project(
                storage,
                runtime.events(),
                project.id,
                UpdateProject {
                    team_members: Some(vec![mira.id, noah.id]),
                    ..UpdateProject::default()
                },
                &actor,
            )
            .unwrap()
            .unwrap();
        let inbox = Message::find_for_receiver(storage, noah.id).unwrap();
        assert_eq!(inbox.len(), 1);
        assert!(inbox[0].content.contains("Ticketing portal"));

        // Issue lifecycle with derived timestamps and a notification.
        let issue = runtime
            .issues()
            .create_issue(
                storage,
                runtime.events(),
                CreateIssue {
                    project_id: project.id,
                    title: "Attachment upload times out".to_string(),
                    description: "Large files stall at 90%".to_string(),
                    issue_type: IssueType::Bug,
                    status: None,
                    priority: None,
                    severity: None,
                    reporter_id: mira.id,
                    reporter_name: mira.name.clone(),
                    assignee_id: None,
                    assignee_name: None,
                    label_ids: None,
                    environment: None,
                    reproduction_steps: None,
                    expected_result: None,
                    actual_result: None,
                    metadata: None,
                },
                &actor,
            )
            .unwrap();
        runtime
            .issues()
            .assign_issue(storage, runtime.events(), issue.id, noah.id, "Noah", &actor)
            .unwrap();
        runtime
            .issues()
            .change_status(storage, runtime.events(), issue.id, IssueStatus::Resolved, &actor)
            .unwrap();
        runtime
            .issues()
            .change_status(storage, runtime.events(), issue.id, IssueStatus::Closed, &actor)
            .unwrap();

        let settled = Issue::find_by_id(storage, issue.id).unwrap().unwrap();
        assert!(settled.resolved_at.unwrap() < settled.closed_at.unwrap());
        assert_eq!(Message::find_for_receiver(storage, noah.id).unwrap().len(), 2);

        // Every step above left an attributed activity trail.
        let activities = Activity::find_recent(storage, 50).unwrap();
        assert!(activities.len() >= 5);
        assert!(activities.iter().all(|activity| activity.actor_name == "Mira"));

        // Nothing in the outbox is left undispatched.
        let pending =
            db::models::event_outbox::EventOutbox::fetch_undispatched(storage, 100).unwrap();
        assert!(pending.is_empty());
    }

    #[test]
    fn project_deletion_leaves_issues_orphaned_but_readable() {
        let (_dir, runtime) = setup_runtime();
        let storage = runtime.storage();
        let actor = Actor::system();

        let project = runtime
            .projects()
            .create_project(
                storage,
                runtime.events(),
                CreateProject {
                    name: "Sunset".to_string(),
                    description: String::new(),
                    status: None,
                    priority: None,
                    industry: None,
                    team_members: None,
                    progress: None,
                    budget: None,
                    spent_budget: None,
                    start_date: None,
                    end_date: None,
                },
                &actor,
            )
            .unwrap();
        let issue = runtime
            .issues()
            .create_issue(
                storage,
                runtime.events(),
                CreateIssue {
                    project_id: project.id,
                    title: "Leftover".to_string(),
                    description: String::new(),
                    issue_type: IssueType::Task,
                    status: None,
                    priority: None,
                    severity: None,
                    reporter_id: Uuid::new_v4(),
                    reporter_name: "Mira".to_string(),
                    assignee_id: None,
                    assignee_name: None,
                    label_ids: None,
                    environment: None,
                    reproduction_steps: None,
                    expected_result: None,
                    actual_result: None,
                    metadata: None,
                },
                &actor,
            )
            .unwrap();

        runtime
            .projects()
            .delete_project(storage, runtime.events(), project.id, &actor)
            .unwrap();

        // The issue survives; its project renders as the placeholder.
        let orphan = Issue::find_by_id(storage, issue.id).unwrap().unwrap();
        let projects = Project::find_all(storage).unwrap();
        assert_eq!(
            services::services::views::project_display_name(&projects, orphan.project_id),
            "-"
        );
    }
}
