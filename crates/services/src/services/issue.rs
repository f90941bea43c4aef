use db::{
    Storage, StoreError,
    events::Actor,
    models::{
        issue::{CreateIssue, Issue, UpdateIssue},
        issue_attachment::IssueAttachment,
        issue_comment::{CreateIssueComment, IssueComment},
    },
    types::IssueStatus,
};
use thiserror::Error;
use uuid::Uuid;

use super::events::EventService;

#[derive(Debug, Error)]
pub enum IssueServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Issue title must not be empty")]
    EmptyTitle,
    #[error("Comment content must not be empty")]
    EmptyComment,
    #[error("Assignee name must accompany the assignee id")]
    IncompleteAssignee,
}

pub type Result<T> = std::result::Result<T, IssueServiceError>;

#[derive(Clone, Default)]
pub struct IssueService;

impl IssueService {
    pub fn new() -> Self {
        Self
    }

    pub fn create_issue(
        &self,
        storage: &Storage,
        events: &EventService,
        payload: CreateIssue,
        actor: &Actor,
    ) -> Result<Issue> {
        if payload.title.trim().is_empty() {
            return Err(IssueServiceError::EmptyTitle);
        }
        if payload.assignee_id.is_some()
            && payload
                .assignee_name
                .as_deref()
                .is_none_or(|name| name.trim().is_empty())
        {
            return Err(IssueServiceError::IncompleteAssignee);
        }

        let id = Uuid::new_v4();
        let issue = Issue::create(storage, &payload, id, actor)?;
        tracing::info!(issue_id = %issue.id, project_id = %issue.project_id, "created issue");
        events.flush_best_effort(storage);
        Ok(issue)
    }

    pub fn update_issue(
        &self,
        storage: &Storage,
        events: &EventService,
        id: Uuid,
        payload: UpdateIssue,
        actor: &Actor,
    ) -> Result<Option<Issue>> {
        if payload
            .title
            .as_deref()
            .is_some_and(|title| title.trim().is_empty())
        {
            return Err(IssueServiceError::EmptyTitle);
        }

        let issue = Issue::update(storage, id, &payload, actor)?;
        if issue.is_some() {
            events.flush_best_effort(storage);
        }
        Ok(issue)
    }

    pub fn change_status(
        &self,
        storage: &Storage,
        events: &EventService,
        id: Uuid,
        new_status: IssueStatus,
        actor: &Actor,
    ) -> Result<Option<Issue>> {
        let issue = Issue::change_status(storage, id, new_status, actor)?;
        if issue.is_some() {
            events.flush_best_effort(storage);
        }
        Ok(issue)
    }

    /// Rejects the id-without-name half-assignment the store itself would
    /// accept.
    pub fn assign_issue(
        &self,
        storage: &Storage,
        events: &EventService,
        id: Uuid,
        assignee_id: Uuid,
        assignee_name: &str,
        actor: &Actor,
    ) -> Result<Option<Issue>> {
        if assignee_name.trim().is_empty() {
            return Err(IssueServiceError::IncompleteAssignee);
        }

        let issue = Issue::assign(storage, id, assignee_id, assignee_name, actor)?;
        if issue.is_some() {
            events.flush_best_effort(storage);
        }
        Ok(issue)
    }

    pub fn bulk_update_status(
        &self,
        storage: &Storage,
        events: &EventService,
        ids: &[Uuid],
        new_status: IssueStatus,
        actor: &Actor,
    ) -> Result<u64> {
        let changed = Issue::bulk_update_status(storage, ids, new_status, actor)?;
        if changed > 0 {
            events.flush_best_effort(storage);
        }
        Ok(changed)
    }

    pub fn delete_issue(
        &self,
        storage: &Storage,
        events: &EventService,
        id: Uuid,
        actor: &Actor,
    ) -> Result<u64> {
        let rows_affected = Issue::delete(storage, id, actor)?;
        if rows_affected > 0 {
            tracing::info!(issue_id = %id, "deleted issue");
            events.flush_best_effort(storage);
        }
        Ok(rows_affected)
    }

    pub fn add_comment(
        &self,
        storage: &Storage,
        payload: CreateIssueComment,
    ) -> Result<IssueComment> {
        if payload.content.trim().is_empty() {
            return Err(IssueServiceError::EmptyComment);
        }
        Ok(IssueComment::create(storage, &payload, Uuid::new_v4())?)
    }

    pub fn delete_comment(&self, storage: &Storage, id: Uuid) -> Result<u64> {
        Ok(IssueComment::delete(storage, id)?)
    }

    pub fn add_attachment(
        &self,
        storage: &Storage,
        issue_id: Uuid,
        file_name: &str,
        uploaded_by: Option<Uuid>,
    ) -> Result<IssueAttachment> {
        Ok(IssueAttachment::create(
            storage,
            issue_id,
            file_name,
            uploaded_by,
            Uuid::new_v4(),
        )?)
    }
}
