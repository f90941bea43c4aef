use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Record, Storage, StoreError,
    events::{
        Actor, EVENT_ISSUE_ASSIGNED, EVENT_ISSUE_CREATED, EVENT_ISSUE_DELETED,
        EVENT_ISSUE_STATUS_CHANGED, EVENT_ISSUE_UPDATED, IssueAssignedPayload, IssueEventPayload,
        IssueStatusChangedPayload,
    },
    models::{
        event_outbox::EventOutbox, issue_attachment::IssueAttachment, issue_comment::IssueComment,
    },
    types::{EntityKind, IssuePriority, IssueSeverity, IssueStatus, IssueType},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub issue_type: IssueType,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub severity: Option<IssueSeverity>,
    pub reporter_id: Uuid,
    pub reporter_name: String,
    pub assignee_id: Option<Uuid>,
    pub assignee_name: Option<String>,
    pub label_ids: Vec<Uuid>,
    pub environment: Option<String>,
    pub reproduction_steps: Option<String>,
    pub expected_result: Option<String>,
    pub actual_result: Option<String>,
    /// Free-form keys for non-software industries (line, lot, station...).
    pub metadata: HashMap<String, String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Issue {
    const COLLECTION: &'static str = "issues";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateIssue {
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub issue_type: IssueType,
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
    pub severity: Option<IssueSeverity>,
    pub reporter_id: Uuid,
    pub reporter_name: String,
    pub assignee_id: Option<Uuid>,
    pub assignee_name: Option<String>,
    pub label_ids: Option<Vec<Uuid>>,
    pub environment: Option<String>,
    pub reproduction_steps: Option<String>,
    pub expected_result: Option<String>,
    pub actual_result: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateIssue {
    pub title: Option<String>,
    pub description: Option<String>,
    pub issue_type: Option<IssueType>,
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
    pub severity: Option<IssueSeverity>,
    pub label_ids: Option<Vec<Uuid>>,
    pub environment: Option<String>,
    pub reproduction_steps: Option<String>,
    pub expected_result: Option<String>,
    pub actual_result: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

impl Issue {
    pub fn find_all(storage: &Storage) -> Result<Vec<Self>, StoreError> {
        storage.load_all()
    }

    pub fn find_by_id(storage: &Storage, id: Uuid) -> Result<Option<Self>, StoreError> {
        storage.find_by_id(id)
    }

    pub fn find_by_project_id(storage: &Storage, project_id: Uuid) -> Result<Vec<Self>, StoreError> {
        let issues = storage.load_all::<Self>()?;
        Ok(issues
            .into_iter()
            .filter(|issue| issue.project_id == project_id)
            .collect())
    }

    pub fn find_by_assignee(storage: &Storage, member_id: Uuid) -> Result<Vec<Self>, StoreError> {
        let issues = storage.load_all::<Self>()?;
        Ok(issues
            .into_iter()
            .filter(|issue| issue.assignee_id == Some(member_id))
            .collect())
    }

    pub fn create(
        storage: &Storage,
        data: &CreateIssue,
        id: Uuid,
        actor: &Actor,
    ) -> Result<Self, StoreError> {
        let now = Utc::now();
        let mut issue = Issue {
            id,
            project_id: data.project_id,
            title: data.title.clone(),
            description: data.description.clone(),
            issue_type: data.issue_type.clone(),
            status: IssueStatus::Open,
            priority: data.priority.clone().unwrap_or_default(),
            severity: data.severity.clone(),
            reporter_id: data.reporter_id,
            reporter_name: data.reporter_name.clone(),
            assignee_id: data.assignee_id,
            assignee_name: data.assignee_name.clone(),
            label_ids: data.label_ids.clone().unwrap_or_default(),
            environment: data.environment.clone(),
            reproduction_steps: data.reproduction_steps.clone(),
            expected_result: data.expected_result.clone(),
            actual_result: data.actual_result.clone(),
            metadata: data.metadata.clone().unwrap_or_default(),
            resolved_at: None,
            closed_at: None,
            created_at: now,
            updated_at: now,
        };
        // An issue born in a later state still earns its timestamps.
        if let Some(status) = data.status.clone() {
            issue.apply_status(status, now);
        }
        let issue = storage.insert(issue)?;

        let payload = serde_json::to_value(IssueEventPayload {
            issue_id: issue.id,
            project_id: issue.project_id,
            title: issue.title.clone(),
            actor: actor.clone(),
        })?;
        EventOutbox::enqueue(storage, EVENT_ISSUE_CREATED, EntityKind::Issue, id, payload)?;

        Ok(issue)
    }

    pub fn update(
        storage: &Storage,
        id: Uuid,
        payload: &UpdateIssue,
        actor: &Actor,
    ) -> Result<Option<Self>, StoreError> {
        let Some(mut issue) = storage.find_by_id::<Self>(id)? else {
            return Ok(None);
        };
        let previous_status = issue.status.clone();

        if let Some(title) = payload.title.clone() {
            issue.title = title;
        }
        if let Some(description) = payload.description.clone() {
            issue.description = description;
        }
        if let Some(issue_type) = payload.issue_type.clone() {
            issue.issue_type = issue_type;
        }
        if let Some(priority) = payload.priority.clone() {
            issue.priority = priority;
        }
        if payload.severity.is_some() {
            issue.severity = payload.severity.clone();
        }
        if let Some(label_ids) = payload.label_ids.clone() {
            issue.label_ids = label_ids;
        }
        if payload.environment.is_some() {
            issue.environment = payload.environment.clone();
        }
        if payload.reproduction_steps.is_some() {
            issue.reproduction_steps = payload.reproduction_steps.clone();
        }
        if payload.expected_result.is_some() {
            issue.expected_result = payload.expected_result.clone();
        }
        if payload.actual_result.is_some() {
            issue.actual_result = payload.actual_result.clone();
        }
        if let Some(metadata) = payload.metadata.clone() {
            issue.metadata = metadata;
        }
        let now = Utc::now();
        if let Some(status) = payload.status.clone() {
            issue.apply_status(status, now);
        }
        issue.updated_at = now;

        let Some(issue) = storage.replace(issue)? else {
            return Ok(None);
        };

        if issue.status != previous_status {
            Self::enqueue_status_changed(storage, &issue, actor)?;
        } else {
            let event_payload = serde_json::to_value(IssueEventPayload {
                issue_id: issue.id,
                project_id: issue.project_id,
                title: issue.title.clone(),
                actor: actor.clone(),
            })?;
            EventOutbox::enqueue(storage, EVENT_ISSUE_UPDATED, EntityKind::Issue, id, event_payload)?;
        }

        Ok(Some(issue))
    }

    pub fn change_status(
        storage: &Storage,
        id: Uuid,
        new_status: IssueStatus,
        actor: &Actor,
    ) -> Result<Option<Self>, StoreError> {
        let Some(mut issue) = storage.find_by_id::<Self>(id)? else {
            return Ok(None);
        };
        let now = Utc::now();
        issue.apply_status(new_status, now);
        issue.updated_at = now;

        let Some(issue) = storage.replace(issue)? else {
            return Ok(None);
        };
        Self::enqueue_status_changed(storage, &issue, actor)?;
        Ok(Some(issue))
    }

    /// Overwrites the assignee id/name pair as a unit.
    pub fn assign(
        storage: &Storage,
        id: Uuid,
        assignee_id: Uuid,
        assignee_name: &str,
        actor: &Actor,
    ) -> Result<Option<Self>, StoreError> {
        let Some(mut issue) = storage.find_by_id::<Self>(id)? else {
            return Ok(None);
        };
        issue.assignee_id = Some(assignee_id);
        issue.assignee_name = Some(assignee_name.to_string());
        issue.updated_at = Utc::now();

        let Some(issue) = storage.replace(issue)? else {
            return Ok(None);
        };

        let payload = serde_json::to_value(IssueAssignedPayload {
            issue_id: issue.id,
            project_id: issue.project_id,
            title: issue.title.clone(),
            assignee_id,
            assignee_name: assignee_name.to_string(),
            actor: actor.clone(),
        })?;
        EventOutbox::enqueue(storage, EVENT_ISSUE_ASSIGNED, EntityKind::Issue, id, payload)?;

        Ok(Some(issue))
    }

    /// Applies the same status and timestamp rules to every named row.
    /// Duplicate ids in the input collapse to a single application; unknown
    /// ids are skipped. Returns how many rows changed.
    pub fn bulk_update_status(
        storage: &Storage,
        ids: &[Uuid],
        new_status: IssueStatus,
        actor: &Actor,
    ) -> Result<u64, StoreError> {
        let mut issues = storage.load_all::<Self>()?;
        let now = Utc::now();
        let mut seen = HashSet::new();
        let mut changed = Vec::new();

        for id in ids {
            if !seen.insert(*id) {
                continue;
            }
            if let Some(issue) = issues.iter_mut().find(|issue| issue.id == *id) {
                issue.apply_status(new_status.clone(), now);
                issue.updated_at = now;
                changed.push(issue.clone());
            }
        }

        if changed.is_empty() {
            return Ok(0);
        }
        storage.persist_all(&issues)?;
        for issue in &changed {
            Self::enqueue_status_changed(storage, issue, actor)?;
        }
        Ok(changed.len() as u64)
    }

    /// Removes the issue and the child rows it owns directly.
    pub fn delete(storage: &Storage, id: Uuid, actor: &Actor) -> Result<u64, StoreError> {
        let Some(issue) = storage.find_by_id::<Self>(id)? else {
            return Ok(0);
        };

        let rows_affected = storage.remove::<Self>(id)?;
        if rows_affected > 0 {
            IssueComment::delete_by_issue_id(storage, id)?;
            IssueAttachment::delete_by_issue_id(storage, id)?;

            let payload = serde_json::to_value(IssueEventPayload {
                issue_id: id,
                project_id: issue.project_id,
                title: issue.title.clone(),
                actor: actor.clone(),
            })?;
            EventOutbox::enqueue(storage, EVENT_ISSUE_DELETED, EntityKind::Issue, id, payload)?;
        }
        Ok(rows_affected)
    }

    /// Drops a label id from every issue referencing it. Invoked by label
    /// deletion; no events, the issues themselves did not change meaning.
    pub fn strip_label(storage: &Storage, label_id: Uuid) -> Result<u64, StoreError> {
        let mut issues = storage.load_all::<Self>()?;
        let mut stripped = 0;
        for issue in issues.iter_mut() {
            let before = issue.label_ids.len();
            issue.label_ids.retain(|id| *id != label_id);
            if issue.label_ids.len() != before {
                stripped += 1;
            }
        }
        if stripped > 0 {
            storage.persist_all(&issues)?;
        }
        Ok(stripped)
    }

    /// Status write with derived timestamps: the first transition into
    /// resolved or closed stamps the matching field, later writes leave it
    /// alone. Reopening clears nothing; the stamps are historical markers.
    fn apply_status(&mut self, new_status: IssueStatus, now: DateTime<Utc>) {
        match new_status {
            IssueStatus::Resolved => {
                if self.resolved_at.is_none() {
                    self.resolved_at = Some(now);
                }
            }
            IssueStatus::Closed => {
                if self.closed_at.is_none() {
                    self.closed_at = Some(now);
                }
            }
            _ => {}
        }
        self.status = new_status;
    }

    fn enqueue_status_changed(
        storage: &Storage,
        issue: &Issue,
        actor: &Actor,
    ) -> Result<(), StoreError> {
        let payload = serde_json::to_value(IssueStatusChangedPayload {
            issue_id: issue.id,
            project_id: issue.project_id,
            title: issue.title.clone(),
            status: issue.status.clone(),
            actor: actor.clone(),
        })?;
        EventOutbox::enqueue(
            storage,
            EVENT_ISSUE_STATUS_CHANGED,
            EntityKind::Issue,
            issue.id,
            payload,
        )
    }
}
