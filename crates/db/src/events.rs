use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ApprovalStatus, IssueStatus};

pub const EVENT_PROJECT_CREATED: &str = "project.created";
pub const EVENT_PROJECT_UPDATED: &str = "project.updated";
pub const EVENT_PROJECT_COMPLETED: &str = "project.completed";
pub const EVENT_PROJECT_TEAM_CHANGED: &str = "project.team_changed";
pub const EVENT_PROJECT_DELETED: &str = "project.deleted";

pub const EVENT_ISSUE_CREATED: &str = "issue.created";
pub const EVENT_ISSUE_UPDATED: &str = "issue.updated";
pub const EVENT_ISSUE_STATUS_CHANGED: &str = "issue.status_changed";
pub const EVENT_ISSUE_ASSIGNED: &str = "issue.assigned";
pub const EVENT_ISSUE_DELETED: &str = "issue.deleted";

pub const EVENT_APPROVAL_REQUESTED: &str = "approval.requested";
pub const EVENT_APPROVAL_PROCESSED: &str = "approval.processed";
pub const EVENT_APPROVAL_CANCELLED: &str = "approval.cancelled";

/// Who performed a mutation. Attribution only; a missing member id means
/// the actor authenticated outside the member roster (static user or
/// system).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub member_id: Option<Uuid>,
    pub name: String,
}

impl Actor {
    pub fn system() -> Self {
        Actor {
            member_id: None,
            name: "system".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectEventPayload {
    pub project_id: Uuid,
    pub project_name: String,
    pub actor: Actor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectTeamChangedPayload {
    pub project_id: Uuid,
    pub project_name: String,
    /// Member ids present in the new team but not the old one. Members
    /// that were removed are deliberately absent: they are not notified.
    pub added_member_ids: Vec<Uuid>,
    pub actor: Actor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueEventPayload {
    pub issue_id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub actor: Actor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueStatusChangedPayload {
    pub issue_id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub status: IssueStatus,
    pub actor: Actor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueAssignedPayload {
    pub issue_id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub assignee_id: Uuid,
    pub assignee_name: String,
    pub actor: Actor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalEventPayload {
    pub approval_id: Uuid,
    pub title: String,
    pub status: ApprovalStatus,
    pub actor: Actor,
}
