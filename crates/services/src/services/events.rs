use db::{
    Storage, StoreError,
    events::{
        ApprovalEventPayload, EVENT_APPROVAL_CANCELLED, EVENT_APPROVAL_PROCESSED,
        EVENT_APPROVAL_REQUESTED, EVENT_ISSUE_ASSIGNED, EVENT_ISSUE_CREATED, EVENT_ISSUE_DELETED,
        EVENT_ISSUE_STATUS_CHANGED, EVENT_ISSUE_UPDATED, EVENT_PROJECT_COMPLETED,
        EVENT_PROJECT_CREATED, EVENT_PROJECT_DELETED, EVENT_PROJECT_TEAM_CHANGED,
        EVENT_PROJECT_UPDATED, IssueAssignedPayload, IssueEventPayload,
        IssueStatusChangedPayload, ProjectEventPayload, ProjectTeamChangedPayload,
    },
    models::event_outbox::{EventOutbox, OutboxEntry},
    types::{ActivityAction, ApprovalStatus, EntityKind},
};
use thiserror::Error;

use super::{activity::ActivityService, notification::NotificationService};

const OUTBOX_BATCH_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum EventError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Payload(#[from] serde_json::Error),
}

/// Drains the durable outbox and fans each entry out to the subscribers:
/// the activity log and the notification dispatcher. Runs synchronously at
/// the tail of every command; a failed entry keeps its error on the row
/// and is not retried.
#[derive(Clone)]
pub struct EventService {
    activity: ActivityService,
    notifications: NotificationService,
}

impl EventService {
    pub fn new(activity: ActivityService, notifications: NotificationService) -> Self {
        Self {
            activity,
            notifications,
        }
    }

    /// Command-path drain. Dispatch problems are recorded and logged, never
    /// surfaced: the primary mutation already succeeded and stays
    /// authoritative.
    pub fn flush_best_effort(&self, storage: &Storage) {
        if let Err(err) = self.flush_pending(storage) {
            tracing::error!(error = %err, "event outbox flush failed");
        }
    }

    pub fn flush_pending(&self, storage: &Storage) -> Result<(), EventError> {
        let entries = EventOutbox::fetch_undispatched(storage, OUTBOX_BATCH_LIMIT)?;
        if entries.is_empty() {
            return Ok(());
        }

        for entry in entries {
            match self.dispatch_entry(storage, &entry) {
                Ok(()) => {
                    EventOutbox::mark_published(storage, entry.id)?;
                }
                Err(err) => {
                    let err_msg = err.to_string();
                    tracing::warn!(
                        event_id = entry.id.to_string(),
                        event_type = entry.event_type.as_str(),
                        error = %err_msg,
                        "event dispatch failed"
                    );
                    EventOutbox::mark_failed(storage, entry.id, &err_msg)?;
                }
            }
        }

        Ok(())
    }

    fn dispatch_entry(&self, storage: &Storage, entry: &OutboxEntry) -> Result<(), EventError> {
        match entry.event_type.as_str() {
            EVENT_PROJECT_CREATED => {
                let payload: ProjectEventPayload = serde_json::from_value(entry.payload.clone())?;
                self.activity.record(
                    storage,
                    EntityKind::Project,
                    payload.project_id,
                    ActivityAction::Created,
                    &payload.actor,
                    Some(payload.project_name),
                )?;
            }
            EVENT_PROJECT_UPDATED => {
                let payload: ProjectEventPayload = serde_json::from_value(entry.payload.clone())?;
                self.activity.record(
                    storage,
                    EntityKind::Project,
                    payload.project_id,
                    ActivityAction::Updated,
                    &payload.actor,
                    Some(payload.project_name),
                )?;
            }
            EVENT_PROJECT_COMPLETED => {
                let payload: ProjectEventPayload = serde_json::from_value(entry.payload.clone())?;
                self.activity.record(
                    storage,
                    EntityKind::Project,
                    payload.project_id,
                    ActivityAction::Completed,
                    &payload.actor,
                    Some(payload.project_name),
                )?;
            }
            EVENT_PROJECT_DELETED => {
                let payload: ProjectEventPayload = serde_json::from_value(entry.payload.clone())?;
                self.activity.record(
                    storage,
                    EntityKind::Project,
                    payload.project_id,
                    ActivityAction::Deleted,
                    &payload.actor,
                    Some(payload.project_name),
                )?;
            }
            EVENT_PROJECT_TEAM_CHANGED => {
                let payload: ProjectTeamChangedPayload =
                    serde_json::from_value(entry.payload.clone())?;
                self.notifications.notify_team_additions(storage, &payload)?;
            }
            EVENT_ISSUE_CREATED => {
                let payload: IssueEventPayload = serde_json::from_value(entry.payload.clone())?;
                self.activity.record(
                    storage,
                    EntityKind::Issue,
                    payload.issue_id,
                    ActivityAction::Created,
                    &payload.actor,
                    Some(payload.title),
                )?;
            }
            EVENT_ISSUE_UPDATED => {
                let payload: IssueEventPayload = serde_json::from_value(entry.payload.clone())?;
                self.activity.record(
                    storage,
                    EntityKind::Issue,
                    payload.issue_id,
                    ActivityAction::Updated,
                    &payload.actor,
                    Some(payload.title),
                )?;
            }
            EVENT_ISSUE_STATUS_CHANGED => {
                let payload: IssueStatusChangedPayload =
                    serde_json::from_value(entry.payload.clone())?;
                self.activity.record(
                    storage,
                    EntityKind::Issue,
                    payload.issue_id,
                    ActivityAction::StatusChanged,
                    &payload.actor,
                    Some(format!("{} -> {}", payload.title, payload.status)),
                )?;
            }
            EVENT_ISSUE_ASSIGNED => {
                let payload: IssueAssignedPayload = serde_json::from_value(entry.payload.clone())?;
                self.activity.record(
                    storage,
                    EntityKind::Issue,
                    payload.issue_id,
                    ActivityAction::Assigned,
                    &payload.actor,
                    Some(format!("{} -> {}", payload.title, payload.assignee_name)),
                )?;
                self.notifications.notify_assignment(storage, &payload)?;
            }
            EVENT_ISSUE_DELETED => {
                let payload: IssueEventPayload = serde_json::from_value(entry.payload.clone())?;
                self.activity.record(
                    storage,
                    EntityKind::Issue,
                    payload.issue_id,
                    ActivityAction::Deleted,
                    &payload.actor,
                    Some(payload.title),
                )?;
            }
            EVENT_APPROVAL_REQUESTED => {
                let payload: ApprovalEventPayload = serde_json::from_value(entry.payload.clone())?;
                self.activity.record(
                    storage,
                    EntityKind::Approval,
                    payload.approval_id,
                    ActivityAction::Requested,
                    &payload.actor,
                    Some(payload.title),
                )?;
            }
            EVENT_APPROVAL_PROCESSED => {
                let payload: ApprovalEventPayload = serde_json::from_value(entry.payload.clone())?;
                let action = match payload.status {
                    ApprovalStatus::Approved => ActivityAction::Approved,
                    ApprovalStatus::Rejected => ActivityAction::Rejected,
                    _ => ActivityAction::Updated,
                };
                self.activity.record(
                    storage,
                    EntityKind::Approval,
                    payload.approval_id,
                    action,
                    &payload.actor,
                    Some(payload.title),
                )?;
            }
            EVENT_APPROVAL_CANCELLED => {
                let payload: ApprovalEventPayload = serde_json::from_value(entry.payload.clone())?;
                self.activity.record(
                    storage,
                    EntityKind::Approval,
                    payload.approval_id,
                    ActivityAction::Cancelled,
                    &payload.actor,
                    Some(payload.title),
                )?;
            }
            _ => {
                tracing::debug!(event_type = entry.event_type.as_str(), "unknown event type");
            }
        }

        Ok(())
    }
}
