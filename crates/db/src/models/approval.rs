use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    Record, Storage, StoreError,
    events::{
        Actor, ApprovalEventPayload, EVENT_APPROVAL_CANCELLED, EVENT_APPROVAL_PROCESSED,
        EVENT_APPROVAL_REQUESTED,
    },
    models::event_outbox::EventOutbox,
    types::{ApprovalStatus, ApprovalType, EntityKind, Priority},
};

#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Approval is already {from}, cannot transition to {to}")]
    InvalidTransition {
        from: ApprovalStatus,
        to: ApprovalStatus,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Approval {
    pub id: Uuid,
    pub title: String,
    pub approval_type: ApprovalType,
    pub priority: Priority,
    pub requester_id: Uuid,
    pub requester_name: String,
    pub approver_id: Uuid,
    pub approver_name: String,
    pub project_id: Uuid,
    pub content: String,
    pub status: ApprovalStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Approval {
    const COLLECTION: &'static str = "approvals";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateApproval {
    pub title: String,
    pub approval_type: ApprovalType,
    pub priority: Option<Priority>,
    pub requester_id: Uuid,
    pub requester_name: String,
    pub approver_id: Uuid,
    pub approver_name: String,
    pub project_id: Uuid,
    pub content: String,
}

/// The two responses an approver can give to a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approved,
    Rejected,
}

impl From<ApprovalDecision> for ApprovalStatus {
    fn from(decision: ApprovalDecision) -> Self {
        match decision {
            ApprovalDecision::Approved => ApprovalStatus::Approved,
            ApprovalDecision::Rejected => ApprovalStatus::Rejected,
        }
    }
}

impl Approval {
    pub fn find_all(storage: &Storage) -> Result<Vec<Self>, StoreError> {
        let mut approvals = storage.load_all::<Self>()?;
        approvals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(approvals)
    }

    pub fn find_by_id(storage: &Storage, id: Uuid) -> Result<Option<Self>, StoreError> {
        storage.find_by_id(id)
    }

    pub fn find_by_approver(storage: &Storage, approver_id: Uuid) -> Result<Vec<Self>, StoreError> {
        let approvals = storage.load_all::<Self>()?;
        Ok(approvals
            .into_iter()
            .filter(|approval| approval.approver_id == approver_id)
            .collect())
    }

    pub fn request(
        storage: &Storage,
        data: &CreateApproval,
        id: Uuid,
        actor: &Actor,
    ) -> Result<Self, StoreError> {
        let now = Utc::now();
        let approval = storage.insert(Approval {
            id,
            title: data.title.clone(),
            approval_type: data.approval_type.clone(),
            priority: data.priority.clone().unwrap_or_default(),
            requester_id: data.requester_id,
            requester_name: data.requester_name.clone(),
            approver_id: data.approver_id,
            approver_name: data.approver_name.clone(),
            project_id: data.project_id,
            content: data.content.clone(),
            status: ApprovalStatus::Pending,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        })?;

        let payload = serde_json::to_value(ApprovalEventPayload {
            approval_id: approval.id,
            title: approval.title.clone(),
            status: approval.status.clone(),
            actor: actor.clone(),
        })?;
        EventOutbox::enqueue(storage, EVENT_APPROVAL_REQUESTED, EntityKind::Approval, id, payload)?;

        Ok(approval)
    }

    /// Settles a pending approval. A terminal approval refuses further
    /// transitions rather than silently overwriting its outcome.
    pub fn process(
        storage: &Storage,
        id: Uuid,
        decision: ApprovalDecision,
        rejection_reason: Option<String>,
        actor: &Actor,
    ) -> Result<Option<Self>, ApprovalError> {
        let Some(mut approval) = storage.find_by_id::<Self>(id)? else {
            return Ok(None);
        };
        let target = ApprovalStatus::from(decision);
        if approval.status.is_terminal() {
            return Err(ApprovalError::InvalidTransition {
                from: approval.status,
                to: target,
            });
        }

        approval.status = target;
        approval.rejection_reason = match decision {
            ApprovalDecision::Rejected => rejection_reason,
            ApprovalDecision::Approved => None,
        };
        approval.updated_at = Utc::now();

        let Some(approval) = storage.replace(approval)? else {
            return Ok(None);
        };

        let payload = serde_json::to_value(ApprovalEventPayload {
            approval_id: approval.id,
            title: approval.title.clone(),
            status: approval.status.clone(),
            actor: actor.clone(),
        })
        .map_err(StoreError::from)?;
        EventOutbox::enqueue(storage, EVENT_APPROVAL_PROCESSED, EntityKind::Approval, id, payload)?;

        Ok(Some(approval))
    }

    pub fn cancel(
        storage: &Storage,
        id: Uuid,
        actor: &Actor,
    ) -> Result<Option<Self>, ApprovalError> {
        let Some(mut approval) = storage.find_by_id::<Self>(id)? else {
            return Ok(None);
        };
        if approval.status.is_terminal() {
            return Err(ApprovalError::InvalidTransition {
                from: approval.status,
                to: ApprovalStatus::Cancelled,
            });
        }

        approval.status = ApprovalStatus::Cancelled;
        approval.updated_at = Utc::now();

        let Some(approval) = storage.replace(approval)? else {
            return Ok(None);
        };

        let payload = serde_json::to_value(ApprovalEventPayload {
            approval_id: approval.id,
            title: approval.title.clone(),
            status: approval.status.clone(),
            actor: actor.clone(),
        })
        .map_err(StoreError::from)?;
        EventOutbox::enqueue(storage, EVENT_APPROVAL_CANCELLED, EntityKind::Approval, id, payload)?;

        Ok(Some(approval))
    }

    pub fn delete(storage: &Storage, id: Uuid) -> Result<u64, StoreError> {
        storage.remove::<Self>(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_storage() -> (tempfile::TempDir, Storage) {
        let dir = test_support::tmp_data_dir();
        let storage = Storage::open(dir.path()).unwrap();
        (dir, storage)
    }

    fn request_approval(storage: &Storage) -> Approval {
        Approval::request(
            storage,
            &CreateApproval {
                title: "Release 1.4 to the floor".to_string(),
                approval_type: ApprovalType::Release,
                priority: Some(Priority::High),
                requester_id: Uuid::new_v4(),
                requester_name: "Mira".to_string(),
                approver_id: Uuid::new_v4(),
                approver_name: "Noah".to_string(),
                project_id: Uuid::new_v4(),
                content: "All gates green".to_string(),
            },
            Uuid::new_v4(),
            &Actor::system(),
        )
        .unwrap()
    }

    #[test]
    fn request_starts_pending_without_reason() {
        let (_dir, storage) = setup_storage();
        let approval = request_approval(&storage);

        assert_eq!(approval.status, ApprovalStatus::Pending);
        assert!(approval.rejection_reason.is_none());
    }

    #[test]
    fn rejection_records_the_reason() {
        let (_dir, storage) = setup_storage();
        let approval = request_approval(&storage);

        let rejected = Approval::process(
            &storage,
            approval.id,
            ApprovalDecision::Rejected,
            Some("insufficient budget".to_string()),
            &Actor::system(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(rejected.status, ApprovalStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("insufficient budget"));
    }

    #[test]
    fn rejection_without_reason_is_recorded_as_such() {
        let (_dir, storage) = setup_storage();
        let approval = request_approval(&storage);

        let rejected =
            Approval::process(&storage, approval.id, ApprovalDecision::Rejected, None, &Actor::system())
                .unwrap()
                .unwrap();
        assert!(rejected.rejection_reason.is_none());
    }

    // The permissive original allowed re-processing a settled approval;
    // here the terminal state is guarded instead.
    #[test]
    fn terminal_approval_refuses_reprocessing() {
        let (_dir, storage) = setup_storage();
        let approval = request_approval(&storage);

        Approval::process(
            &storage,
            approval.id,
            ApprovalDecision::Rejected,
            Some("insufficient budget".to_string()),
            &Actor::system(),
        )
        .unwrap();

        let second = Approval::process(
            &storage,
            approval.id,
            ApprovalDecision::Approved,
            None,
            &Actor::system(),
        );
        assert!(matches!(
            second,
            Err(ApprovalError::InvalidTransition {
                from: ApprovalStatus::Rejected,
                to: ApprovalStatus::Approved,
            })
        ));

        // The recorded rejection stays authoritative.
        let stored = Approval::find_by_id(&storage, approval.id).unwrap().unwrap();
        assert_eq!(stored.status, ApprovalStatus::Rejected);
        assert_eq!(stored.rejection_reason.as_deref(), Some("insufficient budget"));
    }

    #[test]
    fn cancel_only_reaches_pending_approvals() {
        let (_dir, storage) = setup_storage();
        let approval = request_approval(&storage);

        let cancelled = Approval::cancel(&storage, approval.id, &Actor::system())
            .unwrap()
            .unwrap();
        assert_eq!(cancelled.status, ApprovalStatus::Cancelled);

        let again = Approval::cancel(&storage, approval.id, &Actor::system());
        assert!(matches!(again, Err(ApprovalError::InvalidTransition { .. })));
    }
}
