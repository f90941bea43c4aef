use db::{
    Storage, StoreError,
    events::Actor,
    models::approval::{Approval, ApprovalDecision, ApprovalError, CreateApproval},
};
use thiserror::Error;
use uuid::Uuid;

use super::events::EventService;

#[derive(Debug, Error)]
pub enum ApprovalServiceError {
    #[error(transparent)]
    Approval(#[from] ApprovalError),
    #[error("Approval title must not be empty")]
    EmptyTitle,
}

impl From<StoreError> for ApprovalServiceError {
    fn from(err: StoreError) -> Self {
        ApprovalServiceError::Approval(ApprovalError::Store(err))
    }
}

pub type Result<T> = std::result::Result<T, ApprovalServiceError>;

#[derive(Clone, Default)]
pub struct ApprovalService;

impl ApprovalService {
    pub fn new() -> Self {
        Self
    }

    pub fn request_approval(
        &self,
        storage: &Storage,
        events: &EventService,
        payload: CreateApproval,
        actor: &Actor,
    ) -> Result<Approval> {
        if payload.title.trim().is_empty() {
            return Err(ApprovalServiceError::EmptyTitle);
        }

        let id = Uuid::new_v4();
        let approval = Approval::request(storage, &payload, id, actor)?;
        tracing::info!(approval_id = %approval.id, title = %approval.title, "requested approval");
        events.flush_best_effort(storage);
        Ok(approval)
    }

    pub fn process_approval(
        &self,
        storage: &Storage,
        events: &EventService,
        id: Uuid,
        decision: ApprovalDecision,
        rejection_reason: Option<String>,
        actor: &Actor,
    ) -> Result<Option<Approval>> {
        let approval = Approval::process(storage, id, decision, rejection_reason, actor)?;
        if approval.is_some() {
            events.flush_best_effort(storage);
        }
        Ok(approval)
    }

    pub fn cancel_approval(
        &self,
        storage: &Storage,
        events: &EventService,
        id: Uuid,
        actor: &Actor,
    ) -> Result<Option<Approval>> {
        let approval = Approval::cancel(storage, id, actor)?;
        if approval.is_some() {
            events.flush_best_effort(storage);
        }
        Ok(approval)
    }
}

#[cfg(test)]
mod tests {
    use db::{
        models::activity::Activity,
        types::{ActivityAction, ApprovalStatus, ApprovalType, EntityKind, Priority},
    };

    use super::*;

    fn setup() -> (tempfile::TempDir, Storage, EventService, ApprovalService) {
        let dir = test_support::tmp_data_dir();
        let storage = Storage::open(dir.path()).unwrap();
        let events = EventService::new(Default::default(), Default::default());
        (dir, storage, events, ApprovalService::new())
    }

    fn request_payload() -> CreateApproval {
        CreateApproval {
            title: "Budget extension for Q4".to_string(),
            approval_type: ApprovalType::Budget,
            priority: Some(Priority::Urgent),
            requester_id: Uuid::new_v4(),
            requester_name: "Mira".to_string(),
            approver_id: Uuid::new_v4(),
            approver_name: "Noah".to_string(),
            project_id: Uuid::new_v4(),
            content: "Need 40k more for tooling".to_string(),
        }
    }

    #[test]
    fn request_then_reject_records_reason_and_activity() {
        let (_dir, storage, events, service) = setup();

        let approval = service
            .request_approval(&storage, &events, request_payload(), &Actor::system())
            .unwrap();
        assert_eq!(approval.status, ApprovalStatus::Pending);

        let rejected = service
            .process_approval(
                &storage,
                &events,
                approval.id,
                ApprovalDecision::Rejected,
                Some("insufficient budget".to_string()),
                &Actor::system(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(rejected.rejection_reason.as_deref(), Some("insufficient budget"));

        let activities = Activity::find_for_entity(&storage, approval.id).unwrap();
        let actions: Vec<&ActivityAction> =
            activities.iter().map(|activity| &activity.action).collect();
        assert!(actions.contains(&&ActivityAction::Requested));
        assert!(actions.contains(&&ActivityAction::Rejected));
        assert!(activities.iter().all(|a| a.entity_kind == EntityKind::Approval));
    }

    #[test]
    fn settled_approval_cannot_be_processed_again() {
        let (_dir, storage, events, service) = setup();

        let approval = service
            .request_approval(&storage, &events, request_payload(), &Actor::system())
            .unwrap();
        service
            .process_approval(
                &storage,
                &events,
                approval.id,
                ApprovalDecision::Rejected,
                Some("insufficient budget".to_string()),
                &Actor::system(),
            )
            .unwrap();

        let second = service.process_approval(
            &storage,
            &events,
            approval.id,
            ApprovalDecision::Approved,
            None,
            &Actor::system(),
        );
        assert!(matches!(
            second,
            Err(ApprovalServiceError::Approval(ApprovalError::InvalidTransition { .. }))
        ));
    }

    #[test]
    fn processing_an_unknown_approval_is_a_quiet_miss() {
        let (_dir, storage, events, service) = setup();

        let result = service
            .process_approval(
                &storage,
                &events,
                Uuid::new_v4(),
                ApprovalDecision::Approved,
                None,
                &Actor::system(),
            )
            .unwrap();
        assert!(result.is_none());
    }
}
