use db::{
    Storage, StoreError,
    events::{IssueAssignedPayload, ProjectTeamChangedPayload},
    models::message::{CreateMessage, Message},
    types::MessageType,
};
use uuid::Uuid;

/// Synthesizes direct messages to members affected by membership or
/// workload changes. Strictly best-effort: callers never roll back the
/// primary mutation over a failure here.
#[derive(Clone, Default)]
pub struct NotificationService;

impl NotificationService {
    pub fn new() -> Self {
        Self
    }

    /// One direct message per member newly added to the project team.
    pub fn notify_team_additions(
        &self,
        storage: &Storage,
        payload: &ProjectTeamChangedPayload,
    ) -> Result<(), StoreError> {
        for member_id in &payload.added_member_ids {
            let content = format!(
                "You have been added to the project \"{}\".",
                payload.project_name
            );
            self.send_direct(storage, *member_id, &payload.actor.name, content, None)?;
            tracing::debug!(
                member_id = %member_id,
                project_id = %payload.project_id,
                "queued team assignment notification"
            );
        }
        Ok(())
    }

    pub fn notify_assignment(
        &self,
        storage: &Storage,
        payload: &IssueAssignedPayload,
    ) -> Result<(), StoreError> {
        let content = format!("You have been assigned the issue \"{}\".", payload.title);
        self.send_direct(
            storage,
            payload.assignee_id,
            &payload.actor.name,
            content,
            Some(payload.issue_id),
        )
    }

    fn send_direct(
        &self,
        storage: &Storage,
        receiver_id: Uuid,
        sender_name: &str,
        content: String,
        related_issue_id: Option<Uuid>,
    ) -> Result<(), StoreError> {
        Message::create(
            storage,
            &CreateMessage {
                message_type: MessageType::Direct,
                sender_id: None,
                sender_name: sender_name.to_string(),
                receiver_id: Some(receiver_id),
                project_id: None,
                content,
                related_issue_id,
            },
            Uuid::new_v4(),
        )?;
        Ok(())
    }
}
