use db::{
    Storage, StoreError,
    models::message::{CreateMessage, Message},
    types::MessageType,
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MessageServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Message content must not be empty")]
    EmptyContent,
    #[error("Direct messages need a receiver")]
    MissingReceiver,
    #[error("Channel messages need a project channel")]
    MissingChannel,
}

pub type Result<T> = std::result::Result<T, MessageServiceError>;

#[derive(Clone, Default)]
pub struct MessageService;

impl MessageService {
    pub fn new() -> Self {
        Self
    }

    pub fn send_message(&self, storage: &Storage, payload: CreateMessage) -> Result<Message> {
        if payload.content.trim().is_empty() {
            return Err(MessageServiceError::EmptyContent);
        }
        match payload.message_type {
            MessageType::Direct if payload.receiver_id.is_none() => {
                return Err(MessageServiceError::MissingReceiver);
            }
            MessageType::Channel if payload.project_id.is_none() => {
                return Err(MessageServiceError::MissingChannel);
            }
            _ => {}
        }

        let message = Message::create(storage, &payload, Uuid::new_v4())?;
        tracing::debug!(message_id = %message.id, "sent message");
        Ok(message)
    }

    pub fn mark_read(&self, storage: &Storage, id: Uuid) -> Result<Option<Message>> {
        Ok(Message::mark_read(storage, id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, Storage, MessageService) {
        let dir = test_support::tmp_data_dir();
        let storage = Storage::open(dir.path()).unwrap();
        (dir, storage, MessageService::new())
    }

    #[test]
    fn direct_message_requires_a_receiver() {
        let (_dir, storage, service) = setup();

        let result = service.send_message(
            &storage,
            CreateMessage {
                message_type: MessageType::Direct,
                sender_id: Some(Uuid::new_v4()),
                sender_name: "Mira".to_string(),
                receiver_id: None,
                project_id: None,
                content: "ping".to_string(),
                related_issue_id: None,
            },
        );
        assert!(matches!(result, Err(MessageServiceError::MissingReceiver)));
    }

    #[test]
    fn channel_message_requires_a_project() {
        let (_dir, storage, service) = setup();

        let result = service.send_message(
            &storage,
            CreateMessage {
                message_type: MessageType::Channel,
                sender_id: Some(Uuid::new_v4()),
                sender_name: "Mira".to_string(),
                receiver_id: None,
                project_id: None,
                content: "ping".to_string(),
                related_issue_id: None,
            },
        );
        assert!(matches!(result, Err(MessageServiceError::MissingChannel)));
    }

    #[test]
    fn system_messages_need_no_addressing() {
        let (_dir, storage, service) = setup();

        let message = service
            .send_message(
                &storage,
                CreateMessage {
                    message_type: MessageType::System,
                    sender_id: None,
                    sender_name: "system".to_string(),
                    receiver_id: None,
                    project_id: None,
                    content: "maintenance window tonight".to_string(),
                    related_issue_id: None,
                },
            )
            .unwrap();
        assert!(message.read.is_none());
    }
}
