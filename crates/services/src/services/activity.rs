use db::{
    Storage, StoreError,
    events::Actor,
    models::activity::Activity,
    types::{ActivityAction, EntityKind},
};
use uuid::Uuid;

/// Append-only sink for the who-did-what log. The dispatcher writes it;
/// the core never reads it back, presentation does.
#[derive(Clone, Default)]
pub struct ActivityService;

impl ActivityService {
    pub fn new() -> Self {
        Self
    }

    pub fn record(
        &self,
        storage: &Storage,
        entity_kind: EntityKind,
        entity_id: Uuid,
        action: ActivityAction,
        actor: &Actor,
        detail: Option<String>,
    ) -> Result<(), StoreError> {
        Activity::append(
            storage,
            entity_kind,
            entity_id,
            action,
            actor.member_id,
            &actor.name,
            detail,
        )?;
        Ok(())
    }
}
