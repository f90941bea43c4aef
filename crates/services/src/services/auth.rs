use db::{Storage, StoreError, events::Actor, models::member::Member};
use uuid::Uuid;

/// Built-in credentials checked ahead of the member roster.
const STATIC_USERS: &[(&str, &str, &str)] = &[
    ("admin", "admin1234", "Administrator"),
    ("manager", "manager1234", "Operations Manager"),
];

/// Members sign in with their contact email and the shared default
/// password of a seeded workspace.
const DEFAULT_MEMBER_PASSWORD: &str = "1234";

/// Session identity used for attribution of activity entries and
/// messages. A missing member id means a static user.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub member_id: Option<Uuid>,
    pub name: String,
}

impl CurrentUser {
    pub fn actor(&self) -> Actor {
        Actor {
            member_id: self.member_id,
            name: self.name.clone(),
        }
    }
}

#[derive(Clone, Default)]
pub struct AuthService;

impl AuthService {
    pub fn new() -> Self {
        Self
    }

    pub fn authenticate(
        &self,
        storage: &Storage,
        username: &str,
        password: &str,
    ) -> Result<Option<CurrentUser>, StoreError> {
        if let Some((_, _, display_name)) = STATIC_USERS
            .iter()
            .find(|(user, pass, _)| *user == username && *pass == password)
        {
            return Ok(Some(CurrentUser {
                member_id: None,
                name: (*display_name).to_string(),
            }));
        }

        if password == DEFAULT_MEMBER_PASSWORD
            && let Some(member) = Member::find_by_contact(storage, username)?
        {
            return Ok(Some(CurrentUser {
                member_id: Some(member.id),
                name: member.name,
            }));
        }

        tracing::warn!(username, "authentication failed");
        Ok(None)
    }
}
