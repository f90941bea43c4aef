use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Record, Storage, StoreError, types::MemberRole};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub name: String,
    pub contact: String,
    pub role: MemberRole,
    pub department: Option<String>,
    pub skills: Vec<String>,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Member {
    const COLLECTION: &'static str = "members";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMember {
    pub name: String,
    pub contact: String,
    pub role: MemberRole,
    pub department: Option<String>,
    pub skills: Option<Vec<String>>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMember {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub role: Option<MemberRole>,
    pub department: Option<String>,
    pub skills: Option<Vec<String>>,
    pub status: Option<String>,
}

impl Member {
    pub fn find_all(storage: &Storage) -> Result<Vec<Self>, StoreError> {
        storage.load_all()
    }

    pub fn find_by_id(storage: &Storage, id: Uuid) -> Result<Option<Self>, StoreError> {
        storage.find_by_id(id)
    }

    pub fn find_by_contact(storage: &Storage, contact: &str) -> Result<Option<Self>, StoreError> {
        let members = storage.load_all::<Self>()?;
        Ok(members.into_iter().find(|member| member.contact == contact))
    }

    pub fn create(storage: &Storage, data: &CreateMember, id: Uuid) -> Result<Self, StoreError> {
        let now = Utc::now();
        storage.insert(Member {
            id,
            name: data.name.clone(),
            contact: data.contact.clone(),
            role: data.role.clone(),
            department: data.department.clone(),
            skills: data.skills.clone().unwrap_or_default(),
            status: data.status.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update(
        storage: &Storage,
        id: Uuid,
        payload: &UpdateMember,
    ) -> Result<Option<Self>, StoreError> {
        let Some(mut member) = storage.find_by_id::<Self>(id)? else {
            return Ok(None);
        };

        if let Some(name) = payload.name.clone() {
            member.name = name;
        }
        if let Some(contact) = payload.contact.clone() {
            member.contact = contact;
        }
        if let Some(role) = payload.role.clone() {
            member.role = role;
        }
        if payload.department.is_some() {
            member.department = payload.department.clone();
        }
        if let Some(skills) = payload.skills.clone() {
            member.skills = skills;
        }
        if payload.status.is_some() {
            member.status = payload.status.clone();
        }
        member.updated_at = Utc::now();

        storage.replace(member)
    }

    pub fn delete(storage: &Storage, id: Uuid) -> Result<u64, StoreError> {
        storage.remove::<Self>(id)
    }
}
