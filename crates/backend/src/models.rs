// Domain models and their Diesel row representations
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use gatehouse_types::{Gender, MessageResponse, Role, Sender, UserResponse};
use std::fmt;
use uuid::Uuid;

/// A registered account.
///
/// `password_hash` is the PHC string produced by the credential hasher. It is
/// kept out of `Debug` output and never converted into a response type.
#[derive(Clone, PartialEq)]
pub struct Identity {
    pub id: Uuid,
    pub first_name: String,
    pub name: String,
    pub birthday: DateTime<Utc>,
    pub gender: Gender,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub address: Option<String>,
    pub subscription_code: Option<String>,
    pub is_active: bool,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

impl From<&Identity> for UserResponse {
    fn from(identity: &Identity) -> Self {
        UserResponse {
            id: identity.id,
            first_name: identity.first_name.clone(),
            name: identity.name.clone(),
            birthday: identity.birthday,
            gender: identity.gender,
            email: identity.email.clone(),
            role: identity.role,
            address: identity.address.clone().unwrap_or_default(),
            subscription_code: identity.subscription_code.clone().unwrap_or_default(),
            is_active: identity.is_active,
            verified: identity.verified,
            created_at: identity.created_at,
            updated_at: identity.updated_at,
        }
    }
}

impl From<Identity> for UserResponse {
    fn from(identity: Identity) -> Self {
        UserResponse::from(&identity)
    }
}

/// A chat message owned by one identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub sender: Sender,
    pub content: String,
    pub date: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        MessageResponse {
            id: message.id,
            sender: message.sender,
            content: message.content,
            date: message.date,
        }
    }
}

/// Database representation of users.
/// Enumerations are stored as VARCHAR and parsed on the way out.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct IdentityRow {
    pub id: Uuid,
    pub first_name: String,
    pub name: String,
    pub birthday: DateTime<Utc>,
    pub gender: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub address: Option<String>,
    pub subscription_code: Option<String>,
    pub is_active: bool,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = anyhow::Error;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        Ok(Identity {
            id: row.id,
            first_name: row.first_name,
            name: row.name,
            birthday: row.birthday,
            gender: row.gender.parse().map_err(anyhow::Error::msg)?,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role.parse().map_err(anyhow::Error::msg)?,
            address: row.address,
            subscription_code: row.subscription_code,
            is_active: row.is_active,
            verified: row.verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<&Identity> for IdentityRow {
    fn from(identity: &Identity) -> Self {
        IdentityRow {
            id: identity.id,
            first_name: identity.first_name.clone(),
            name: identity.name.clone(),
            birthday: identity.birthday,
            gender: identity.gender.as_str().to_string(),
            email: identity.email.clone(),
            password_hash: identity.password_hash.clone(),
            role: identity.role.as_str().to_string(),
            address: identity.address.clone(),
            subscription_code: identity.subscription_code.clone(),
            is_active: identity.is_active,
            verified: identity.verified,
            created_at: identity.created_at,
            updated_at: identity.updated_at,
        }
    }
}

/// Database representation of messages
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MessageRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub sender: String,
    pub content: String,
    pub date: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = anyhow::Error;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Message {
            id: row.id,
            owner_id: row.owner_id,
            sender: row.sender.parse().map_err(anyhow::Error::msg)?,
            content: row.content,
            date: row.date,
        })
    }
}

impl From<&Message> for MessageRow {
    fn from(message: &Message) -> Self {
        MessageRow {
            id: message.id,
            owner_id: message.owner_id,
            sender: message.sender.as_str().to_string(),
            content: message.content.clone(),
            date: message.date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_identity;

    #[test]
    fn test_debug_omits_password_hash() {
        let identity = sample_identity();
        let debug = format!("{:?}", identity);
        assert!(debug.contains("grace@example.com"));
        assert!(!debug.contains("argon2id"));
    }

    #[test]
    fn test_user_response_fills_optional_strings() {
        let identity = sample_identity();
        let response = UserResponse::from(&identity);
        assert_eq!(response.address, "");
        assert_eq!(response.subscription_code, "SUB-1");
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_row_round_trip_preserves_enums() {
        let mut identity = sample_identity();
        identity.role = Role::Admin;
        let row = IdentityRow::from(&identity);
        assert_eq!(row.role, "admin");
        assert_eq!(row.gender, "female");
        let back = Identity::try_from(row).unwrap();
        assert_eq!(back, identity);
    }

    #[test]
    fn test_row_with_unknown_role_is_rejected() {
        let mut row = IdentityRow::from(&sample_identity());
        row.role = "superuser".to_string();
        assert!(Identity::try_from(row).is_err());
    }
}
