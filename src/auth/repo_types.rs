use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::claims::Role;

/// Row shape of `users`; `role` is checked text in the database.
#[derive(Debug, Clone, FromRow)]
pub struct CredentialRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: OffsetDateTime,
}

impl From<CredentialRow> for Credential {
    fn from(r: CredentialRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            password_hash: r.password_hash,
            role: Role::parse(&r.role).unwrap_or_default(),
            created_at: r.created_at,
        }
    }
}

/// Credential projection without the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicCredential {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<&Credential> for PublicCredential {
    fn from(c: &Credential) -> Self {
        Self {
            id: c.id,
            email: c.email.clone(),
            role: c.role,
        }
    }
}
