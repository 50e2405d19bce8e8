use std::sync::RwLock;

use anyhow::Context;
use axum::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    claims::Role,
    repo_types::{Credential, CredentialRow, PublicCredential},
};

/// Persisted logins. Emails are compared case-insensitively.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Credential>>;
    /// Projection without the password hash.
    async fn find_public_by_id(&self, id: Uuid) -> anyhow::Result<Option<PublicCredential>>;
    /// `None` when the email is already taken.
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> anyhow::Result<Option<Credential>>;
    /// Inserts or overwrites hash and role for `email`.
    async fn upsert(&self, email: &str, password_hash: &str, role: Role)
        -> anyhow::Result<Credential>;
}

#[derive(Clone)]
pub struct PgCredentialStore {
    db: PgPool,
}

impl PgCredentialStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Credential>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, email, password_hash, role, created_at
            FROM users
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(row.map(Credential::from))
    }

    async fn find_public_by_id(&self, id: Uuid) -> anyhow::Result<Option<PublicCredential>> {
        let row = sqlx::query_as::<_, (Uuid, String, String)>(
            r#"SELECT id, email, role FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(row.map(|(id, email, role)| PublicCredential {
            id,
            email,
            role: Role::parse(&role).unwrap_or_default(),
        }))
    }

    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> anyhow::Result<Option<Credential>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            RETURNING id, email, password_hash, role, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_optional(&self.db)
        .await
        .context("insert user")?;
        Ok(row.map(Credential::from))
    }

    async fn upsert(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> anyhow::Result<Credential> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            ON CONFLICT ((lower(email)))
            DO UPDATE SET password_hash = EXCLUDED.password_hash, role = EXCLUDED.role
            RETURNING id, email, password_hash, role, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&self.db)
        .await
        .context("upsert user")?;
        Ok(row.into())
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    users: RwLock<Vec<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_err() -> anyhow::Error {
        anyhow::anyhow!("credential store lock poisoned")
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Credential>> {
        let users = self.users.read().map_err(|_| Self::lock_err())?;
        Ok(users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_public_by_id(&self, id: Uuid) -> anyhow::Result<Option<PublicCredential>> {
        let users = self.users.read().map_err(|_| Self::lock_err())?;
        Ok(users.iter().find(|u| u.id == id).map(PublicCredential::from))
    }

    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> anyhow::Result<Option<Credential>> {
        let mut users = self.users.write().map_err(|_| Self::lock_err())?;
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Ok(None);
        }
        let user = Credential {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(Some(user))
    }

    async fn upsert(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> anyhow::Result<Credential> {
        let mut users = self.users.write().map_err(|_| Self::lock_err())?;
        if let Some(existing) = users.iter_mut().find(|u| u.email.eq_ignore_ascii_case(email)) {
            existing.password_hash = password_hash.to_string();
            existing.role = role;
            return Ok(existing.clone());
        }
        let user = Credential {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emails_are_unique_case_insensitively() {
        let store = MemoryCredentialStore::new();
        let created = store.create("a@x.com", "h", Role::User).await.unwrap();
        assert!(created.is_some());
        assert!(store.create("A@X.com", "h2", Role::User).await.unwrap().is_none());
        assert!(store.find_by_email("A@x.COM").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn public_projection_omits_hash() {
        let store = MemoryCredentialStore::new();
        let user = store.create("a@x.com", "secret-hash", Role::User).await.unwrap().unwrap();
        let public = store.find_public_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(public.email, "a@x.com");
        assert_eq!(public.role, Role::User);
        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(store.find_public_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_promotes_existing_user() {
        let store = MemoryCredentialStore::new();
        let user = store.create("a@x.com", "old", Role::User).await.unwrap().unwrap();
        let seeded = store.upsert("a@x.com", "new", Role::Admin).await.unwrap();
        assert_eq!(seeded.id, user.id);
        assert_eq!(seeded.role, Role::Admin);
        assert_eq!(seeded.password_hash, "new");
    }
}
