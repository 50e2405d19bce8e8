use std::{collections::HashMap, sync::RwLock};

use anyhow::Context;
use axum::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

/// Schemaless JSON document storage, one namespace per collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of a collection in insertion order.
    async fn list(&self, collection: &str) -> anyhow::Result<Vec<Value>>;
    async fn find(&self, collection: &str, id: Uuid) -> anyhow::Result<Option<Value>>;
    async fn insert(&self, collection: &str, id: Uuid, body: &Value) -> anyhow::Result<()>;
    /// Returns false when no document with `id` exists; never inserts.
    async fn replace(&self, collection: &str, id: Uuid, body: &Value) -> anyhow::Result<bool>;
    /// Returns false when no document with `id` existed.
    async fn delete(&self, collection: &str, id: Uuid) -> anyhow::Result<bool>;
}

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")
}

#[derive(Clone)]
pub struct PgDocumentStore {
    db: PgPool,
}

impl PgDocumentStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn list(&self, collection: &str) -> anyhow::Result<Vec<Value>> {
        let rows = sqlx::query_as::<_, (Value,)>(
            r#"
            SELECT body
              FROM documents
             WHERE collection = $1
             ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(collection)
        .fetch_all(&self.db)
        .await
        .with_context(|| format!("list {}", collection))?;
        Ok(rows.into_iter().map(|(body,)| body).collect())
    }

    async fn find(&self, collection: &str, id: Uuid) -> anyhow::Result<Option<Value>> {
        let row = sqlx::query_as::<_, (Value,)>(
            r#"SELECT body FROM documents WHERE collection = $1 AND id = $2"#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("find {} {}", collection, id))?;
        Ok(row.map(|(body,)| body))
    }

    async fn insert(&self, collection: &str, id: Uuid, body: &Value) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, collection, body)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(id)
        .bind(collection)
        .bind(body)
        .execute(&self.db)
        .await
        .with_context(|| format!("insert {} {}", collection, id))?;
        Ok(())
    }

    async fn replace(&self, collection: &str, id: Uuid, body: &Value) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE documents
               SET body = $3, updated_at = now()
             WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(body)
        .execute(&self.db)
        .await
        .with_context(|| format!("replace {} {}", collection, id))?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete(&self, collection: &str, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(r#"DELETE FROM documents WHERE collection = $1 AND id = $2"#)
            .bind(collection)
            .bind(id)
            .execute(&self.db)
            .await
            .with_context(|| format!("delete {} {}", collection, id))?;
        Ok(res.rows_affected() > 0)
    }
}

/// In-process store used when no database is configured, and by tests.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<(Uuid, Value)>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
    ) -> anyhow::Result<std::sync::RwLockReadGuard<'_, HashMap<String, Vec<(Uuid, Value)>>>> {
        self.collections
            .read()
            .map_err(|_| anyhow::anyhow!("document store lock poisoned"))
    }

    fn write(
        &self,
    ) -> anyhow::Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Vec<(Uuid, Value)>>>> {
        self.collections
            .write()
            .map_err(|_| anyhow::anyhow!("document store lock poisoned"))
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list(&self, collection: &str) -> anyhow::Result<Vec<Value>> {
        Ok(self
            .read()?
            .get(collection)
            .map(|docs| docs.iter().map(|(_, body)| body.clone()).collect())
            .unwrap_or_default())
    }

    async fn find(&self, collection: &str, id: Uuid) -> anyhow::Result<Option<Value>> {
        Ok(self.read()?.get(collection).and_then(|docs| {
            docs.iter()
                .find(|(doc_id, _)| *doc_id == id)
                .map(|(_, body)| body.clone())
        }))
    }

    async fn insert(&self, collection: &str, id: Uuid, body: &Value) -> anyhow::Result<()> {
        let mut collections = self.write()?;
        let docs = collections.entry(collection.to_string()).or_default();
        anyhow::ensure!(
            docs.iter().all(|(doc_id, _)| *doc_id != id),
            "duplicate id {} in {}",
            id,
            collection
        );
        docs.push((id, body.clone()));
        Ok(())
    }

    async fn replace(&self, collection: &str, id: Uuid, body: &Value) -> anyhow::Result<bool> {
        let mut collections = self.write()?;
        let Some(slot) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|(doc_id, _)| *doc_id == id))
        else {
            return Ok(false);
        };
        slot.1 = body.clone();
        Ok(true)
    }

    async fn delete(&self, collection: &str, id: Uuid) -> anyhow::Result<bool> {
        let mut collections = self.write()?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|(doc_id, _)| *doc_id != id);
        Ok(docs.len() != before)
    }
}

/// Store doubles for exercising persistence failures.
#[cfg(test)]
pub mod fake {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    /// Delegates to a [`MemoryDocumentStore`]; writes fail once `fail_writes` is set.
    #[derive(Default)]
    pub struct FlakyDocumentStore {
        inner: MemoryDocumentStore,
        fail_writes: AtomicBool,
    }

    impl FlakyDocumentStore {
        pub fn fail_writes(&self) {
            self.fail_writes.store(true, Ordering::SeqCst);
        }

        fn check(&self) -> anyhow::Result<()> {
            anyhow::ensure!(!self.fail_writes.load(Ordering::SeqCst), "connection refused");
            Ok(())
        }
    }

    #[async_trait]
    impl DocumentStore for FlakyDocumentStore {
        async fn list(&self, collection: &str) -> anyhow::Result<Vec<Value>> {
            self.inner.list(collection).await
        }

        async fn find(&self, collection: &str, id: Uuid) -> anyhow::Result<Option<Value>> {
            self.inner.find(collection, id).await
        }

        async fn insert(&self, collection: &str, id: Uuid, body: &Value) -> anyhow::Result<()> {
            self.check()?;
            self.inner.insert(collection, id, body).await
        }

        async fn replace(&self, collection: &str, id: Uuid, body: &Value) -> anyhow::Result<bool> {
            self.check()?;
            self.inner.replace(collection, id, body).await
        }

        async fn delete(&self, collection: &str, id: Uuid) -> anyhow::Result<bool> {
            self.check()?;
            self.inner.delete(collection, id).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn memory_store_keeps_insertion_order_per_collection() {
        let store = MemoryDocumentStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        store.insert("skills", a, &json!({"name": "Rust"})).await.unwrap();
        store.insert("skills", b, &json!({"name": "Go"})).await.unwrap();
        store.insert("projects", Uuid::new_v4(), &json!({})).await.unwrap();

        let names: Vec<_> = store
            .list("skills")
            .await
            .unwrap()
            .into_iter()
            .map(|v| v["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Rust", "Go"]);
        assert!(store.list("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_never_upserts() {
        let store = MemoryDocumentStore::new();
        let id = Uuid::new_v4();
        assert!(!store.replace("skills", id, &json!({})).await.unwrap());
        assert!(store.find("skills", id).await.unwrap().is_none());

        store.insert("skills", id, &json!({"name": "Rust"})).await.unwrap();
        assert!(store.replace("skills", id, &json!({"name": "Zig"})).await.unwrap());
        assert_eq!(store.find("skills", id).await.unwrap().unwrap()["name"], "Zig");
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let store = MemoryDocumentStore::new();
        let id = Uuid::new_v4();
        store.insert("about", id, &json!({})).await.unwrap();
        assert!(store.delete("about", id).await.unwrap());
        assert!(!store.delete("about", id).await.unwrap());
        assert!(!store.delete("nothing", id).await.unwrap());
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_ids() {
        let store = MemoryDocumentStore::new();
        let id = Uuid::new_v4();
        store.insert("about", id, &json!({})).await.unwrap();
        assert!(store.insert("about", id, &json!({})).await.is_err());
    }
}
