use anyhow::Context;
use uuid::Uuid;

use super::Resource;
use crate::db::DocumentStore;

pub async fn list<R: Resource>(store: &dyn DocumentStore) -> anyhow::Result<Vec<R>> {
    store
        .list(R::COLLECTION)
        .await?
        .into_iter()
        .map(|body| serde_json::from_value(body).context(R::COLLECTION))
        .collect()
}

pub async fn find<R: Resource>(store: &dyn DocumentStore, id: Uuid) -> anyhow::Result<Option<R>> {
    store
        .find(R::COLLECTION, id)
        .await?
        .map(|body| serde_json::from_value(body).context(R::COLLECTION))
        .transpose()
}

pub async fn insert<R: Resource>(store: &dyn DocumentStore, doc: &R) -> anyhow::Result<()> {
    let body = serde_json::to_value(doc).context(R::COLLECTION)?;
    store.insert(R::COLLECTION, doc.id(), &body).await
}

pub async fn replace<R: Resource>(store: &dyn DocumentStore, doc: &R) -> anyhow::Result<bool> {
    let body = serde_json::to_value(doc).context(R::COLLECTION)?;
    store.replace(R::COLLECTION, doc.id(), &body).await
}

pub async fn delete<R: Resource>(store: &dyn DocumentStore, id: Uuid) -> anyhow::Result<bool> {
    store.delete(R::COLLECTION, id).await
}
