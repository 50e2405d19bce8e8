use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{form::FormInput, repo, Resource};
use crate::{
    auth::{dto::MessageResponse, session::AdminIdentity},
    errors::ApiError,
    media,
    state::AppState,
};

fn not_found<R: Resource>() -> ApiError {
    ApiError::NotFound(format!("{} not found", R::LABEL))
}

/// Malformed ids can never match a document.
fn parse_id<R: Resource>(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| not_found::<R>())
}

#[instrument(skip_all, fields(collection = R::COLLECTION))]
pub async fn list<R: Resource, G>(
    State(state): State<AppState>,
    _guard: G,
) -> Result<Json<Vec<R>>, ApiError> {
    let mut docs = repo::list::<R>(state.documents.as_ref()).await?;
    R::sort(&mut docs);
    Ok(Json(docs))
}

#[instrument(skip_all, fields(collection = R::COLLECTION, id = %raw_id))]
pub async fn fetch<R: Resource, G>(
    State(state): State<AppState>,
    _guard: G,
    Path(raw_id): Path<String>,
) -> Result<Json<R>, ApiError> {
    let id = parse_id::<R>(&raw_id)?;
    let doc = repo::find::<R>(state.documents.as_ref(), id)
        .await?
        .ok_or_else(not_found::<R>)?;
    Ok(Json(doc))
}

/// Upload first, then persist; a failed persist discards the fresh upload.
#[instrument(skip_all, fields(collection = R::COLLECTION))]
pub async fn create<R: Resource, G>(
    State(state): State<AppState>,
    _guard: G,
    mut form: FormInput,
) -> Result<(StatusCode, Json<R>), ApiError> {
    let mut doc = R::from_form(Uuid::new_v4(), &form)?;

    let file = R::MEDIA.and_then(|spec| form.take_file(spec.fields));
    let uploaded = match file {
        Some(item) => Some(media::upload(&state, item).await?),
        None => None,
    };
    if let Some(stored) = &uploaded {
        doc.set_media(Some(stored.clone()));
    }

    if let Err(e) = repo::insert(state.documents.as_ref(), &doc).await {
        if let Some(stored) = uploaded {
            media::discard(&state, &stored.asset_id).await;
        }
        return Err(e.into());
    }

    info!(id = %doc.id(), "document created");
    Ok((StatusCode::CREATED, Json(doc)))
}

/// Partial update. A replaced or removed asset is discarded only after the
/// new state is persisted.
#[instrument(skip_all, fields(collection = R::COLLECTION, id = %raw_id))]
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    _admin: AdminIdentity,
    Path(raw_id): Path<String>,
    mut form: FormInput,
) -> Result<Json<R>, ApiError> {
    let id = parse_id::<R>(&raw_id)?;
    let mut doc = repo::find::<R>(state.documents.as_ref(), id)
        .await?
        .ok_or_else(not_found::<R>)?;
    doc.apply(&form)?;

    let previous = doc.media_asset().map(str::to_string);
    let mut uploaded = None;
    let mut superseded = None;
    if let Some(spec) = R::MEDIA {
        if let Some(item) = form.take_file(spec.fields) {
            let stored = media::upload(&state, item).await?;
            uploaded = Some(stored.asset_id.clone());
            doc.set_media(Some(stored));
            superseded = previous;
        } else if form.flag(spec.remove_flag) {
            doc.set_media(None);
            superseded = previous;
        }
    }

    let persisted = repo::replace(state.documents.as_ref(), &doc).await;
    if !matches!(persisted, Ok(true)) {
        if let Some(asset) = &uploaded {
            media::discard(&state, asset).await;
        }
    }
    match persisted {
        Ok(true) => {}
        // removed between our read and write
        Ok(false) => return Err(not_found::<R>()),
        Err(e) => return Err(e.into()),
    }

    if let Some(asset) = superseded {
        media::discard(&state, &asset).await;
    }
    info!("document updated");
    Ok(Json(doc))
}

/// Idempotent: deleting a missing document still succeeds.
#[instrument(skip_all, fields(collection = R::COLLECTION, id = %raw_id))]
pub async fn remove<R: Resource>(
    State(state): State<AppState>,
    _admin: AdminIdentity,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = MessageResponse::new(format!("{} deleted", R::LABEL));
    let Ok(id) = Uuid::parse_str(&raw_id) else {
        return Ok(Json(message));
    };
    let Some(doc) = repo::find::<R>(state.documents.as_ref(), id).await? else {
        warn!("delete of missing document");
        return Ok(Json(message));
    };

    if let Some(asset) = doc.media_asset() {
        media::discard(&state, asset).await;
    }
    repo::delete::<R>(state.documents.as_ref(), id).await?;
    info!("document deleted");
    Ok(Json(message))
}

/// Clears the media fields, leaving the rest of the document intact.
#[instrument(skip_all, fields(collection = R::COLLECTION, id = %raw_id))]
pub async fn remove_media<R: Resource>(
    State(state): State<AppState>,
    _admin: AdminIdentity,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let spec = R::MEDIA.ok_or_else(not_found::<R>)?;
    let id = parse_id::<R>(&raw_id)?;
    let mut doc = repo::find::<R>(state.documents.as_ref(), id)
        .await?
        .ok_or_else(not_found::<R>)?;

    let previous = doc.media_asset().map(str::to_string);
    doc.set_media(None);
    if !repo::replace(state.documents.as_ref(), &doc).await? {
        return Err(not_found::<R>());
    }
    if let Some(asset) = previous {
        media::discard(&state, &asset).await;
    }
    Ok(Json(MessageResponse::new(spec.deleted_message)))
}
