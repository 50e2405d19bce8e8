use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::{errors::ApiError, state::AppState};

const RETRY_DELAY: Duration = Duration::from_millis(250);

/// A binary received from a client, not yet stored anywhere.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub file_name: Option<String>,
    pub content_type: String,
    pub body: Bytes,
}

/// Durable location of an uploaded asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMedia {
    pub url: String,
    pub asset_id: String,
}

/// Uploads one file to the media host, retrying a failed put once.
pub async fn upload(st: &AppState, item: UploadItem) -> Result<StoredMedia, ApiError> {
    let ext = detect_ext(&item.content_type, item.file_name.as_deref()).ok_or_else(|| {
        ApiError::Validation("Only jpg, jpeg, png and webp images are allowed".into())
    })?;
    let content_type = mime_for(ext);
    if item.body.is_empty() {
        return Err(ApiError::Validation("Uploaded file is empty".into()));
    }

    let cfg = &st.config.media;
    let key = object_key(&cfg.folder, item.file_name.as_deref(), ext);

    let first = st
        .storage
        .put_object(&key, item.body.clone(), content_type)
        .await;
    if let Err(e) = first {
        warn!(error = %e, %key, "put_object failed, retrying once");
        tokio::time::sleep(RETRY_DELAY).await;
        st.storage
            .put_object(&key, item.body, content_type)
            .await
            .with_context(|| format!("put_object {}", key))
            .map_err(ApiError::Upload)?;
    }

    info!(%key, "media uploaded");
    Ok(StoredMedia {
        url: format!("{}/{}", cfg.public_base_url.trim_end_matches('/'), key),
        asset_id: key,
    })
}

/// Best-effort removal; failures are logged and otherwise ignored.
pub async fn discard(st: &AppState, asset_id: &str) {
    match st.storage.delete_object(asset_id).await {
        Ok(()) => debug!(%asset_id, "media deleted"),
        Err(e) => warn!(error = %e, %asset_id, "media delete failed, asset left orphaned"),
    }
}

fn object_key(folder: &str, file_name: Option<&str>, ext: &str) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let stem = file_name
        .and_then(|n| n.rsplit(['/', '\\']).next())
        .map(|n| n.split('.').next().unwrap_or(n))
        .map(sanitize)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "upload".into());
    format!("{}/{}-{}.{}", folder.trim_matches('/'), millis, stem, ext)
}

fn sanitize(stem: &str) -> String {
    stem.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// The declared type decides; the file name only counts for untyped parts.
fn detect_ext(content_type: &str, file_name: Option<&str>) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "" | "application/octet-stream" => file_name.and_then(ext_from_name),
        declared => ext_from_mime(declared),
    }
}

fn mime_for(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

fn ext_from_name(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("jpg"),
        "png" => Some("png"),
        "webp" => Some("webp"),
        _ => None,
    }
}
