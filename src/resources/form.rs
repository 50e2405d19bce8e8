use std::collections::HashMap;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
};
use serde_json::Value;

use crate::{errors::ApiError, media::UploadItem};

/// Text fields plus attached files, from either a JSON or a multipart body.
#[derive(Debug, Default)]
pub struct FormInput {
    fields: HashMap<String, String>,
    files: Vec<(String, UploadItem)>,
}

/// Keeps the body limit's 413; every other body problem is a 400.
fn rejected(status: StatusCode, text: String) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(text)
    } else {
        ApiError::Validation(text)
    }
}

impl FormInput {
    pub fn from_json(value: Value) -> Result<Self, ApiError> {
        let Value::Object(map) = value else {
            return Err(ApiError::Validation("Expected a JSON object".into()));
        };
        let mut fields = HashMap::with_capacity(map.len());
        for (key, value) in map {
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                other => other.to_string(),
            };
            fields.insert(key, text);
        }
        Ok(Self { fields, files: Vec::new() })
    }

    /// Value of a field as sent, if it was sent at all.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.text(key), Some("true" | "1" | "on" | "yes"))
    }

    /// A field that must be present and non-empty.
    pub fn required(&self, key: &str) -> Result<String, ApiError> {
        match self.text(key) {
            Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
            _ => Err(ApiError::Validation(format!("{} is required", key))),
        }
    }

    /// An optional field; empty strings read as absent.
    pub fn optional(&self, key: &str) -> Option<String> {
        self.text(key)
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
    }

    /// Partial update of a required field: untouched when absent, rejected when emptied.
    pub fn update_required(&self, key: &str, target: &mut String) -> Result<(), ApiError> {
        if self.text(key).is_some() {
            *target = self.required(key)?;
        }
        Ok(())
    }

    /// Partial update of an optional field: an empty string clears it.
    pub fn update_optional(&self, key: &str, target: &mut Option<String>) {
        if self.text(key).is_some() {
            *target = self.optional(key);
        }
    }

    /// Removes and returns the first file sent under any of `names`.
    pub fn take_file(&mut self, names: &[&str]) -> Option<UploadItem> {
        let pos = self
            .files
            .iter()
            .position(|(field, _)| names.contains(&field.as_str()))?;
        Some(self.files.remove(pos).1)
    }

    async fn from_multipart(mut mp: Multipart) -> Result<Self, ApiError> {
        let mut form = FormInput::default();
        while let Some(field) = mp
            .next_field()
            .await
            .map_err(|e| rejected(e.status(), e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if let Some(file_name) = field.file_name().map(str::to_string) {
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".into());
                let body = field
                    .bytes()
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;
                // browsers send an empty part for an untouched file input
                if body.is_empty() && file_name.is_empty() {
                    continue;
                }
                form.files.push((
                    name,
                    UploadItem { file_name: Some(file_name), content_type, body },
                ));
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;
                form.fields.insert(name, text);
            }
        }
        Ok(form)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for FormInput {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, ApiError> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let mp = Multipart::from_request(req, state)
                .await
                .map_err(|e| rejected(e.status(), e.body_text()))?;
            return FormInput::from_multipart(mp).await;
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| rejected(e.status(), e.body_text()))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(FormInput::default());
        }
        if content_type.is_empty() || content_type.contains("json") {
            let value: Value = serde_json::from_slice(&body)
                .map_err(|e| ApiError::Validation(format!("Invalid JSON body: {}", e)))?;
            return FormInput::from_json(value);
        }
        Err(ApiError::Validation(format!("Unsupported content type {}", content_type)))
    }
}
