use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{form::FormInput, Resource};
use crate::{auth::handlers::is_valid_email, errors::ApiError};

/// Message left by a site visitor through the public contact form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub received_at: OffsetDateTime,
}

fn check_email(email: &Option<String>) -> Result<(), ApiError> {
    match email {
        Some(e) if !is_valid_email(e.trim()) => Err(ApiError::Validation("Invalid email".into())),
        _ => Ok(()),
    }
}

impl Resource for ContactMessage {
    const COLLECTION: &'static str = "contact_messages";
    const LABEL: &'static str = "Message";
    const PUBLIC_READ: bool = false;
    const PUBLIC_CREATE: bool = true;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_form(id: Uuid, form: &FormInput) -> Result<Self, ApiError> {
        let email = form.optional("email");
        check_email(&email)?;
        Ok(Self {
            id,
            name: form.optional("name"),
            email,
            subject: form.optional("subject"),
            message: form.optional("message"),
            received_at: OffsetDateTime::now_utc(),
        })
    }

    fn apply(&mut self, form: &FormInput) -> Result<(), ApiError> {
        let mut email = self.email.clone();
        form.update_optional("email", &mut email);
        check_email(&email)?;
        self.email = email;
        form.update_optional("name", &mut self.name);
        form.update_optional("subject", &mut self.subject);
        form.update_optional("message", &mut self.message);
        Ok(())
    }

    /// Newest first; among equal timestamps the later insert wins.
    fn sort(docs: &mut [Self]) {
        docs.reverse();
        docs.sort_by(|a, b| b.received_at.cmp(&a.received_at));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::Duration;

    fn message(name: &str, received_at: OffsetDateTime) -> ContactMessage {
        ContactMessage {
            id: Uuid::new_v4(),
            name: Some(name.into()),
            email: None,
            subject: None,
            message: None,
            received_at,
        }
    }

    #[test]
    fn sorts_newest_first() {
        let now = OffsetDateTime::now_utc();
        let mut docs = vec![
            message("old", now - Duration::days(2)),
            message("new", now),
            message("mid", now - Duration::days(1)),
        ];
        ContactMessage::sort(&mut docs);
        let names: Vec<_> = docs.iter().map(|d| d.name.as_deref().unwrap()).collect();
        assert_eq!(names, vec!["new", "mid", "old"]);
    }

    #[test]
    fn malformed_email_is_rejected() {
        let form = FormInput::from_json(json!({"email": "nope", "message": "hi"})).unwrap();
        assert!(matches!(
            ContactMessage::from_form(Uuid::new_v4(), &form),
            Err(ApiError::Validation(_))
        ));
    }
}
