use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{form::FormInput, Resource};
use crate::errors::ApiError;

/// Public profile links and the hero typewriter words.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSetting {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    /// Comma separated.
    #[serde(default)]
    pub typewriter_words: Option<String>,
}

const FIELDS: [&str; 5] = ["name", "linkedin", "email", "github", "typewriterWords"];

impl AccountSetting {
    fn slot(&mut self, field: &str) -> Option<&mut Option<String>> {
        match field {
            "name" => Some(&mut self.name),
            "linkedin" => Some(&mut self.linkedin),
            "email" => Some(&mut self.email),
            "github" => Some(&mut self.github),
            "typewriterWords" => Some(&mut self.typewriter_words),
            _ => None,
        }
    }
}

impl Resource for AccountSetting {
    const COLLECTION: &'static str = "account_settings";
    const LABEL: &'static str = "AccountSetting";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_form(id: Uuid, form: &FormInput) -> Result<Self, ApiError> {
        let mut setting = Self {
            id,
            name: None,
            linkedin: None,
            email: None,
            github: None,
            typewriter_words: None,
        };
        setting.apply(form)?;
        Ok(setting)
    }

    fn apply(&mut self, form: &FormInput) -> Result<(), ApiError> {
        for field in FIELDS {
            if let Some(slot) = self.slot(field) {
                form.update_optional(field, slot);
            }
        }
        Ok(())
    }
}
