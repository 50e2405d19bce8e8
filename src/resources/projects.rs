use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{form::FormInput, Resource};
use crate::errors::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub github_link: Option<String>,
    #[serde(default)]
    pub website_link: Option<String>,
    pub languages_used: String,
}

impl Resource for Project {
    const COLLECTION: &'static str = "projects";
    const LABEL: &'static str = "Project";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_form(id: Uuid, form: &FormInput) -> Result<Self, ApiError> {
        Ok(Self {
            id,
            title: form.required("title")?,
            description: form.required("description")?,
            github_link: form.optional("githubLink"),
            website_link: form.optional("websiteLink"),
            languages_used: form.required("languagesUsed")?,
        })
    }

    fn apply(&mut self, form: &FormInput) -> Result<(), ApiError> {
        form.update_required("title", &mut self.title)?;
        form.update_required("description", &mut self.description)?;
        form.update_optional("githubLink", &mut self.github_link);
        form.update_optional("websiteLink", &mut self.website_link);
        form.update_required("languagesUsed", &mut self.languages_used)
    }
}
