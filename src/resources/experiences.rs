use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{form::FormInput, MediaSpec, Resource};
use crate::{errors::ApiError, media::StoredMedia};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub company_name: String,
    pub job_title: String,
    pub duration: String,
    pub location: String,
    pub description: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub public_id: Option<String>,
}

impl Resource for Experience {
    const COLLECTION: &'static str = "experiences";
    const LABEL: &'static str = "Experience";
    const MEDIA: Option<MediaSpec> = Some(MediaSpec {
        fields: &["logo"],
        route: "logo",
        remove_flag: "removeLogo",
        deleted_message: "Logo deleted successfully",
    });

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_form(id: Uuid, form: &FormInput) -> Result<Self, ApiError> {
        Ok(Self {
            id,
            company_name: form.required("companyName")?,
            job_title: form.required("jobTitle")?,
            duration: form.required("duration")?,
            location: form.required("location")?,
            description: form.required("description")?,
            logo: None,
            public_id: None,
        })
    }

    fn apply(&mut self, form: &FormInput) -> Result<(), ApiError> {
        form.update_required("companyName", &mut self.company_name)?;
        form.update_required("jobTitle", &mut self.job_title)?;
        form.update_required("duration", &mut self.duration)?;
        form.update_required("location", &mut self.location)?;
        form.update_required("description", &mut self.description)
    }

    fn media_asset(&self) -> Option<&str> {
        self.public_id.as_deref()
    }

    fn set_media(&mut self, media: Option<StoredMedia>) {
        let (url, asset) = media.map(|m| (m.url, m.asset_id)).unzip();
        self.logo = url;
        self.public_id = asset;
    }
}
