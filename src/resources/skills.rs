use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{form::FormInput, MediaSpec, Resource};
use crate::{errors::ApiError, media::StoredMedia};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub category: String,
    pub name: String,
    /// Name of a bundled icon, used when no logo was uploaded.
    #[serde(default)]
    pub icon_name: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub public_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Resource for Skill {
    const COLLECTION: &'static str = "skills";
    const LABEL: &'static str = "Skill";
    // the dashboard posts the file as `icon`, older clients as `logo`
    const MEDIA: Option<MediaSpec> = Some(MediaSpec {
        fields: &["logo", "icon"],
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
            category: form.required("category")?,
            name: form.required("name")?,
            icon_name: form.optional("iconName"),
            logo_url: None,
            public_id: None,
            created_at: OffsetDateTime::now_utc(),
        })
    }

    fn apply(&mut self, form: &FormInput) -> Result<(), ApiError> {
        form.update_required("category", &mut self.category)?;
        form.update_required("name", &mut self.name)?;
        form.update_optional("iconName", &mut self.icon_name);
        Ok(())
    }

    fn media_asset(&self) -> Option<&str> {
        self.public_id.as_deref()
    }

    fn set_media(&mut self, media: Option<StoredMedia>) {
        let (url, asset) = media.map(|m| (m.url, m.asset_id)).unzip();
        self.logo_url = url;
        self.public_id = asset;
    }
}
