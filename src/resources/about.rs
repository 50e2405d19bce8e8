use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{form::FormInput, MediaSpec, Resource};
use crate::{errors::ApiError, media::StoredMedia};

/// The "About Me" blurb and profile photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct About {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub text: String,
    /// Public URL of the profile photo.
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub public_id: Option<String>,
}

impl Resource for About {
    const COLLECTION: &'static str = "about";
    const LABEL: &'static str = "AboutMe";
    const MEDIA: Option<MediaSpec> = Some(MediaSpec {
        fields: &["photo"],
        route: "photo",
        remove_flag: "removePhoto",
        deleted_message: "Profile photo deleted",
    });

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_form(id: Uuid, form: &FormInput) -> Result<Self, ApiError> {
        Ok(Self {
            id,
            text: form.required("text")?,
            logo: None,
            public_id: None,
        })
    }

    fn apply(&mut self, form: &FormInput) -> Result<(), ApiError> {
        form.update_required("text", &mut self.text)
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
