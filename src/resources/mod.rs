//! CRUD collections behind `/api/<Resource>`.
//!
//! Every collection shares one set of generic handlers; a type opts into
//! media handling and public access through the associated constants of
//! [`Resource`].

mod about;
mod account_settings;
mod contact_messages;
mod experiences;
pub mod form;
pub mod handlers;
mod projects;
pub mod repo;
mod skills;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

pub use about::About;
pub use account_settings::AccountSetting;
pub use contact_messages::ContactMessage;
pub use experiences::Experience;
pub use projects::Project;
pub use skills::Skill;

use crate::{
    auth::session::{AdminIdentity, Public},
    errors::ApiError,
    media::StoredMedia,
    state::AppState,
};
use form::FormInput;
use handlers::{create, fetch, list, remove, remove_media, update};

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// How a collection accepts an attached image.
#[derive(Debug, Clone, Copy)]
pub struct MediaSpec {
    /// Multipart field names that carry the file.
    pub fields: &'static [&'static str],
    /// Last path segment of the media-only delete route.
    pub route: &'static str,
    /// Update flag that clears the media without a replacement.
    pub remove_flag: &'static str,
    pub deleted_message: &'static str,
}

pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: &'static str;
    /// Used in client-facing messages.
    const LABEL: &'static str;
    const MEDIA: Option<MediaSpec> = None;
    const PUBLIC_READ: bool = true;
    const PUBLIC_CREATE: bool = false;

    fn id(&self) -> Uuid;

    /// Builds a new document, rejecting missing required fields.
    fn from_form(id: Uuid, form: &FormInput) -> Result<Self, ApiError>;

    /// Applies only the fields present in `form`, from a fixed allow-list.
    fn apply(&mut self, form: &FormInput) -> Result<(), ApiError>;

    fn media_asset(&self) -> Option<&str> {
        None
    }

    fn set_media(&mut self, _media: Option<StoredMedia>) {}

    /// Listing order; storage order by default.
    fn sort(_docs: &mut [Self]) {}
}

pub fn collection_routes<R: Resource>() -> Router<AppState> {
    let (list_route, fetch_route) = if R::PUBLIC_READ {
        (get(list::<R, Public>), get(fetch::<R, Public>))
    } else {
        (get(list::<R, AdminIdentity>), get(fetch::<R, AdminIdentity>))
    };
    let create_route = if R::PUBLIC_CREATE {
        post(create::<R, Public>)
    } else {
        post(create::<R, AdminIdentity>)
    };

    let router = Router::new()
        .route("/", list_route)
        .route("/", create_route)
        .route("/:id", fetch_route.put(update::<R>).delete(remove::<R>));

    match R::MEDIA {
        Some(spec) => router.route(&format!("/:id/{}", spec.route), delete(remove_media::<R>)),
        None => router,
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/AboutMe", collection_routes::<About>())
        .nest("/Experiences", collection_routes::<Experience>())
        .nest("/Projects", collection_routes::<Project>())
        .nest("/Skills", collection_routes::<Skill>())
        .nest("/ContactMessages", collection_routes::<ContactMessage>())
        .nest("/AccountSettings", collection_routes::<AccountSetting>())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
