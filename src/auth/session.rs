use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};

use super::{
    claims::{Role, TokenSubject},
    cookie::TOKEN_COOKIE,
    jwt::JwtKeys,
    repo_types::PublicCredential,
};
use crate::{errors::ApiError, state::AppState};

/// Caller identity attached to a request once its token checks out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Inline admin from an admin-claim token; never looked up.
    Admin { email: Option<String> },
    User(PublicCredential),
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        match self {
            Identity::Admin { .. } => true,
            Identity::User(user) => user.role == Role::Admin,
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Identity::Admin { email } => email.as_deref(),
            Identity::User(user) => Some(&user.email),
        }
    }
}

/// Cookie `token` first, then the second word of `Authorization`.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(TOKEN_COOKIE).filter(|c| !c.value().is_empty()) {
        return Some(cookie.value().to_string());
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_whitespace().nth(1))
        .map(str::to_string)
}

/// Resolves a raw token to an identity.
pub async fn authenticate(state: &AppState, token: &str) -> Result<Identity, ApiError> {
    let keys = JwtKeys::from_ref(state);
    let (claims, subject) = keys.verify(token).map_err(|e| {
        warn!(error = %e, "rejected session token");
        ApiError::Unauthenticated("Invalid token")
    })?;

    match subject {
        TokenSubject::Admin => Ok(Identity::Admin { email: claims.email }),
        TokenSubject::User(id) => {
            let user = state.credentials.find_public_by_id(id).await?;
            match user {
                Some(user) => Ok(Identity::User(user)),
                None => {
                    warn!(user_id = %id, "token subject no longer exists");
                    Err(ApiError::Unauthenticated("User not found"))
                }
            }
        }
    }
}

/// Any valid session. Rejects before the handler body runs.
#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(identity.clone());
        }
        let token =
            extract_token(&parts.headers).ok_or(ApiError::Unauthenticated("No token provided"))?;
        let identity = authenticate(state, &token).await?;
        debug!(admin = identity.is_admin(), "session resolved");
        parts.extensions.insert(identity.clone());
        Ok(identity)
    }
}

/// A valid session whose identity is an admin.
#[derive(Debug, Clone)]
pub struct AdminIdentity(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AdminIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let identity = Identity::from_request_parts(parts, state).await?;
        if !identity.is_admin() {
            warn!(email = ?identity.email(), "non-admin attempted a write");
            return Err(ApiError::Forbidden);
        }
        Ok(AdminIdentity(identity))
    }
}

/// No check at all; stands in for a guard on public routes.
#[derive(Debug, Clone, Copy)]
pub struct Public;

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Public {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(_parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Public)
    }
}
