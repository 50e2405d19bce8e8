use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        claims::{Role, TokenSubject},
        cookie::{cleared_cookie, session_cookie},
        dto::{AuthResponse, Credentials, MessageResponse},
        jwt::JwtKeys,
        password::{hash_password, verify_against_dummy, verify_password},
        session::Identity,
    },
    errors::ApiError,
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/Auth", post(login))
        .route("/Auth/login", post(login))
        .route("/Auth/register", post(register))
        .route("/Auth/logout", post(logout))
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/Dashboard", get(dashboard))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthenticated("Invalid credentials")
}

fn parse_body(payload: Result<Json<Credentials>, JsonRejection>) -> Result<Credentials, ApiError> {
    let Json(mut body) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    body.email = body.email.trim().to_lowercase();
    Ok(body)
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let body = parse_body(payload)?;
    if body.email.is_empty() || body.password.is_empty() {
        return Err(invalid_credentials());
    }

    let subject = match state.config.admin.enabled() {
        Some((admin_email, admin_hash)) if admin_email == body.email => {
            let ok = verify_password(&body.password, admin_hash).map_err(|e| {
                error!(error = %e, "ADMIN_PASSWORD_HASH is not a valid argon2 hash");
                ApiError::Persistence(e.into())
            })?;
            if !ok {
                warn!(email = %body.email, "admin login invalid password");
                return Err(invalid_credentials());
            }
            TokenSubject::Admin
        }
        _ => {
            let Some(user) = state.credentials.find_by_email(&body.email).await? else {
                verify_against_dummy(&body.password);
                warn!(email = %body.email, "login unknown email");
                return Err(invalid_credentials());
            };
            let ok = verify_password(&body.password, &user.password_hash)
                .map_err(|e| ApiError::Persistence(e.into()))?;
            if !ok {
                warn!(email = %body.email, user_id = %user.id, "login invalid password");
                return Err(invalid_credentials());
            }
            match user.role {
                Role::Admin => TokenSubject::Admin,
                Role::User => TokenSubject::User(user.id),
            }
        }
    };

    let token = JwtKeys::from_ref(&state).issue(subject, Some(&body.email))?;
    info!(email = %body.email, subject = ?subject, "logged in");
    let jar = jar.add(session_cookie(token.clone(), state.config.cookie_secure));
    Ok((jar, Json(AuthResponse { token, email: body.email })))
}

#[instrument(skip(state, jar, payload))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    let body = parse_body(payload)?;
    if !is_valid_email(&body.email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if body.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation("Password too short".into()));
    }

    let hash = hash_password(&body.password).map_err(|e| ApiError::Persistence(e.into()))?;
    let user = state
        .credentials
        .create(&body.email, &hash, Role::User)
        .await?
        .ok_or_else(|| {
            warn!(email = %body.email, "email already registered");
            ApiError::Conflict("Email already registered".into())
        })?;

    let token = JwtKeys::from_ref(&state).issue(TokenSubject::User(user.id), Some(&user.email))?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    let jar = jar.add(session_cookie(token.clone(), state.config.cookie_secure));
    Ok((StatusCode::CREATED, jar, Json(AuthResponse { token, email: user.email })))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.add(cleared_cookie(state.config.cookie_secure));
    (jar, Json(MessageResponse::new("Logged out")))
}

#[instrument(skip_all)]
pub async fn dashboard(identity: Identity) -> Json<MessageResponse> {
    let email = identity.email().unwrap_or("admin");
    Json(MessageResponse::new(format!("Welcome {}", email)))
}
