use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::{Claims, Role, TokenSubject};
use crate::{config::JwtConfig, state::AppState};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("token carries neither an admin role nor a subject")]
    NoSubject,
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
    pub leeway: u64,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(1) as u64) * 60),
            leeway: cfg.leeway_seconds,
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn issue(&self, subject: TokenSubject, email: Option<&str>) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let (role, sub) = match subject {
            TokenSubject::Admin => (Some(Role::Admin), None),
            TokenSubject::User(id) => (None, Some(id)),
        };
        let claims = Claims {
            role,
            sub,
            email: email.map(str::to_string),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(subject = ?subject, "jwt signed");
        Ok(token)
    }

    /// Checks signature, expiry (with leeway), issuer and audience.
    pub fn verify(&self, token: &str) -> Result<(Claims, TokenSubject), TokenError> {
        let mut validation = Validation::default();
        validation.leeway = self.leeway;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        let subject = data.claims.subject().ok_or(TokenError::NoSubject)?;
        debug!(subject = ?subject, "jwt verified");
        Ok((data.claims, subject))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::from(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 5,
            leeway_seconds: 0,
        })
    }

    #[test]
    fn admin_token_round_trips_without_subject_id() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let token = keys.issue(TokenSubject::Admin, Some("admin@x.com")).unwrap();
        let (claims, subject) = keys.verify(&token).expect("verify token");
        assert_eq!(subject, TokenSubject::Admin);
        assert_eq!(claims.role, Some(Role::Admin));
        assert_eq!(claims.sub, None);
        assert_eq!(claims.email.as_deref(), Some("admin@x.com"));
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[test]
    fn user_token_round_trips_subject_id() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let id = Uuid::new_v4();
        let token = keys.issue(TokenSubject::User(id), None).unwrap();
        let (claims, subject) = keys.verify(&token).unwrap();
        assert_eq!(subject, TokenSubject::User(id));
        assert_eq!(claims.role, None);
    }

    #[test]
    fn verify_rejects_other_secret() {
        let good = make_keys("secret-a", "iss", "aud");
        let rotated = make_keys("secret-b", "iss", "aud");
        let token = good.issue(TokenSubject::Admin, None).unwrap();
        assert!(matches!(rotated.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let bad = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good.issue(TokenSubject::Admin, None).unwrap();
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let claims = Claims {
            role: Some(Role::Admin),
            sub: None,
            email: None,
            iat: now - 7200,
            exp: now - 3600,
            iss: "iss".into(),
            aud: "aud".into(),
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();
        assert!(matches!(keys.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn verify_rejects_garbage_and_subjectless_tokens() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert!(keys.verify("not.a.jwt").is_err());

        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let claims = Claims {
            role: None,
            sub: None,
            email: None,
            iat: now,
            exp: now + 60,
            iss: "iss".into(),
            aud: "aud".into(),
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();
        assert!(matches!(keys.verify(&token), Err(TokenError::NoSubject)));
    }
}
