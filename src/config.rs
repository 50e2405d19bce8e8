use anyhow::Context;
use serde::Deserialize;

const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:3000,http://localhost:5173,https://prishaswaroop.netlify.app";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub leeway_seconds: u64,
}

/// Bootstrap admin that can log in without a credential row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl AdminConfig {
    /// Both halves must be present for the bootstrap login to be enabled.
    pub fn enabled(&self) -> Option<(&str, &str)> {
        match (self.email.as_deref(), self.password_hash.as_deref()) {
            (Some(email), Some(hash)) if !email.is_empty() && !hash.is_empty() => {
                Some((email, hash))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub public_base_url: String,
    pub folder: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    pub media: MediaConfig,
    pub cors_origins: Vec<String>,
    pub cookie_secure: bool,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = optional("DATABASE_URL");
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "portfolio-cms".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "portfolio-admin".into()),
            ttl_minutes: parsed("JWT_TTL_MINUTES").unwrap_or(60 * 24),
            leeway_seconds: parsed("JWT_LEEWAY_SECONDS").unwrap_or(30),
        };
        let admin = AdminConfig {
            email: optional("ADMIN_EMAIL").map(|e| e.trim().to_lowercase()),
            password_hash: optional("ADMIN_PASSWORD_HASH"),
        };

        let endpoint = std::env::var("MEDIA_ENDPOINT").context("MEDIA_ENDPOINT must be set")?;
        let bucket = std::env::var("MEDIA_BUCKET").context("MEDIA_BUCKET must be set")?;
        let public_base_url = optional("MEDIA_PUBLIC_URL")
            .unwrap_or_else(|| format!("{}/{}", endpoint.trim_end_matches('/'), bucket));
        let media = MediaConfig {
            access_key: std::env::var("MEDIA_ACCESS_KEY").context("MEDIA_ACCESS_KEY must be set")?,
            secret_key: std::env::var("MEDIA_SECRET_KEY").context("MEDIA_SECRET_KEY must be set")?,
            region: std::env::var("MEDIA_REGION").unwrap_or_else(|_| "us-east-1".into()),
            folder: std::env::var("MEDIA_FOLDER").unwrap_or_else(|_| "portfolio_uploads".into()),
            public_base_url,
            endpoint,
            bucket,
        };

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.into()),
        );
        let cookie_secure = std::env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        Ok(Self {
            database_url,
            jwt,
            admin,
            media,
            cors_origins,
            cookie_secure,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parsed("APP_PORT").unwrap_or(5000),
        })
    }
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

pub(crate) fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_origins_trims_and_drops_empty_entries() {
        let origins = parse_origins(" http://a.test/ ,,https://b.test ");
        assert_eq!(origins, vec!["http://a.test", "https://b.test"]);
    }

    #[test]
    fn default_origins_cover_local_dev_and_site() {
        let origins = parse_origins(DEFAULT_CORS_ORIGINS);
        assert_eq!(origins.len(), 3);
        assert!(origins.contains(&"http://localhost:5173".to_string()));
    }

    #[test]
    fn admin_login_requires_email_and_hash() {
        let mut admin = AdminConfig::default();
        assert!(admin.enabled().is_none());
        admin.email = Some("admin@x.com".into());
        assert!(admin.enabled().is_none());
        admin.password_hash = Some("$argon2id$...".into());
        assert_eq!(admin.enabled().map(|(e, _)| e), Some("admin@x.com"));
    }
}
