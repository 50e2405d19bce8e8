use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::repo::{CredentialStore, MemoryCredentialStore, PgCredentialStore};
use crate::config::AppConfig;
use crate::db::{self, DocumentStore, MemoryDocumentStore, PgDocumentStore};
use crate::storage::{Storage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub documents: Arc<dyn DocumentStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let (documents, credentials): (Arc<dyn DocumentStore>, Arc<dyn CredentialStore>) =
            match config.database_url.as_deref() {
                Some(url) => {
                    let pool = db::connect(url).await?;
                    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
                        warn!(error = %e, "migration failed; continuing");
                    }
                    info!("using postgres document store");
                    (
                        Arc::new(PgDocumentStore::new(pool.clone())),
                        Arc::new(PgCredentialStore::new(pool)),
                    )
                }
                None => {
                    warn!("DATABASE_URL not set; content lives in memory and is lost on restart");
                    (
                        Arc::new(MemoryDocumentStore::new()),
                        Arc::new(MemoryCredentialStore::new()),
                    )
                }
            };

        let storage = Arc::new(Storage::new(&config.media).await?) as Arc<dyn StorageClient>;

        Ok(Self::from_parts(config, documents, credentials, storage))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        documents: Arc<dyn DocumentStore>,
        credentials: Arc<dyn CredentialStore>,
        storage: Arc<dyn StorageClient>,
    ) -> Self {
        Self {
            config,
            documents,
            credentials,
            storage,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with_storage(Arc::new(crate::storage::fake::FakeStorage::default()))
    }

    #[cfg(test)]
    pub fn fake_with_storage(storage: Arc<crate::storage::fake::FakeStorage>) -> Self {
        Self::fake_with(storage, Arc::new(MemoryDocumentStore::new()))
    }

    #[cfg(test)]
    pub fn fake_with(
        storage: Arc<crate::storage::fake::FakeStorage>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        use crate::auth::password::hash_password;
        use crate::config::{AdminConfig, JwtConfig, MediaConfig};
        use crate::test_support::{TEST_ADMIN_EMAIL, TEST_ADMIN_PASSWORD};

        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 60,
                leeway_seconds: 0,
            },
            admin: AdminConfig {
                email: Some(TEST_ADMIN_EMAIL.into()),
                password_hash: Some(hash_password(TEST_ADMIN_PASSWORD).unwrap()),
            },
            media: MediaConfig {
                endpoint: "http://fake".into(),
                bucket: "fake".into(),
                access_key: "fake".into(),
                secret_key: "fake".into(),
                region: "us-east-1".into(),
                public_base_url: "https://media.test/portfolio".into(),
                folder: "portfolio_uploads".into(),
            },
            cors_origins: vec!["http://localhost:5173".into()],
            cookie_secure: false,
            host: "127.0.0.1".into(),
            port: 0,
        });

        Self::from_parts(
            config,
            documents,
            Arc::new(MemoryCredentialStore::new()),
            storage,
        )
    }
}
