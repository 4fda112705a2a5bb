use std::sync::Arc;

use thiserror::Error;

use epm_auth::{SessionError, SessionSigner};
use epm_infra::seed::populate_demo_data;
use epm_infra::{
    AppConfig, AuthService, EmployeeStore, InMemoryDatabase, InMemorySessionStore,
    PostgresDatabase, ReviewService, ReviewStore, StoreError,
};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("invalid session key: {0}")]
    SessionKey(#[from] SessionError),
}

/// Everything a handler needs, constructed once at startup.
#[derive(Clone)]
pub struct AppServices {
    pub auth: AuthService,
    pub reviews: ReviewService,
    pub signer: SessionSigner,
    /// Add `Secure` to cookies (anything but development).
    pub secure_cookies: bool,
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, StartupError> {
    let (employees, reviews): (Arc<dyn EmployeeStore>, Arc<dyn ReviewStore>) =
        match &config.database_url {
            Some(url) => {
                let db = Arc::new(PostgresDatabase::connect(url, config.max_db_connections).await?);
                tracing::info!("using postgres backend");
                let employees: Arc<dyn EmployeeStore> = db.clone();
                let reviews: Arc<dyn ReviewStore> = db;
                (employees, reviews)
            }
            None => {
                // In-memory infra wiring (dev/test).
                let db = Arc::new(InMemoryDatabase::new());
                tracing::info!("DATABASE_URL not set; using in-memory backend");
                let employees: Arc<dyn EmployeeStore> = db.clone();
                let reviews: Arc<dyn ReviewStore> = db;
                (employees, reviews)
            }
        };

    if config.seed_demo_data {
        populate_demo_data(employees.as_ref(), reviews.as_ref()).await?;
    }

    let sessions = Arc::new(InMemorySessionStore::new());
    let auth = AuthService::new(employees, sessions)
        .with_ttls(config.session_ttl, config.remember_ttl);

    Ok(AppServices {
        auth,
        reviews: ReviewService::new(reviews),
        signer: SessionSigner::new(config.secret_key.as_bytes())?,
        secure_cookies: !config.environment.is_development(),
    })
}
