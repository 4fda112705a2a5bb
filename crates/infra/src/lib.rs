//! Infrastructure layer: persistence backends, sessions, services, config.

pub mod accounts;
pub mod config;
pub mod error;
pub mod review_service;
pub mod seed;
pub mod session_store;
pub mod store;

pub use accounts::AuthService;
pub use config::{AppConfig, ConfigError, Environment};
pub use error::{ServiceError, ServiceResult};
pub use review_service::ReviewService;
pub use session_store::{InMemorySessionStore, SessionStore};
pub use store::{
    EmployeeStore, InMemoryDatabase, PostgresDatabase, ReviewStore, StoreError, StoreResult,
    UniqueField,
};
