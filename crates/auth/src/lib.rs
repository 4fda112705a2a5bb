//! `epm-auth`: authentication and authorization boundary for employees.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod employee;
pub mod forms;
pub mod identity;
pub mod password;
pub mod policy;
pub mod session;

pub use employee::{Employee, NewEmployee};
pub use forms::{LoginForm, LoginRequest, RegistrationForm, RegistrationRequest};
pub use identity::Identity;
pub use password::{PasswordError, hash_password, verify_against_decoy, verify_password};
pub use policy::{AuthzError, ReviewAction, authorize, authorize_create, can_create, can_delete, can_edit, can_read};
pub use session::{
    Notice, NoticeLevel, Session, SessionError, SessionId, SessionSigner, validate_session,
};
