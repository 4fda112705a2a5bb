//! Authentication service: registration, login/logout, and resolving a
//! session cookie back into an [`Identity`].

use std::sync::Arc;

use chrono::{Duration, Utc};

use epm_auth::{
    Employee, Identity, LoginRequest, NewEmployee, Notice, RegistrationRequest, Session,
    SessionId, hash_password, validate_session, verify_against_decoy, verify_password,
};

use crate::error::{ServiceError, ServiceResult};
use crate::session_store::SessionStore;
use crate::store::EmployeeStore;

pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 720;
pub const DEFAULT_REMEMBER_TTL_DAYS: i64 = 30;

#[derive(Clone)]
pub struct AuthService {
    employees: Arc<dyn EmployeeStore>,
    sessions: Arc<dyn SessionStore>,
    session_ttl: Duration,
    remember_ttl: Duration,
}

impl AuthService {
    pub fn new(employees: Arc<dyn EmployeeStore>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            employees,
            sessions,
            session_ttl: Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
            remember_ttl: Duration::days(DEFAULT_REMEMBER_TTL_DAYS),
        }
    }

    pub fn with_ttls(mut self, session_ttl: Duration, remember_ttl: Duration) -> Self {
        self.session_ttl = session_ttl;
        self.remember_ttl = remember_ttl;
        self
    }

    /// Register a new, non-admin employee.
    ///
    /// Duplicate checks run in a fixed order (email, username, employee
    /// number) and nothing is written unless all of them pass.
    pub async fn register(&self, request: RegistrationRequest) -> ServiceResult<Employee> {
        let form = request.validate()?;

        if self.employees.find_by_email(&form.email).await?.is_some() {
            tracing::info!("registration rejected: email already registered");
            return Err(ServiceError::DuplicateEmail);
        }
        if self.employees.find_by_username(&form.username).await?.is_some() {
            tracing::info!(username = %form.username, "registration rejected: username taken");
            return Err(ServiceError::DuplicateUsername);
        }
        if self
            .employees
            .find_by_number(form.employee_number)
            .await?
            .is_some()
        {
            tracing::info!(
                employee_number = %form.employee_number,
                "registration rejected: employee number exists"
            );
            return Err(ServiceError::DuplicateEmployeeNumber);
        }

        let password_hash = hash_blocking(form.password).await?;
        let employee = self
            .employees
            .insert(NewEmployee {
                employee_number: form.employee_number,
                name: form.name,
                username: form.username,
                email: form.email,
                password_hash,
                is_admin: false,
            })
            .await?;

        tracing::info!(employee_number = %employee.employee_number, "employee registered");
        Ok(employee)
    }

    /// Verify credentials and open a new session.
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<Session> {
        let form = request.validate()?;

        let employee = self.employees.find_by_username(&form.username).await?;
        let verified = match &employee {
            Some(employee) => {
                verify_blocking(Some(employee.password_hash.clone()), form.password).await?
            }
            None => verify_blocking(None, form.password).await?,
        };

        let employee = match employee {
            Some(employee) if verified => employee,
            _ => {
                tracing::warn!(username = %form.username, "login failed");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let now = Utc::now();
        let ttl = if form.remember {
            self.remember_ttl
        } else {
            self.session_ttl
        };
        let purged = self.sessions.purge_expired(now);
        if purged > 0 {
            tracing::debug!(purged, "expired sessions purged");
        }

        let session = Session::issue(employee.employee_number, now, ttl, form.remember);
        self.sessions.insert(session.clone());

        tracing::info!(
            employee_number = %employee.employee_number,
            remember = form.remember,
            "login succeeded"
        );
        Ok(session)
    }

    /// End a session. Unknown or already-ended sessions are ignored.
    pub fn logout(&self, id: &SessionId) {
        if let Some(session) = self.sessions.get(id) {
            tracing::info!(employee_number = %session.employee_number, "logout");
        }
        self.sessions.remove(id);
    }

    /// Resolve a session id into the acting identity.
    ///
    /// `is_admin` is read from the current employee record, never cached on
    /// the session. Expired sessions and sessions whose employee no longer
    /// exists are dropped and resolve to `None`.
    pub async fn authenticate(&self, id: &SessionId) -> ServiceResult<Option<Identity>> {
        let Some(session) = self.sessions.get(id) else {
            return Ok(None);
        };

        if let Err(e) = validate_session(&session, Utc::now()) {
            tracing::debug!(reason = %e, "session rejected");
            self.sessions.remove(id);
            return Ok(None);
        }

        match self.employees.find_by_number(session.employee_number).await? {
            Some(employee) => Ok(Some(employee.identity())),
            None => {
                tracing::warn!(
                    employee_number = %session.employee_number,
                    "session refers to a missing employee"
                );
                self.sessions.remove(id);
                Ok(None)
            }
        }
    }

    pub fn notify(&self, id: &SessionId, notice: Notice) {
        self.sessions.push_notice(id, notice);
    }

    pub fn take_notices(&self, id: &SessionId) -> Vec<Notice> {
        self.sessions.take_notices(id)
    }
}

async fn hash_blocking(password: String) -> ServiceResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing task failed");
            ServiceError::Persistence
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            ServiceError::Persistence
        })
}

/// Argon2 verification off the async executor. With no stored hash the
/// decoy is verified instead and the result is always `false`.
async fn verify_blocking(stored_hash: Option<String>, password: String) -> ServiceResult<bool> {
    tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => verify_password(&hash, &password),
        None => {
            verify_against_decoy(&password);
            false
        }
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "password verification task failed");
        ServiceError::Persistence
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_store::InMemorySessionStore;
    use crate::store::InMemoryDatabase;
    use epm_core::EmployeeNumber;

    fn service() -> (AuthService, Arc<InMemoryDatabase>) {
        let db = Arc::new(InMemoryDatabase::new());
        let sessions = Arc::new(InMemorySessionStore::new());
        (AuthService::new(db.clone(), sessions), db)
    }

    fn registration(number: &str, email: &str, username: &str) -> RegistrationRequest {
        RegistrationRequest {
            name: "Jane Smith".to_string(),
            employee_number: number.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            password: "Password123!".to_string(),
        }
    }

    fn login(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
            remember: None,
        }
    }

    #[tokio::test]
    async fn registration_never_grants_admin() {
        let (auth, _db) = service();
        let employee = auth
            .register(registration("202", "jane@example.com", "janesmith202"))
            .await
            .unwrap();

        assert!(!employee.is_admin);
        assert!(employee.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn duplicate_email_leaves_first_registration_intact() {
        let (auth, db) = service();
        let first = auth
            .register(registration("202", "a@b.com", "janesmith202"))
            .await
            .unwrap();

        let err = auth
            .register(registration("303", "a@b.com", "samjones303x"))
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::DuplicateEmail);

        assert_eq!(db.count().await.unwrap(), 1);
        assert_eq!(
            db.find_by_number(EmployeeNumber::new(202)).await.unwrap(),
            Some(first)
        );
        assert_eq!(db.find_by_number(EmployeeNumber::new(303)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_username_and_number_are_rejected() {
        let (auth, db) = service();
        auth.register(registration("202", "jane@example.com", "janesmith202"))
            .await
            .unwrap();

        let err = auth
            .register(registration("303", "sam@example.com", "janesmith202"))
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::DuplicateUsername);

        let err = auth
            .register(registration("202", "sam@example.com", "samjones303x"))
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::DuplicateEmployeeNumber);

        assert_eq!(db.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn invalid_registration_is_reported_per_field() {
        let (auth, db) = service();
        let mut req = registration("202", "not-an-email", "short");
        req.password = "weak".to_string();

        let ServiceError::Validation(errors) = auth.register(req).await.unwrap_err() else {
            panic!("expected validation error");
        };
        assert!(errors.has_field("email"));
        assert!(errors.has_field("username"));
        assert!(errors.has_field("password"));
        assert_eq!(db.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn login_binds_session_to_the_stored_employee() {
        let (auth, _db) = service();
        auth.register(registration("202", "jane@example.com", "janesmith202"))
            .await
            .unwrap();

        let session = auth.login(login("janesmith202", "Password123!")).await.unwrap();
        assert_eq!(session.employee_number, EmployeeNumber::new(202));
        assert!(!session.remember);

        let identity = auth.authenticate(&session.id).await.unwrap().unwrap();
        assert_eq!(identity.employee_number(), EmployeeNumber::new(202));
        assert!(!identity.is_admin());
    }

    #[tokio::test]
    async fn remember_me_extends_the_session() {
        let (auth, _db) = service();
        auth.register(registration("202", "jane@example.com", "janesmith202"))
            .await
            .unwrap();

        let mut req = login("janesmith202", "Password123!");
        req.remember = Some("on".to_string());
        let session = auth.login(req).await.unwrap();

        assert!(session.remember);
        assert_eq!(
            session.expires_at - session.issued_at,
            Duration::days(DEFAULT_REMEMBER_TTL_DAYS)
        );
    }

    #[tokio::test]
    async fn wrong_password_or_unknown_user_opens_no_session() {
        let db = Arc::new(InMemoryDatabase::new());
        let sessions = Arc::new(InMemorySessionStore::new());
        let auth = AuthService::new(db, sessions.clone());
        auth.register(registration("202", "jane@example.com", "janesmith202"))
            .await
            .unwrap();

        assert_eq!(
            auth.login(login("janesmith202", "Password123?")).await.unwrap_err(),
            ServiceError::InvalidCredentials
        );
        assert_eq!(
            auth.login(login("nobodyhere1", "Password123!")).await.unwrap_err(),
            ServiceError::InvalidCredentials
        );
        assert_eq!(sessions.purge_expired(Utc::now() + Duration::days(365)), 0);
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let (auth, _db) = service();
        auth.register(registration("202", "jane@example.com", "janesmith202"))
            .await
            .unwrap();
        let session = auth.login(login("janesmith202", "Password123!")).await.unwrap();

        auth.logout(&session.id);
        auth.logout(&session.id);
        assert_eq!(auth.authenticate(&session.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn admin_flag_is_read_from_the_employee_record() {
        let (auth, db) = service();
        db.insert(NewEmployee {
            employee_number: EmployeeNumber::new(101),
            name: "John Doe".to_string(),
            username: "johndoe1234".to_string(),
            email: "john.doe@example.com".to_string(),
            password_hash: hash_password("Password123!").unwrap(),
            is_admin: true,
        })
        .await
        .unwrap();

        let session = auth.login(login("johndoe1234", "Password123!")).await.unwrap();
        let identity = auth.authenticate(&session.id).await.unwrap().unwrap();
        assert!(identity.is_admin());
    }

    #[tokio::test]
    async fn expired_sessions_do_not_authenticate() {
        let (auth, _db) = service();
        let auth = auth.with_ttls(Duration::zero(), Duration::zero());
        auth.register(registration("202", "jane@example.com", "janesmith202"))
            .await
            .unwrap();

        let session = auth.login(login("janesmith202", "Password123!")).await.unwrap();
        assert_eq!(auth.authenticate(&session.id).await.unwrap(), None);
        assert!(auth.sessions.get(&session.id).is_none());
    }
}
