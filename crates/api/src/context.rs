use epm_auth::{Identity, SessionId};

pub const SESSION_COOKIE: &str = "epm_session";

/// Per-request session context, resolved from the signed cookie.
///
/// A verified cookie always yields `session_id`; `identity` is present only
/// when that id maps to a live session of an existing employee.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    session_id: Option<SessionId>,
    identity: Option<Identity>,
}

impl SessionContext {
    pub fn new(session_id: Option<SessionId>, identity: Option<Identity>) -> Self {
        Self {
            session_id,
            identity,
        }
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.identity
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}
