use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};

use epm_auth::{Notice, Session, SessionId};

/// How long notices addressed to a visitor without a session are kept.
const ORPHAN_NOTICE_TTL_MINUTES: i64 = 10;

/// Server-side session records plus their pending one-shot notices.
///
/// Notices are keyed by session id and may exist without a session, so a
/// visitor who was just logged out (or just registered) can still be shown
/// a message on the next page.
pub trait SessionStore: Send + Sync {
    fn insert(&self, session: Session);
    fn get(&self, id: &SessionId) -> Option<Session>;
    /// Drop the session and its notices. Removing an unknown id is a no-op.
    fn remove(&self, id: &SessionId);
    fn push_notice(&self, id: &SessionId, notice: Notice);
    /// Drain pending notices in the order they were pushed.
    fn take_notices(&self, id: &SessionId) -> Vec<Notice>;
    /// Remove expired sessions and stale orphan notices; returns how many
    /// entries were dropped.
    fn purge_expired(&self, now: DateTime<Utc>) -> usize;
}

#[derive(Debug)]
struct Slot {
    session: Option<Session>,
    notices: Vec<Notice>,
    touched_at: DateTime<Utc>,
}

impl Slot {
    fn empty(now: DateTime<Utc>) -> Self {
        Self {
            session: None,
            notices: Vec::new(),
            touched_at: now,
        }
    }

    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match &self.session {
            Some(session) => session.expires_at <= now,
            None => self.touched_at + Duration::minutes(ORPHAN_NOTICE_TTL_MINUTES) <= now,
        }
    }
}

/// In-memory session store for a single process.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    inner: RwLock<HashMap<SessionId, Slot>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, session: Session) {
        if let Ok(mut map) = self.inner.write() {
            let slot = map
                .entry(session.id.clone())
                .or_insert_with(|| Slot::empty(session.issued_at));
            slot.touched_at = session.issued_at;
            slot.session = Some(session);
        }
    }

    fn get(&self, id: &SessionId) -> Option<Session> {
        let map = self.inner.read().ok()?;
        map.get(id).and_then(|slot| slot.session.clone())
    }

    fn remove(&self, id: &SessionId) {
        if let Ok(mut map) = self.inner.write() {
            map.remove(id);
        }
    }

    fn push_notice(&self, id: &SessionId, notice: Notice) {
        let now = Utc::now();
        if let Ok(mut map) = self.inner.write() {
            let slot = map.entry(id.clone()).or_insert_with(|| Slot::empty(now));
            slot.touched_at = now;
            slot.notices.push(notice);
        }
    }

    fn take_notices(&self, id: &SessionId) -> Vec<Notice> {
        let mut map = match self.inner.write() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        let Some(slot) = map.get_mut(id) else {
            return vec![];
        };
        let notices = std::mem::take(&mut slot.notices);
        if slot.session.is_none() {
            map.remove(id);
        }
        notices
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let Ok(mut map) = self.inner.write() else {
            return 0;
        };
        let before = map.len();
        map.retain(|_id, slot| !slot.is_stale(now));
        before - map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epm_core::EmployeeNumber;

    fn session(now: DateTime<Utc>, ttl: Duration) -> Session {
        Session::issue(EmployeeNumber::new(202), now, ttl, false)
    }

    #[test]
    fn insert_get_remove() {
        let store = InMemorySessionStore::new();
        let s = session(Utc::now(), Duration::minutes(5));
        let id = s.id.clone();

        store.insert(s.clone());
        assert_eq!(store.get(&id), Some(s));

        store.remove(&id);
        assert_eq!(store.get(&id), None);
        // Idempotent.
        store.remove(&id);
    }

    #[test]
    fn notices_are_drained_once_in_order() {
        let store = InMemorySessionStore::new();
        let s = session(Utc::now(), Duration::minutes(5));
        let id = s.id.clone();
        store.insert(s);

        store.push_notice(&id, Notice::success("Review created!"));
        store.push_notice(&id, Notice::info("Second"));

        let notices = store.take_notices(&id);
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].message, "Review created!");
        assert!(store.take_notices(&id).is_empty());
        assert!(store.get(&id).is_some());
    }

    #[test]
    fn notices_can_be_addressed_to_a_visitor_without_session() {
        let store = InMemorySessionStore::new();
        let visitor = SessionId::generate();

        store.push_notice(&visitor, Notice::info("You have been logged out."));
        assert_eq!(store.get(&visitor), None);
        assert_eq!(store.take_notices(&visitor).len(), 1);
        assert!(store.take_notices(&visitor).is_empty());
    }

    #[test]
    fn purge_drops_only_expired_sessions() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        let live = session(now, Duration::minutes(30));
        let dead = session(now - Duration::minutes(10), Duration::minutes(5));
        store.insert(live.clone());
        store.insert(dead.clone());

        assert_eq!(store.purge_expired(now), 1);
        assert!(store.get(&live.id).is_some());
        assert!(store.get(&dead.id).is_none());
    }

    #[test]
    fn purge_drops_stale_orphan_notices() {
        let store = InMemorySessionStore::new();
        let visitor = SessionId::generate();
        store.push_notice(&visitor, Notice::danger("stale"));

        let later = Utc::now() + Duration::minutes(ORPHAN_NOTICE_TTL_MINUTES + 1);
        assert_eq!(store.purge_expired(later), 1);
        assert!(store.take_notices(&visitor).is_empty());
    }
}
