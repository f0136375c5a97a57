use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::debug;

use crate::config::{MAX_VIEW_SESSIONS, SESSION_IDLE_TTL_SECS};
use crate::models::dashboard::DashboardState;

struct SessionEntry {
    state: DashboardState,
    last_access: Instant,
}

impl SessionEntry {
    fn new(state: DashboardState) -> Self {
        SessionEntry {
            state,
            last_access: Instant::now(),
        }
    }
}

/// View sessions keyed by the id stored in the session cookie.
///
/// Sessions idle for longer than the TTL are evicted whenever a new one is
/// created, and the map never holds more than `capacity` entries; the least
/// recently used session goes first.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
    idle_ttl: Duration,
    capacity: usize,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self::with_limits(Duration::from_secs(SESSION_IDLE_TTL_SECS), MAX_VIEW_SESSIONS)
    }

    pub fn with_limits(idle_ttl: Duration, capacity: usize) -> Self {
        SessionManager {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_ttl,
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes room for one more session.
    fn evict(&self, sessions: &mut HashMap<String, SessionEntry>) {
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_access.elapsed() < self.idle_ttl);

        while sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                }
                None => break,
            }
        }

        if sessions.len() < before {
            debug!("Evicted {} view sessions", before - sessions.len());
        }
    }

    /// Snapshot of a session if it exists
    pub fn get(&self, session_id: &str) -> Option<DashboardState> {
        self.lock().get(session_id).map(|entry| entry.state.clone())
    }

    /// Runs `f` against the session, creating it with seed data when missing.
    /// The lock is released before returning, so callers must not await inside `f`.
    pub fn with_session<R>(&self, session_id: &str, f: impl FnOnce(&mut DashboardState) -> R) -> R {
        let mut sessions = self.lock();
        if !sessions.contains_key(session_id) {
            self.evict(&mut sessions);
        }
        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry::new(DashboardState::with_seed_data()));
        entry.last_access = Instant::now();
        f(&mut entry.state)
    }

    /// Like [`with_session`](Self::with_session) but never creates a session.
    pub fn with_existing<R>(&self, session_id: &str, f: impl FnOnce(&mut DashboardState) -> R) -> Option<R> {
        self.lock().get_mut(session_id).map(|entry| {
            entry.last_access = Instant::now();
            f(&mut entry.state)
        })
    }

    /// Read-only access. Unknown sessions see seed data without being stored.
    pub fn view<R>(&self, session_id: &str, f: impl FnOnce(&DashboardState) -> R) -> R {
        let mut sessions = self.lock();
        match sessions.get_mut(session_id) {
            Some(entry) => {
                entry.last_access = Instant::now();
                f(&entry.state)
            }
            None => f(&DashboardState::with_seed_data()),
        }
    }

    /// Applies `f` to every session; used on sign-out, when every view drops back to seed data.
    pub fn for_each(&self, mut f: impl FnMut(&mut DashboardState)) {
        for entry in self.lock().values_mut() {
            f(&mut entry.state);
        }
    }

    pub fn session_count(&self) -> usize {
        self.lock().len()
    }
}
