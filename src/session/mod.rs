//! In-memory session store.
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

use crate::log::debug;

#[cfg(test)]
mod test;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE_NAME: &str = "SESSIONID";

/// Name of the path parameter carrying the session id, e.g:
/// `/cart;sessionid=abc`.
pub const SESSION_URL_PARAMETER: &str = "sessionid";

fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

// ===== Session =====

/// A single client session.
///
/// Attribute values are shared, typed access goes through
/// [`attribute`](Session::attribute) with a downcast.
pub struct Session {
    id: String,
    created: SystemTime,
    last_accessed: AtomicU64,
    timeout_secs: AtomicU64,
    is_new: AtomicBool,
    attributes: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl Session {
    fn new(id: String, timeout: Duration) -> Session {
        Session {
            id,
            created: SystemTime::now(),
            last_accessed: AtomicU64::new(unix_millis(SystemTime::now())),
            timeout_secs: AtomicU64::new(timeout.as_secs()),
            is_new: AtomicBool::new(true),
            attributes: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the session id.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the creation time.
    #[inline]
    pub fn created(&self) -> SystemTime {
        self.created
    }

    /// Returns the last access time.
    pub fn last_accessed(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.last_accessed.load(Ordering::Acquire))
    }

    /// Returns `true` until the first exchange that joined the session
    /// completes its response head.
    pub fn is_new(&self) -> bool {
        self.is_new.load(Ordering::Acquire)
    }

    pub(crate) fn set_old(&self) {
        self.is_new.store(false, Ordering::Release);
    }

    /// Returns the inactivity timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.load(Ordering::Acquire))
    }

    /// Override the inactivity timeout for this session.
    pub fn set_timeout(&self, timeout: Duration) {
        self.timeout_secs.store(timeout.as_secs(), Ordering::Release);
    }

    /// Record an access now.
    pub fn touch(&self) {
        self.last_accessed.store(unix_millis(SystemTime::now()), Ordering::Release);
    }

    #[cfg(test)]
    pub(crate) fn set_last_accessed(&self, time: SystemTime) {
        self.last_accessed.store(unix_millis(time), Ordering::Release);
    }

    /// Returns `true` if the inactivity timeout has elapsed.
    pub fn expired(&self) -> bool {
        let idle = unix_millis(SystemTime::now())
            .saturating_sub(self.last_accessed.load(Ordering::Acquire));
        idle >= self.timeout_secs.load(Ordering::Acquire) * 1000
    }

    /// Returns the attribute stored under `name`.
    pub fn attribute(&self, name: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.attributes.lock().unwrap_or_else(|e| e.into_inner()).get(name).cloned()
    }

    /// Store an attribute, replacing any previous value.
    pub fn set_attribute(&self, name: impl Into<String>, value: Arc<dyn Any + Send + Sync>) {
        self.attributes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.into(), value);
    }

    /// Remove the attribute stored under `name`.
    pub fn remove_attribute(&self, name: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.attributes.lock().unwrap_or_else(|e| e.into_inner()).remove(name)
    }

    /// Returns the attribute names currently stored.
    pub fn attribute_names(&self) -> Vec<String> {
        self.attributes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    fn clear_attributes(&self) {
        self.attributes.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("is_new", &self.is_new())
            .finish_non_exhaustive()
    }
}

// ===== SessionStore =====

/// Shared registry of active sessions.
#[derive(Clone, Debug)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Arc<Session>>>,
    timeout: Duration,
}

impl SessionStore {
    /// Create an empty store with the given default inactivity timeout.
    pub fn new(timeout: Duration) -> SessionStore {
        SessionStore { sessions: Arc::new(DashMap::new()), timeout }
    }

    /// Create and register a new session.
    pub fn create(&self) -> Arc<Session> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let session = Arc::new(Session::new(id.clone(), self.timeout));
        self.sessions.insert(id, session.clone());
        session
    }

    /// Returns the session with the given id, expired or not.
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|entry| entry.clone())
    }

    /// Returns the session with the given id if it has not expired.
    pub fn get_valid(&self, id: &str) -> Option<Arc<Session>> {
        self.get(id).filter(|session| !session.expired())
    }

    /// Returns `true` if the id names a live session.
    pub fn is_valid(&self, id: &str) -> bool {
        self.get_valid(id).is_some()
    }

    /// Remove a session and clear its attributes.
    ///
    /// Invalidating an unknown id is a no-op.
    pub fn invalidate(&self, id: &str) {
        if let Some((_, session)) = self.sessions.remove(id) {
            session.clear_attributes();
        }
    }

    /// Returns the number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no session is registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop all expired sessions, returning how many were removed.
    pub fn sweep_once(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| {
            if session.expired() {
                session.clear_attributes();
                false
            } else {
                true
            }
        });
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            debug!("session sweep removed {removed} expired sessions");
        }
        removed
    }

    /// Periodically sweep expired sessions.
    pub async fn sweep_loop(self, interval: Duration) {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            timer.tick().await;
            self.sweep_once();
        }
    }
}
