//! A single request/response pair.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::request::Request;
use crate::response::Response;
use crate::session::{Session, SessionStore};

/// One HTTP exchange as seen by handlers and filters.
///
/// The exchange owns both sides. Destroying it closes the request body and
/// abandons an unfinished response, it runs at most once even when invoked
/// from both the dispatcher and drop.
pub struct Exchange {
    request: Request,
    response: Response,
    sessions: SessionStore,
    session: Option<Arc<Session>>,
    destroyed: AtomicBool,
}

impl Exchange {
    pub(crate) fn new(request: Request, response: Response, sessions: SessionStore) -> Exchange {
        Exchange { request, response, sessions, session: None, destroyed: AtomicBool::new(false) }
    }

    /// Returns reference to the request.
    #[inline]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Returns mutable reference to the request.
    #[inline]
    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// Returns reference to the response.
    #[inline]
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Returns mutable reference to the response.
    #[inline]
    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Borrow both sides at once.
    #[inline]
    pub fn parts(&mut self) -> (&mut Request, &mut Response) {
        (&mut self.request, &mut self.response)
    }

    /// Returns the session store.
    #[inline]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Join the session the client presented, if it is still live.
    ///
    /// Runs before dispatch so handlers observe a touched session.
    pub(crate) fn resolve_session(&mut self) {
        let Some(id) = self.request.session_id() else { return };
        if let Some(session) = self.sessions.get_valid(id) {
            session.touch();
            session.set_old();
            self.response.set_session(session.clone());
            self.session = Some(session);
        }
    }

    /// Returns the current session, creating one when `create` is set.
    ///
    /// A created session is announced to the client through a `Set-Cookie`
    /// header on the response head.
    pub fn session(&mut self, create: bool) -> Option<Arc<Session>> {
        if let Some(session) = &self.session {
            if self.sessions.is_valid(session.id()) {
                return Some(session.clone());
            }
            self.session = None;
        }
        if !create {
            return None;
        }
        let session = self.sessions.create();
        self.response.set_session(session.clone());
        self.session = Some(session.clone());
        Some(session)
    }

    /// Release per exchange resources. Destroying twice is a no-op.
    pub(crate) fn destroy(&mut self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.request.body_ref().close();
    }
}

impl Drop for Exchange {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Exchange")
            .field("method", &self.request.method())
            .field("path", &self.request.path())
            .field("status", &self.response.status())
            .finish_non_exhaustive()
    }
}


#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::testing::*;
    use crate::session::SessionStore;

    #[test]
    fn session_created_on_demand() {
        let (mut ex, _rx) = exchange("GET / HTTP/1.1\r\n\r\n");
        assert!(ex.session(false).is_none());
        let session = ex.session(true).unwrap();
        assert!(session.is_new());
        assert_eq!(ex.session(false).unwrap().id(), session.id());
    }

    #[test]
    fn presented_session_is_joined() {
        let store = SessionStore::new(Duration::from_secs(1800));
        let session = store.create();
        session.set_old();

        let raw = format!("GET / HTTP/1.1\r\ncookie: SESSIONID={}\r\n\r\n", session.id());
        let (mut ex, _rx) = exchange_with_store(&raw, store);
        assert_eq!(ex.session(false).unwrap().id(), session.id());
    }

    #[test]
    fn stale_session_id_is_ignored() {
        let store = SessionStore::new(Duration::from_secs(1800));
        let session = store.create();
        store.invalidate(session.id());

        let raw = format!("GET / HTTP/1.1\r\ncookie: SESSIONID={}\r\n\r\n", session.id());
        let (mut ex, _rx) = exchange_with_store(&raw, store);
        assert!(ex.session(false).is_none());
    }

    #[test]
    fn invalidated_mid_exchange() {
        let (mut ex, _rx) = exchange("GET / HTTP/1.1\r\n\r\n");
        let session = ex.session(true).unwrap();
        ex.sessions().invalidate(session.id());
        assert!(ex.session(false).is_none());
    }

    #[test]
    fn destroy_closes_body() {
        let (mut ex, _rx) = exchange("GET / HTTP/1.1\r\n\r\n");
        ex.destroy();
        ex.destroy();
        assert!(ex.request_mut().body().is_finished());
    }
}
