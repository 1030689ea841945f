//! Per-browser-session navigation state
//!
//! Sessions are identified by a UUID cookie. The only state kept per session
//! is the current [`Page`]; everything else is recomputed from request
//! inputs on every interaction.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue};
use cqp_common::{NavAction, Page};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "cqp_session";

/// A resolved session for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    /// True when the request carried no usable cookie
    pub is_new: bool,
}

impl Session {
    /// `Set-Cookie` value to send back, only for new sessions
    pub fn set_cookie(&self) -> Option<HeaderValue> {
        if !self.is_new {
            return None;
        }
        HeaderValue::from_str(&format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE, self.id
        ))
        .ok()
    }
}

/// Navigation flag per session
///
/// Only sessions that have left the intro page are stored. Every other id,
/// including ids never seen before, reads as [`Page::Intro`].
#[derive(Clone, Default)]
pub struct SessionStore {
    pages: Arc<RwLock<HashMap<Uuid, Page>>>,
}

impl SessionStore {
    /// Find the session named by the request cookie, minting an id if needed
    ///
    /// Resolving never registers anything; a well-formed but unknown id
    /// (e.g. after a restart) is simply on the intro page.
    pub async fn resolve(&self, headers: &HeaderMap) -> Session {
        if let Some(id) = session_id(headers) {
            return Session { id, is_new: false };
        }

        let id = Uuid::new_v4();
        debug!("New session {}", id);
        Session { id, is_new: true }
    }

    /// Current page of a session (intro for unknown sessions)
    pub async fn page(&self, id: Uuid) -> Page {
        self.pages.read().await.get(&id).copied().unwrap_or_default()
    }

    /// Apply a navigation action and return the resulting page
    pub async fn apply(&self, id: Uuid, action: NavAction) -> Page {
        let mut pages = self.pages.write().await;
        let current = pages.get(&id).copied().unwrap_or_default();
        let next = current.apply(action);
        if next == Page::Intro {
            pages.remove(&id);
        } else {
            pages.insert(id, next);
        }
        debug!("Session {} {:?} -> {:?}", id, action, next);
        next
    }

    /// Number of sessions away from the intro page
    pub async fn len(&self) -> usize {
        self.pages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pages.read().await.is_empty()
    }
}

/// Session id from the `Cookie` header, if present and well-formed
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_session_id_among_other_cookies() {
        let id = Uuid::new_v4();
        let headers = cookie_headers(&format!("theme=dark; {}={}; lang=en", SESSION_COOKIE, id));
        assert_eq!(session_id(&headers), Some(id));
    }

    #[test]
    fn test_malformed_session_id_ignored() {
        let headers = cookie_headers(&format!("{}=not-a-uuid", SESSION_COOKIE));
        assert_eq!(session_id(&headers), None);
        assert_eq!(session_id(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_new_session_starts_on_intro_and_sets_cookie() {
        let store = SessionStore::default();
        let session = store.resolve(&HeaderMap::new()).await;

        assert!(session.is_new);
        assert!(session.set_cookie().is_some());
        assert_eq!(store.page(session.id).await, Page::Intro);
    }

    #[tokio::test]
    async fn test_sessions_navigate_independently() {
        let store = SessionStore::default();
        let a = store.resolve(&HeaderMap::new()).await;
        let b = store.resolve(&HeaderMap::new()).await;

        assert_eq!(store.apply(a.id, NavAction::Enter).await, Page::Main);
        assert_eq!(store.page(b.id).await, Page::Intro);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.apply(a.id, NavAction::GoBack).await, Page::Intro);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_resolving_does_not_register_sessions() {
        let store = SessionStore::default();
        for _ in 0..50 {
            store.resolve(&HeaderMap::new()).await;
            let headers = cookie_headers(&format!("{}={}", SESSION_COOKIE, Uuid::new_v4()));
            let session = store.resolve(&headers).await;
            assert_eq!(store.page(session.id).await, Page::Intro);
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_go_back_on_intro_stores_nothing() {
        let store = SessionStore::default();
        let id = Uuid::new_v4();
        assert_eq!(store.apply(id, NavAction::GoBack).await, Page::Intro);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_known_cookie_reuses_session() {
        let store = SessionStore::default();
        let first = store.resolve(&HeaderMap::new()).await;
        store.apply(first.id, NavAction::Enter).await;

        let headers = cookie_headers(&format!("{}={}", SESSION_COOKIE, first.id));
        let again = store.resolve(&headers).await;

        assert_eq!(again.id, first.id);
        assert!(!again.is_new);
        assert!(again.set_cookie().is_none());
        assert_eq!(store.page(again.id).await, Page::Main);
    }
}
