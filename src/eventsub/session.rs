//! Session descriptor and the store shared between the connection loop and
//! any number of readers.
//!
//! The store always holds a complete [`Session`]: the bootstrap default
//! before the first welcome, and the server-confirmed session afterwards.
//! Readers get snapshots and never observe a partially written value.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::eventsub::proto::SessionMsg;

/// Server-reported session status.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No server contact yet.
    Unconnected,
    Connected,
    Reconnecting,
    /// A status value this SDK does not know.
    #[serde(other)]
    Unknown,
}

/// Snapshot of the active EventSub session.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    /// Server-assigned session id. Empty until the first welcome.
    pub id: String,
    pub status: SessionStatus,
    /// Maximum silence the server allows between messages.
    pub keepalive_timeout: Option<Duration>,
    /// Address the connection loop dials next.
    pub reconnect_url: String,
    /// When the server established the session.
    pub connected_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Default session used before any server contact.
    pub fn bootstrap(endpoint: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            status: SessionStatus::Unconnected,
            keepalive_timeout: None,
            reconnect_url: endpoint.into(),
            connected_at: None,
        }
    }

    /// Builds a session from a welcome payload.
    ///
    /// Welcome messages carry no reconnect address, so `current_url` (the
    /// address of the live connection) is kept as the reconnect target.
    pub fn from_welcome(message: SessionMsg, current_url: &str) -> Self {
        Self {
            id: message.id,
            status: message.status,
            keepalive_timeout: message.keepalive_timeout_seconds.map(Duration::from_secs),
            reconnect_url: message
                .reconnect_url
                .unwrap_or_else(|| current_url.to_string()),
            connected_at: Some(message.connected_at),
        }
    }

    /// Returns true once the server has assigned a session id.
    pub fn is_established(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Reader/writer-locked holder of the current [`Session`].
///
/// Cloning the store shares the same underlying session.
#[derive(Clone, Debug)]
pub struct SessionStore {
    inner: Arc<RwLock<Session>>,
}

impl SessionStore {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    /// Returns a snapshot of the current session.
    pub fn read(&self) -> Session {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the whole session.
    pub fn replace(&self, session: Session) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Updates only the reconnect target.
    pub fn set_reconnect_url(&self, url: impl Into<String>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .reconnect_url = url.into();
    }

    pub fn reconnect_url(&self) -> String {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .reconnect_url
            .clone()
    }

    /// Current session id, empty before the first welcome.
    pub fn session_id(&self) -> String {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .id
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use chrono::{DateTime, Utc};

    use super::{Session, SessionStatus, SessionStore};
    use crate::eventsub::proto::SessionMsg;

    fn welcome_session(id: &str) -> SessionMsg {
        SessionMsg {
            id: id.to_string(),
            status: SessionStatus::Connected,
            keepalive_timeout_seconds: Some(10),
            reconnect_url: None,
            connected_at: DateTime::<Utc>::from_timestamp(1_689_778_611, 0).expect("timestamp"),
        }
    }

    #[test]
    fn bootstrap_session_targets_endpoint() {
        let store = SessionStore::new(Session::bootstrap("wss://example.test/ws"));
        let session = store.read();
        assert_eq!(session.reconnect_url, "wss://example.test/ws");
        assert_eq!(session.status, SessionStatus::Unconnected);
        assert!(!session.is_established());
    }

    #[test]
    fn welcome_keeps_current_url_as_reconnect_target() {
        let session = Session::from_welcome(welcome_session("abc"), "wss://live.test/ws");
        assert_eq!(session.id, "abc");
        assert_eq!(session.keepalive_timeout, Some(Duration::from_secs(10)));
        assert_eq!(session.reconnect_url, "wss://live.test/ws");
        assert!(session.is_established());
    }

    #[test]
    fn reconnect_updates_only_target() {
        let store = SessionStore::new(Session::from_welcome(
            welcome_session("abc"),
            "wss://live.test/ws",
        ));
        store.set_reconnect_url("wss://next.test/ws");

        let session = store.read();
        assert_eq!(session.id, "abc");
        assert_eq!(session.status, SessionStatus::Connected);
        assert_eq!(session.reconnect_url, "wss://next.test/ws");
    }

    #[test]
    fn unknown_status_decodes_as_unknown() {
        let status: SessionStatus = serde_json::from_str(r#""migrating""#).expect("decode");
        assert_eq!(status, SessionStatus::Unknown);
    }

    #[test]
    fn readers_never_observe_partial_session() {
        let store = SessionStore::new(Session::bootstrap("wss://a.test"));
        let writer = {
            let store = store.clone();
            thread::spawn(move || {
                for n in 0..500 {
                    let tag = format!("{n}");
                    store.replace(Session {
                        id: tag.clone(),
                        status: SessionStatus::Connected,
                        keepalive_timeout: None,
                        reconnect_url: format!("wss://{tag}.test"),
                        connected_at: None,
                    });
                }
            })
        };

        for _ in 0..500 {
            let session = store.read();
            if session.is_established() {
                assert_eq!(session.reconnect_url, format!("wss://{}.test", session.id));
            }
        }
        writer.join().expect("writer thread");
    }
}
