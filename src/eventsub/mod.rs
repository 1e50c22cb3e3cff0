//! Realtime EventSub modules.
//!
//! - `client`: websocket connection loop, reconnect handling, and the
//!   outbound event channel.
//! - `proto`: envelope messages shared with the EventSub service, frame
//!   classification, and typed payload extraction.
//! - `session`: session descriptor and the shared session store.
//! - `events`: typed payloads for common subscription kinds.

/// Websocket connection loop and event channel.
pub mod client;
/// Typed notification payloads.
pub mod events;
/// EventSub protocol messages.
pub mod proto;
/// Session descriptor and shared store.
pub mod session;

pub use client::{Event, EventSubClient, EventSubConnection, EventSubError, EventSubHandle};
pub use events::EventPayload;
pub use proto::{extract_event, Envelope, ExtractError, MessageKind};
pub use session::{Session, SessionStatus, SessionStore};
