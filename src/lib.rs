//! User-facing Rust SDK for Twitch Helix and EventSub integrations.
//!
//! The crate is organized by transport surface:
//! - `eventsub`: realtime websocket client, session state, and typed event
//!   payload decoding.
//! - `helix`: HTTP client for the Helix REST API, including EventSub
//!   subscription registration and token refresh.

/// Realtime EventSub client, protocol types, and session state helpers.
pub mod eventsub;
/// Helix API client and request/response types.
pub mod helix;
