use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::eventsub::session::SessionStatus;

/// Envelope kind carried in `metadata.message_type`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MessageKind {
    Welcome,
    Keepalive,
    Notification,
    Reconnect,
    Revocation,
}

impl MessageKind {
    /// Every kind the decoder understands.
    pub const ALL: [MessageKind; 5] = [
        MessageKind::Welcome,
        MessageKind::Keepalive,
        MessageKind::Notification,
        MessageKind::Reconnect,
        MessageKind::Revocation,
    ];

    /// Wire value of the discriminator.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Welcome => "session_welcome",
            MessageKind::Keepalive => "session_keepalive",
            MessageKind::Notification => "notification",
            MessageKind::Reconnect => "session_reconnect",
            MessageKind::Revocation => "revocation",
        }
    }

    /// Maps a wire discriminator to a known kind.
    ///
    /// Returns `None` for kinds added by the server after this SDK was
    /// built; callers skip those frames.
    pub fn from_wire(message_type: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == message_type)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataMsg {
    pub message_id: String,
    pub message_type: String,
    pub message_timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionMsg {
    pub id: String,
    pub status: SessionStatus,
    #[serde(default)]
    pub keepalive_timeout_seconds: Option<u64>,
    #[serde(default)]
    pub reconnect_url: Option<String>,
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransportMsg {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
}

/// Subscription descriptor forwarded verbatim from notifications and
/// revocations. `condition` is never interpreted by the SDK.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionMsg {
    pub id: String,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    #[serde(default)]
    pub cost: u64,
    #[serde(default)]
    pub condition: Value,
    pub transport: TransportMsg,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionPayload {
    pub session: SessionMsg,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KeepalivePayload {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationPayload {
    pub subscription: SubscriptionMsg,
    pub event: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RevocationPayload {
    pub subscription: SubscriptionMsg,
}

/// Outer JSON structure shared by every EventSub message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvelopeMsg<P> {
    pub metadata: MetadataMsg,
    pub payload: P,
}

/// Fully decoded envelope, one variant per known message kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Welcome(EnvelopeMsg<SessionPayload>),
    Keepalive(EnvelopeMsg<KeepalivePayload>),
    Notification(EnvelopeMsg<NotificationPayload>),
    Reconnect(EnvelopeMsg<SessionPayload>),
    Revocation(EnvelopeMsg<RevocationPayload>),
}

impl Envelope {
    /// Classifies and decodes a raw frame.
    ///
    /// `Ok(None)` means the frame was well-formed JSON but carried a message
    /// kind this SDK does not know.
    pub fn from_slice(frame: &[u8]) -> Result<Option<Self>, serde_json::Error> {
        let message_type = classify(frame)?;
        decode_envelope(frame, &message_type)
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Envelope::Welcome(_) => MessageKind::Welcome,
            Envelope::Keepalive(_) => MessageKind::Keepalive,
            Envelope::Notification(_) => MessageKind::Notification,
            Envelope::Reconnect(_) => MessageKind::Reconnect,
            Envelope::Revocation(_) => MessageKind::Revocation,
        }
    }

    pub fn metadata(&self) -> &MetadataMsg {
        match self {
            Envelope::Welcome(message) | Envelope::Reconnect(message) => &message.metadata,
            Envelope::Keepalive(message) => &message.metadata,
            Envelope::Notification(message) => &message.metadata,
            Envelope::Revocation(message) => &message.metadata,
        }
    }
}

#[derive(Deserialize)]
struct Discriminator {
    metadata: DiscriminatorMetadata,
}

#[derive(Deserialize)]
struct DiscriminatorMetadata {
    message_type: String,
}

/// Reads `metadata.message_type` without touching the payload.
pub fn classify(frame: &[u8]) -> Result<String, serde_json::Error> {
    let discriminator: Discriminator = serde_json::from_slice(frame)?;
    Ok(discriminator.metadata.message_type)
}

/// Decodes a frame whose discriminator is already known.
///
/// Unknown discriminators map to `Ok(None)`.
pub fn decode_envelope(
    frame: &[u8],
    message_type: &str,
) -> Result<Option<Envelope>, serde_json::Error> {
    match MessageKind::from_wire(message_type) {
        Some(kind) => decode_kind(frame, kind).map(Some),
        None => Ok(None),
    }
}

/// Decodes a frame as the given message kind.
pub fn decode_kind(frame: &[u8], kind: MessageKind) -> Result<Envelope, serde_json::Error> {
    Ok(match kind {
        MessageKind::Welcome => Envelope::Welcome(serde_json::from_slice(frame)?),
        MessageKind::Keepalive => {
            let message: EnvelopeMsg<Option<KeepalivePayload>> = serde_json::from_slice(frame)?;
            Envelope::Keepalive(EnvelopeMsg {
                metadata: message.metadata,
                payload: message.payload.unwrap_or_default(),
            })
        }
        MessageKind::Notification => Envelope::Notification(serde_json::from_slice(frame)?),
        MessageKind::Reconnect => Envelope::Reconnect(serde_json::from_slice(frame)?),
        MessageKind::Revocation => Envelope::Revocation(serde_json::from_slice(frame)?),
    })
}

/// Errors produced while extracting a typed notification payload.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The frame is not a decodable notification envelope.
    #[error("invalid notification envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// The inner event does not match the requested shape.
    #[error("event payload does not match target type: {0}")]
    Event(#[source] serde_json::Error),
}

/// Decodes the `payload.event` object of a notification frame into `T`.
///
/// The SDK does not know the full set of notification payloads, so the
/// target shape is chosen by the caller.
pub fn extract_event<T>(frame: &[u8]) -> Result<T, ExtractError>
where
    T: DeserializeOwned,
{
    let message: EnvelopeMsg<NotificationPayload> =
        serde_json::from_slice(frame).map_err(ExtractError::Envelope)?;
    serde_json::from_value(message.payload.event).map_err(ExtractError::Event)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};

    pub const TIMESTAMP: &str = "2023-07-19T14:56:51.634234626Z";

    pub fn metadata(message_type: &str, subscription_type: Option<&str>) -> Value {
        let mut metadata = json!({
            "message_id": format!("{message_type}-id"),
            "message_type": message_type,
            "message_timestamp": TIMESTAMP,
        });
        if let Some(subscription_type) = subscription_type {
            metadata["subscription_type"] = json!(subscription_type);
            metadata["subscription_version"] = json!("1");
        }
        metadata
    }

    pub fn session(id: &str, status: &str, reconnect_url: Option<&str>) -> Value {
        json!({
            "id": id,
            "status": status,
            "keepalive_timeout_seconds": if reconnect_url.is_some() { Value::Null } else { json!(10) },
            "reconnect_url": reconnect_url,
            "connected_at": "2023-07-19T14:56:51.616329898Z",
        })
    }

    pub fn subscription(kind: &str) -> Value {
        json!({
            "id": "f1c2a387-161a-49f9-a165-0f21d7a4e1c4",
            "status": "enabled",
            "type": kind,
            "version": "1",
            "cost": 0,
            "condition": { "broadcaster_user_id": "12826" },
            "transport": { "method": "websocket", "session_id": "AQoQexAWVYKSTIu4ec_2VAxyuhAB" },
            "created_at": "2023-07-19T14:56:51.634234626Z",
        })
    }

    pub fn welcome(id: &str) -> Vec<u8> {
        frame(json!({
            "metadata": metadata("session_welcome", None),
            "payload": { "session": session(id, "connected", None) },
        }))
    }

    pub fn keepalive() -> Vec<u8> {
        frame(json!({
            "metadata": metadata("session_keepalive", None),
            "payload": {},
        }))
    }

    pub fn notification(kind: &str, event: Value) -> Vec<u8> {
        frame(json!({
            "metadata": metadata("notification", Some(kind)),
            "payload": { "subscription": subscription(kind), "event": event },
        }))
    }

    pub fn reconnect(id: &str, url: &str) -> Vec<u8> {
        frame(json!({
            "metadata": metadata("session_reconnect", None),
            "payload": { "session": session(id, "reconnecting", Some(url)) },
        }))
    }

    pub fn revocation(kind: &str) -> Vec<u8> {
        let mut subscription = subscription(kind);
        subscription["status"] = json!("authorization_revoked");
        frame(json!({
            "metadata": metadata("revocation", Some(kind)),
            "payload": { "subscription": subscription },
        }))
    }

    pub fn frame(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).expect("encode fixture")
    }
}
