//! Typed payloads for common EventSub subscription kinds.
//!
//! These are conveniences for [`Event::decode_matching`]; any
//! `DeserializeOwned` type can be passed to [`Event::decode`] instead.
//!
//! [`Event::decode`]: crate::eventsub::Event::decode
//! [`Event::decode_matching`]: crate::eventsub::Event::decode_matching

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ties a payload type to the subscription it is delivered for.
pub trait EventPayload: DeserializeOwned {
    /// Subscription type, e.g. `stream.online`.
    const SUBSCRIPTION_TYPE: &'static str;
    /// Subscription version the payload shape belongs to.
    const VERSION: &'static str;
}

macro_rules! event_payload {
    ($ty:ty, $kind:literal, $version:literal) => {
        impl EventPayload for $ty {
            const SUBSCRIPTION_TYPE: &'static str = $kind;
            const VERSION: &'static str = $version;
        }
    };
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StreamOnlineEvent {
    pub id: String,
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
    /// Usually `live`.
    #[serde(rename = "type")]
    pub kind: String,
    pub started_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StreamOfflineEvent {
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChannelUpdateEvent {
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
    pub title: String,
    /// ISO 639-1 code.
    pub language: String,
    pub category_id: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub content_classification_labels: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChannelRaidEvent {
    pub from_broadcaster_user_id: String,
    pub from_broadcaster_user_login: String,
    pub from_broadcaster_user_name: String,
    pub to_broadcaster_user_id: String,
    pub to_broadcaster_user_login: String,
    pub to_broadcaster_user_name: String,
    pub viewers: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RedeemedReward {
    pub id: String,
    pub title: String,
    pub cost: u64,
    #[serde(default)]
    pub prompt: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChannelPointsRedemptionEvent {
    pub id: String,
    pub broadcaster_user_id: String,
    #[serde(default)]
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
    pub user_id: String,
    #[serde(default)]
    pub user_login: String,
    pub user_name: String,
    #[serde(default)]
    pub user_input: String,
    /// `unfulfilled`, `fulfilled` or `canceled`.
    pub status: String,
    pub redeemed_at: String,
    pub reward: RedeemedReward,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AdBreakEvent {
    pub duration_seconds: u64,
    pub started_at: String,
    pub is_automatic: bool,
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
    #[serde(default)]
    pub requester_user_id: String,
    #[serde(default)]
    pub requester_user_login: String,
    #[serde(default)]
    pub requester_user_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChannelSubscriptionGiftEvent {
    /// Absent for anonymous gifts.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_login: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
    pub total: u64,
    /// `1000`, `2000` or `3000`.
    pub tier: String,
    #[serde(default)]
    pub cumulative_total: Option<u64>,
    pub is_anonymous: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatBadge {
    pub set_id: String,
    pub id: String,
    #[serde(default)]
    pub info: String,
}

/// One piece of a chat message. Cheermote, emote and mention details are
/// kept as raw JSON.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatMessageFragment {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(default)]
    pub cheermote: Option<Value>,
    #[serde(default)]
    pub emote: Option<Value>,
    #[serde(default)]
    pub mention: Option<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatMessageBody {
    pub text: String,
    #[serde(default)]
    pub fragments: Vec<ChatMessageFragment>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChannelChatMessageEvent {
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
    pub chatter_user_id: String,
    pub chatter_user_login: String,
    pub chatter_user_name: String,
    pub message_id: String,
    pub message: ChatMessageBody,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub badges: Vec<ChatBadge>,
    #[serde(default)]
    pub cheer: Option<Value>,
    #[serde(default)]
    pub reply: Option<Value>,
    #[serde(default)]
    pub channel_points_custom_reward_id: Option<String>,
    /// Set when the message was sent in a shared chat session.
    #[serde(default)]
    pub source_broadcaster_user_id: Option<String>,
    #[serde(default)]
    pub source_broadcaster_user_login: Option<String>,
    #[serde(default)]
    pub source_broadcaster_user_name: Option<String>,
    #[serde(default)]
    pub source_message_id: Option<String>,
    #[serde(default)]
    pub source_badges: Option<Vec<ChatBadge>>,
    #[serde(default)]
    pub is_source_only: Option<bool>,
}

event_payload!(StreamOnlineEvent, "stream.online", "1");
event_payload!(StreamOfflineEvent, "stream.offline", "1");
event_payload!(ChannelUpdateEvent, "channel.update", "2");
event_payload!(ChannelRaidEvent, "channel.raid", "1");
event_payload!(
    ChannelPointsRedemptionEvent,
    "channel.channel_points_custom_reward_redemption.add",
    "1"
);
event_payload!(AdBreakEvent, "channel.ad_break.begin", "1");
event_payload!(ChannelSubscriptionGiftEvent, "channel.subscription.gift", "1");
event_payload!(ChannelChatMessageEvent, "channel.chat.message", "1");

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ChannelChatMessageEvent, ChannelSubscriptionGiftEvent, EventPayload};
    use crate::eventsub::proto::{extract_event, fixtures};

    #[test]
    fn chat_message_decodes_from_notification() {
        let frame = fixtures::notification(
            "channel.chat.message",
            json!({
                "broadcaster_user_id": "1971641",
                "broadcaster_user_login": "streamer",
                "broadcaster_user_name": "streamer",
                "chatter_user_id": "4145994",
                "chatter_user_login": "viewer32",
                "chatter_user_name": "viewer32",
                "message_id": "cc106a89-1814-919d-454c-f4f2f970aae7",
                "message": {
                    "text": "Hi chat",
                    "fragments": [
                        { "type": "text", "text": "Hi chat", "cheermote": null, "emote": null, "mention": null }
                    ]
                },
                "color": "#00FF7F",
                "badges": [{ "set_id": "moderator", "id": "1", "info": "" }],
                "message_type": "text",
                "cheer": null,
                "reply": null,
                "channel_points_custom_reward_id": null
            }),
        );

        let event: ChannelChatMessageEvent = extract_event(&frame).expect("decode chat message");
        assert_eq!(event.chatter_user_login, "viewer32");
        assert_eq!(event.message.text, "Hi chat");
        assert_eq!(event.message.fragments.len(), 1);
        assert_eq!(event.badges[0].set_id, "moderator");
        assert_eq!(event.source_message_id, None);
        assert_eq!(
            ChannelChatMessageEvent::SUBSCRIPTION_TYPE,
            "channel.chat.message"
        );
    }

    #[test]
    fn anonymous_gift_decodes_without_user() {
        let frame = fixtures::notification(
            "channel.subscription.gift",
            json!({
                "user_id": null,
                "user_login": null,
                "user_name": null,
                "broadcaster_user_id": "1337",
                "broadcaster_user_login": "cooler_user",
                "broadcaster_user_name": "Cooler_User",
                "total": 2,
                "tier": "1000",
                "cumulative_total": null,
                "is_anonymous": true
            }),
        );

        let event: ChannelSubscriptionGiftEvent = extract_event(&frame).expect("decode gift");
        assert!(event.is_anonymous);
        assert_eq!(event.user_id, None);
        assert_eq!(event.total, 2);
    }
}
