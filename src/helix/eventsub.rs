//! EventSub subscription registration over the websocket transport.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::eventsub::events::EventPayload;
use crate::eventsub::proto::SubscriptionMsg;
use crate::helix::{HelixClient, HelixError};

const WEBSOCKET_METHOD: &str = "websocket";

#[derive(Debug, Serialize)]
struct CreateSubscriptionBody<'a, C: ?Sized> {
    #[serde(rename = "type")]
    kind: &'a str,
    version: &'a str,
    condition: &'a C,
    transport: WebsocketTransport<'a>,
}

#[derive(Debug, Serialize)]
struct WebsocketTransport<'a> {
    method: &'static str,
    session_id: &'a str,
}

/// Response to a subscription create call.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CreatedSubscriptions {
    pub data: Vec<SubscriptionMsg>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_cost: u64,
    #[serde(default)]
    pub max_total_cost: u64,
}

impl HelixClient {
    /// Registers a subscription delivered to the websocket session `session_id`.
    pub async fn create_eventsub_subscription<C>(
        &self,
        subscription_type: &str,
        version: &str,
        condition: &C,
        session_id: &str,
    ) -> Result<CreatedSubscriptions, HelixError>
    where
        C: Serialize + ?Sized,
    {
        if session_id.is_empty() {
            return Err(HelixError::InvalidRequest(
                "websocket subscriptions need an established session id".to_string(),
            ));
        }

        let body = CreateSubscriptionBody {
            kind: subscription_type,
            version,
            condition,
            transport: WebsocketTransport {
                method: WEBSOCKET_METHOD,
                session_id,
            },
        };

        self.send_json(Method::POST, "eventsub/subscriptions", &[], Some(&body))
            .await
    }

    /// Registers the subscription whose events decode as `T`.
    pub async fn subscribe<T: EventPayload>(
        &self,
        condition: &(impl Serialize + ?Sized),
        session_id: &str,
    ) -> Result<CreatedSubscriptions, HelixError> {
        self.create_eventsub_subscription(T::SUBSCRIPTION_TYPE, T::VERSION, condition, session_id)
            .await
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamOnlineCondition {
    pub broadcaster_user_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamOfflineCondition {
    pub broadcaster_user_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelUpdateCondition {
    pub broadcaster_user_id: String,
}

/// Exactly one side of the raid must be set.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelRaidCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_broadcaster_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_broadcaster_user_id: Option<String>,
}

impl ChannelRaidCondition {
    /// Raids started by `broadcaster_user_id`.
    pub fn outgoing(broadcaster_user_id: impl Into<String>) -> Self {
        Self {
            from_broadcaster_user_id: Some(broadcaster_user_id.into()),
            to_broadcaster_user_id: None,
        }
    }

    /// Raids targeting `broadcaster_user_id`.
    pub fn incoming(broadcaster_user_id: impl Into<String>) -> Self {
        Self {
            from_broadcaster_user_id: None,
            to_broadcaster_user_id: Some(broadcaster_user_id.into()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelPointsRedemptionAddCondition {
    pub broadcaster_user_id: String,
    /// Limits delivery to one reward.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdBreakBeginCondition {
    pub broadcaster_user_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionGiftCondition {
    pub broadcaster_user_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelChatMessageCondition {
    pub broadcaster_user_id: String,
    /// The user reading chat, normally the token owner.
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        ChannelPointsRedemptionAddCondition, ChannelRaidCondition, CreateSubscriptionBody,
        CreatedSubscriptions, StreamOnlineCondition, WebsocketTransport, WEBSOCKET_METHOD,
    };

    #[test]
    fn create_body_matches_wire_shape() {
        let condition = StreamOnlineCondition {
            broadcaster_user_id: "1234".to_string(),
        };
        let body = CreateSubscriptionBody {
            kind: "stream.online",
            version: "1",
            condition: &condition,
            transport: WebsocketTransport {
                method: WEBSOCKET_METHOD,
                session_id: "AQoQexAWVYKSTIu4ec_2VAxyuhAB",
            },
        };

        assert_eq!(
            serde_json::to_value(&body).expect("serialize body"),
            json!({
                "type": "stream.online",
                "version": "1",
                "condition": { "broadcaster_user_id": "1234" },
                "transport": {
                    "method": "websocket",
                    "session_id": "AQoQexAWVYKSTIu4ec_2VAxyuhAB"
                }
            })
        );
    }

    #[test]
    fn raid_condition_serializes_one_side() {
        let value = serde_json::to_value(ChannelRaidCondition::incoming("42")).expect("serialize");
        assert_eq!(value, json!({ "to_broadcaster_user_id": "42" }));
    }

    #[test]
    fn redemption_condition_omits_missing_reward() {
        let value = serde_json::to_value(ChannelPointsRedemptionAddCondition {
            broadcaster_user_id: "42".to_string(),
            reward_id: None,
        })
        .expect("serialize");
        assert_eq!(value, json!({ "broadcaster_user_id": "42" }));
    }

    #[test]
    fn created_subscription_response_parses() {
        let body = json!({
            "data": [{
                "id": "f1c2a387-161a-49f9-a165-0f21d7a4e1c4",
                "status": "enabled",
                "type": "stream.online",
                "version": "1",
                "cost": 0,
                "condition": { "broadcaster_user_id": "1234" },
                "transport": {
                    "method": "websocket",
                    "session_id": "AQoQexAWVYKSTIu4ec_2VAxyuhAB",
                    "connected_at": "2023-07-19T14:56:51.634234626Z"
                },
                "created_at": "2023-07-19T14:56:52.634234626Z"
            }],
            "total": 1,
            "total_cost": 0,
            "max_total_cost": 10
        });

        let parsed: CreatedSubscriptions = serde_json::from_value(body).expect("parse");
        assert_eq!(parsed.data[0].kind, "stream.online");
        assert_eq!(
            parsed.data[0].transport.session_id.as_deref(),
            Some("AQoQexAWVYKSTIu4ec_2VAxyuhAB")
        );
        assert_eq!(parsed.max_total_cost, 10);
    }
}
