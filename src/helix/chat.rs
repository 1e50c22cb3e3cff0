use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::helix::{DataResponse, HelixClient, HelixError, Pagination, Query, NO_BODY};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SendChatMessageRequest {
    pub broadcaster_id: String,
    /// Must be the user the token belongs to.
    pub sender_id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_parent_message_id: Option<String>,
    /// In shared chat, send only to the source channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub for_source_only: Option<bool>,
}

impl SendChatMessageRequest {
    pub fn new(
        broadcaster_id: impl Into<String>,
        sender_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            broadcaster_id: broadcaster_id.into(),
            sender_id: sender_id.into(),
            message: message.into(),
            reply_parent_message_id: None,
            for_source_only: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SendChatMessageResponse {
    pub message_id: String,
    pub is_sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_reason: Option<DropReason>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DropReason {
    pub code: String,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChattersRequest {
    pub broadcaster_id: String,
    pub moderator_id: String,
    /// Page size, 1 to 1000.
    pub first: Option<u32>,
    pub after: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Chatter {
    pub user_id: String,
    pub user_login: String,
    pub user_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChattersPage {
    pub data: Vec<Chatter>,
    #[serde(default)]
    pub pagination: Pagination,
    /// Users connected to chat, not viewers.
    #[serde(default)]
    pub total: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShoutoutRequest {
    pub from_broadcaster_id: String,
    pub to_broadcaster_id: String,
    pub moderator_id: String,
}

impl HelixClient {
    pub async fn send_chat_message(
        &self,
        request: &SendChatMessageRequest,
    ) -> Result<SendChatMessageResponse, HelixError> {
        let response: DataResponse<SendChatMessageResponse> = self
            .send_json(Method::POST, "chat/messages", &[], Some(request))
            .await?;
        response.into_first("send chat message")
    }

    pub async fn get_chatters(
        &self,
        request: &ChattersRequest,
    ) -> Result<ChattersPage, HelixError> {
        let query = Query::new()
            .push("broadcaster_id", &request.broadcaster_id)
            .push("moderator_id", &request.moderator_id)
            .push_opt("first", request.first)
            .push_opt("after", request.after.as_deref());

        self.send_json(Method::GET, "chat/chatters", query.pairs(), NO_BODY)
            .await
    }

    /// Sends a `/shoutout`. Twitch rate limits these per channel.
    pub async fn send_shoutout(&self, request: &ShoutoutRequest) -> Result<(), HelixError> {
        let query = Query::new()
            .push("from_broadcaster_id", &request.from_broadcaster_id)
            .push("to_broadcaster_id", &request.to_broadcaster_id)
            .push("moderator_id", &request.moderator_id);

        self.send_empty(Method::POST, "chat/shoutouts", query.pairs(), NO_BODY)
            .await
    }
}
