//! Helix HTTP bindings.
//!
//! Every call is a single request/response round trip: JSON in, JSON out,
//! non-2xx mapped to [`HelixError::HttpStatus`]. There is no retry or rate
//! limiting here; callers that need it wrap the calls themselves.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod auth;
pub mod channels;
pub mod chat;
pub mod eventsub;
pub mod polls;
pub mod rewards;
pub mod subscriptions;
pub mod users;

pub use auth::{AppAccessToken, UserAccessToken};
pub use channels::{
    Channel, ContentClassificationLabel, CreatedClip, GetStreamsRequest,
    ModifyChannelInformationRequest, RaidStarted, SearchChannelsRequest, StartRaidRequest,
    Stream,
};
pub use chat::{
    Chatter, ChattersPage, ChattersRequest, DropReason, SendChatMessageRequest,
    SendChatMessageResponse, ShoutoutRequest,
};
pub use eventsub::{
    AdBreakBeginCondition, ChannelChatMessageCondition, ChannelPointsRedemptionAddCondition,
    ChannelRaidCondition, ChannelUpdateCondition, CreatedSubscriptions, StreamOfflineCondition,
    StreamOnlineCondition, SubscriptionGiftCondition,
};
pub use polls::{CreatePollRequest, Poll, PollChoice};
pub use rewards::{CustomReward, CustomRewardRequest, GetCustomRewardsRequest};
pub use subscriptions::{
    BroadcasterSubscriptions, GetBroadcasterSubscriptionsRequest, Subscriber, UserSubscription,
};
pub use users::{GetUsersRequest, User};

const ERROR_BODY_SNIPPET_LEN: usize = 220;
pub const HELIX_BASE_URL: &str = "https://api.twitch.tv/helix";
pub const OAUTH_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HelixDefaults;

impl HelixDefaults {
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
}

#[derive(Clone, Debug)]
pub struct HelixClientOptions {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub base_url: String,
    pub auth_url: String,
}

impl Default for HelixClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: HelixDefaults::CONNECT_TIMEOUT,
            request_timeout: HelixDefaults::REQUEST_TIMEOUT,
            base_url: HELIX_BASE_URL.to_string(),
            auth_url: OAUTH_TOKEN_URL.to_string(),
        }
    }
}

/// Helix API client.
///
/// Clones share the HTTP connection pool and the bearer token, so a token
/// refreshed through one clone is used by all of them.
#[derive(Clone)]
pub struct HelixClient {
    http: Client,
    client_id: String,
    token: Arc<RwLock<SecretString>>,
    request_timeout: Duration,
    base_url: String,
    auth_url: String,
}

impl std::fmt::Debug for HelixClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelixClient")
            .field("client_id", &self.client_id)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HelixClient {
    pub fn new(client_id: impl Into<String>, token: SecretString) -> Result<Self, HelixError> {
        Self::with_options(client_id, token, HelixClientOptions::default())
    }

    pub fn with_options(
        client_id: impl Into<String>,
        token: SecretString,
        options: HelixClientOptions,
    ) -> Result<Self, HelixError> {
        let http = Client::builder()
            .connect_timeout(options.connect_timeout)
            .build()
            .map_err(HelixError::Transport)?;

        Ok(Self {
            http,
            client_id: client_id.into(),
            token: Arc::new(RwLock::new(token)),
            request_timeout: options.request_timeout,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            auth_url: options.auth_url,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Replaces the bearer token for this client and all of its clones.
    pub fn set_token(&self, token: SecretString) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn bearer(&self) -> String {
        let token = self.token.read().unwrap_or_else(PoisonError::into_inner);
        format!("Bearer {}", token.expose_secret())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Sends a request and decodes the JSON response body into `T`.
    pub(crate) async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, HelixError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let text = self.execute(method, path, query, body).await?;
        serde_json::from_str(&text).map_err(|err| HelixError::Parse(err.to_string()))
    }

    /// Sends a request whose success response carries no body of interest.
    pub(crate) async fn send_empty<B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<(), HelixError>
    where
        B: Serialize + ?Sized,
    {
        self.execute(method, path, query, body).await.map(|_| ())
    }

    async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<String, HelixError>
    where
        B: Serialize + ?Sized,
    {
        let endpoint = self.endpoint(path);
        debug!(event = "helix_request", method = %method, path = %path);

        let mut builder = self
            .http
            .request(method, &endpoint)
            .timeout(self.request_timeout)
            .header("Client-Id", &self.client_id)
            .header("Authorization", self.bearer());

        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(HelixError::Transport)?;
        read_response(response).await
    }
}

async fn read_response(response: reqwest::Response) -> Result<String, HelixError> {
    let status = response.status();
    let body = response.text().await.map_err(HelixError::Transport)?;

    if !status.is_success() {
        return Err(HelixError::HttpStatus {
            status,
            body: summarize_error_body(&body),
        });
    }

    Ok(body)
}

/// Placeholder body type for requests that send none.
pub(crate) const NO_BODY: Option<&()> = None;

#[derive(Debug, Error)]
pub enum HelixError {
    #[error("request failed: {0}")]
    Transport(reqwest::Error),

    #[error("helix status {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl HelixError {
    /// HTTP status of an API error response, if this is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Cursor for paged endpoints. `None` means there are no more pages.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// The `{"data": [...]}` wrapper most endpoints respond with.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DataResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl<T> DataResponse<T> {
    pub(crate) fn into_first(self, what: &str) -> Result<T, HelixError> {
        self.data
            .into_iter()
            .next()
            .ok_or_else(|| HelixError::Parse(format!("{what} response had empty data")))
    }
}

/// Accumulates query pairs. Repeated keys are kept as separate pairs.
#[derive(Default)]
pub(crate) struct Query<'a> {
    pairs: Vec<(&'a str, String)>,
}

impl<'a> Query<'a> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(mut self, key: &'a str, value: impl ToString) -> Self {
        self.pairs.push((key, value.to_string()));
        self
    }

    pub(crate) fn push_opt<V: ToString>(self, key: &'a str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.push(key, value),
            None => self,
        }
    }

    pub(crate) fn push_all<I, V>(mut self, key: &'a str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        self.pairs
            .extend(values.into_iter().map(|value| (key, value.to_string())));
        self
    }

    pub(crate) fn pairs(&self) -> &[(&'a str, String)] {
        &self.pairs
    }
}

fn summarize_error_body(body: &str) -> String {
    #[derive(Debug, Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        error_description: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed
            .message
            .filter(|message| !message.is_empty())
            .or(parsed.error_description)
            .or(parsed.error)
        {
            return message;
        }
    }

    body.chars().take(ERROR_BODY_SNIPPET_LEN).collect()
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::{
        summarize_error_body, DataResponse, HelixClient, HelixClientOptions, Query,
        HELIX_BASE_URL,
    };

    fn client(base_url: &str) -> HelixClient {
        HelixClient::with_options(
            "client-id",
            SecretString::new("token".to_string()),
            HelixClientOptions {
                base_url: base_url.to_string(),
                ..HelixClientOptions::default()
            },
        )
        .expect("build client")
    }

    #[test]
    fn endpoint_joins_base_and_path_with_single_slash() {
        let client = client("http://127.0.0.1:9/helix/");
        assert_eq!(
            client.endpoint("chat/messages"),
            "http://127.0.0.1:9/helix/chat/messages"
        );
        assert_eq!(
            client.endpoint("/users"),
            "http://127.0.0.1:9/helix/users"
        );
    }

    #[test]
    fn default_options_target_production() {
        let options = HelixClientOptions::default();
        assert_eq!(options.base_url, HELIX_BASE_URL);
        assert_eq!(HELIX_BASE_URL, "https://api.twitch.tv/helix");
    }

    #[test]
    fn token_swap_is_shared_between_clones() {
        let client = client(HELIX_BASE_URL);
        let clone = client.clone();
        client.set_token(SecretString::new("fresh".to_string()));
        assert_eq!(clone.bearer(), "Bearer fresh");
    }

    #[test]
    fn query_keeps_repeated_keys() {
        let query = Query::new()
            .push("broadcaster_id", "1")
            .push_all("user_id", ["a", "b"])
            .push_opt("first", None::<u32>)
            .push_opt("after", Some("cursor"));

        assert_eq!(
            query.pairs(),
            &[
                ("broadcaster_id", "1".to_string()),
                ("user_id", "a".to_string()),
                ("user_id", "b".to_string()),
                ("after", "cursor".to_string()),
            ]
        );
    }

    #[test]
    fn error_body_prefers_message() {
        let body = r#"{"error":"Unauthorized","status":401,"message":"Invalid OAuth token"}"#;
        assert_eq!(summarize_error_body(body), "Invalid OAuth token");
    }

    #[test]
    fn error_body_falls_back_to_error_then_snippet() {
        assert_eq!(
            summarize_error_body(r#"{"error":"Bad Request","message":""}"#),
            "Bad Request"
        );
        let long = "x".repeat(500);
        assert_eq!(summarize_error_body(&long).len(), 220);
    }

    #[test]
    fn data_response_tolerates_missing_pagination() {
        let parsed: DataResponse<u32> =
            serde_json::from_str(r#"{"data":[7]}"#).expect("parse data");
        assert_eq!(parsed.pagination.cursor, None);
        assert_eq!(parsed.into_first("numbers").expect("first"), 7);

        let empty: DataResponse<u32> =
            serde_json::from_str(r#"{"data":[],"pagination":{}}"#).expect("parse empty");
        assert!(empty.into_first("numbers").is_err());
    }
}
