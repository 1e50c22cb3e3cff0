//! Streams and channel endpoints.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::helix::{DataResponse, HelixClient, HelixError, Query, NO_BODY};

/// Filters for Get Streams. Each list accepts up to 100 entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetStreamsRequest {
    pub user_ids: Vec<String>,
    pub user_logins: Vec<String>,
    pub game_ids: Vec<String>,
    /// `all` or `live`.
    pub kind: Option<String>,
    pub languages: Vec<String>,
    pub first: Option<u32>,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl GetStreamsRequest {
    fn query(&self) -> Query<'_> {
        Query::new()
            .push_all("user_id", &self.user_ids)
            .push_all("user_login", &self.user_logins)
            .push_all("game_id", &self.game_ids)
            .push_opt("type", self.kind.as_deref())
            .push_all("language", &self.languages)
            .push_opt("first", self.first)
            .push_opt("before", self.before.as_deref())
            .push_opt("after", self.after.as_deref())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Stream {
    pub id: String,
    pub user_id: String,
    pub user_login: String,
    pub user_name: String,
    pub game_id: String,
    pub game_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub viewer_count: u64,
    pub started_at: String,
    pub language: String,
    /// Contains `{width}` and `{height}` placeholders.
    pub thumbnail_url: String,
    #[serde(default)]
    pub is_mature: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchChannelsRequest {
    pub query: String,
    pub live_only: Option<bool>,
    pub first: Option<u32>,
    pub after: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Channel {
    pub id: String,
    pub broadcaster_language: String,
    pub broadcaster_login: String,
    pub display_name: String,
    pub game_id: String,
    pub game_name: String,
    pub is_live: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub thumbnail_url: String,
    pub title: String,
    /// Empty when the channel is offline.
    #[serde(default)]
    pub started_at: String,
}

/// Channel settings to change. At least one field must be set.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ModifyChannelInformationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcaster_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_classification_labels: Option<Vec<ContentClassificationLabel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_branded_content: Option<bool>,
}

impl ModifyChannelInformationRequest {
    fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentClassificationLabel {
    pub id: String,
    pub is_enabled: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartRaidRequest {
    /// Must be the user the token belongs to.
    pub from_broadcaster_id: String,
    pub to_broadcaster_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RaidStarted {
    pub created_at: String,
    pub is_mature: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CreatedClip {
    pub id: String,
    pub edit_url: String,
}

impl HelixClient {
    pub async fn get_streams(
        &self,
        request: &GetStreamsRequest,
    ) -> Result<DataResponse<Stream>, HelixError> {
        let query = request.query();
        self.send_json(Method::GET, "streams", query.pairs(), NO_BODY)
            .await
    }

    pub async fn search_channels(
        &self,
        request: &SearchChannelsRequest,
    ) -> Result<DataResponse<Channel>, HelixError> {
        if request.query.trim().is_empty() {
            return Err(HelixError::InvalidRequest(
                "search query must not be empty".to_string(),
            ));
        }

        let query = Query::new()
            .push("query", &request.query)
            .push_opt("live_only", request.live_only)
            .push_opt("first", request.first)
            .push_opt("after", request.after.as_deref());

        self.send_json(Method::GET, "search/channels", query.pairs(), NO_BODY)
            .await
    }

    /// Updates the channel of `broadcaster_id`. Twitch answers 204 on success.
    pub async fn modify_channel_information(
        &self,
        broadcaster_id: &str,
        request: &ModifyChannelInformationRequest,
    ) -> Result<(), HelixError> {
        if request.is_empty() {
            return Err(HelixError::InvalidRequest(
                "modify channel information needs at least one field".to_string(),
            ));
        }

        let query = Query::new().push("broadcaster_id", broadcaster_id);
        self.send_empty(Method::PATCH, "channels", query.pairs(), Some(request))
            .await
    }

    /// Starts a raid. It goes through after about a minute unless cancelled.
    pub async fn start_raid(&self, request: &StartRaidRequest) -> Result<RaidStarted, HelixError> {
        let response: DataResponse<RaidStarted> = self
            .send_json(Method::POST, "raids", &[], Some(request))
            .await?;
        response.into_first("start raid")
    }

    /// Captures a clip of the live stream of `broadcaster_id`.
    pub async fn create_clip(&self, broadcaster_id: &str) -> Result<CreatedClip, HelixError> {
        let query = Query::new().push("broadcaster_id", broadcaster_id);
        let response: DataResponse<CreatedClip> = self
            .send_json(Method::POST, "clips", query.pairs(), NO_BODY)
            .await?;
        response.into_first("create clip")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{GetStreamsRequest, ModifyChannelInformationRequest, Stream};
    use crate::helix::DataResponse;

    #[test]
    fn streams_query_repeats_list_keys_in_order() {
        let request = GetStreamsRequest {
            user_logins: vec!["alpha".to_string(), "beta".to_string()],
            kind: Some("live".to_string()),
            first: Some(5),
            ..GetStreamsRequest::default()
        };

        let query = request.query();
        assert_eq!(
            query.pairs(),
            &[
                ("user_login", "alpha".to_string()),
                ("user_login", "beta".to_string()),
                ("type", "live".to_string()),
                ("first", "5".to_string()),
            ]
        );
    }

    #[test]
    fn empty_modify_request_is_detected() {
        assert!(ModifyChannelInformationRequest::default().is_empty());

        let request = ModifyChannelInformationRequest {
            title: Some("new title".to_string()),
            ..ModifyChannelInformationRequest::default()
        };
        assert!(!request.is_empty());
        assert_eq!(
            serde_json::to_value(&request).expect("serialize"),
            json!({ "title": "new title" })
        );
    }

    #[test]
    fn stream_page_parses() {
        let body = json!({
            "data": [{
                "id": "40952121085",
                "user_id": "101051819",
                "user_login": "afro",
                "user_name": "Afro",
                "game_id": "32982",
                "game_name": "Grand Theft Auto V",
                "type": "live",
                "title": "Jacob: Digital Den Laptops & Routers",
                "tags": ["English"],
                "viewer_count": 1490,
                "started_at": "2021-03-10T03:18:11Z",
                "language": "en",
                "thumbnail_url": "https://static-cdn.jtvnw.net/previews-ttv/live_user_afro-{width}x{height}.jpg",
                "tag_ids": [],
                "is_mature": false
            }],
            "pagination": { "cursor": "eyJiIjp7IkN1cnNvciI6ImV5SnpJam8zT0RNMk5TNDBORFF4TlRjMU1UY3hOU3dpWkNJNlptRnNjMlVzSW5RaU9uUnlkV1Y5In0sImEiOnsiQ3Vyc29yIjoiZXlKeklqb3hOVGd6TGpJMk5qZzBOVEkwTmpJeU9ETXNJbVFpT21aaGJITmxMQ0owSWpwMGNuVmxmUT09In19" }
        });

        let parsed: DataResponse<Stream> = serde_json::from_value(body).expect("parse");
        assert_eq!(parsed.data[0].kind, "live");
        assert_eq!(parsed.data[0].viewer_count, 1490);
    }
}
