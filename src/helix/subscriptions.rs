//! Channel subscriber lookups. Not to be confused with EventSub
//! subscriptions.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::helix::{DataResponse, HelixClient, HelixError, Pagination, Query, NO_BODY};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserSubscription {
    pub broadcaster_id: String,
    pub broadcaster_login: String,
    pub broadcaster_name: String,
    /// `1000`, `2000` or `3000`.
    pub tier: String,
    pub is_gift: bool,
    #[serde(default)]
    pub gifter_id: Option<String>,
    #[serde(default)]
    pub gifter_login: Option<String>,
    #[serde(default)]
    pub gifter_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetBroadcasterSubscriptionsRequest {
    pub broadcaster_id: String,
    /// Up to 100 users. Empty lists every subscriber.
    pub user_ids: Vec<String>,
    pub first: Option<u32>,
    pub after: Option<String>,
    pub before: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Subscriber {
    pub broadcaster_id: String,
    pub broadcaster_login: String,
    pub broadcaster_name: String,
    pub user_id: String,
    pub user_login: String,
    pub user_name: String,
    pub tier: String,
    #[serde(default)]
    pub plan_name: String,
    pub is_gift: bool,
    #[serde(default)]
    pub gifter_id: Option<String>,
    #[serde(default)]
    pub gifter_login: Option<String>,
    #[serde(default)]
    pub gifter_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BroadcasterSubscriptions {
    pub data: Vec<Subscriber>,
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub points: u64,
    #[serde(default)]
    pub total: u64,
}

impl HelixClient {
    /// Returns the subscription of `user_id` to `broadcaster_id`.
    ///
    /// Twitch answers 404 when the user is not subscribed; that is mapped
    /// to `Ok(None)`.
    pub async fn check_user_subscription(
        &self,
        broadcaster_id: &str,
        user_id: &str,
    ) -> Result<Option<UserSubscription>, HelixError> {
        let query = Query::new()
            .push("broadcaster_id", broadcaster_id)
            .push("user_id", user_id);

        let result: Result<DataResponse<UserSubscription>, HelixError> = self
            .send_json(Method::GET, "subscriptions/user", query.pairs(), NO_BODY)
            .await;

        match result {
            Ok(response) => Ok(response.data.into_iter().next()),
            Err(err) if err.status() == Some(reqwest::StatusCode::NOT_FOUND) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn get_broadcaster_subscriptions(
        &self,
        request: &GetBroadcasterSubscriptionsRequest,
    ) -> Result<BroadcasterSubscriptions, HelixError> {
        let query = Query::new()
            .push("broadcaster_id", &request.broadcaster_id)
            .push_all("user_id", &request.user_ids)
            .push_opt("first", request.first)
            .push_opt("after", request.after.as_deref())
            .push_opt("before", request.before.as_deref());

        self.send_json(Method::GET, "subscriptions", query.pairs(), NO_BODY)
            .await
    }
}
