use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::helix::{DataResponse, HelixClient, HelixError, Query, NO_BODY};

/// Up to 100 ids and logins combined. Both empty returns the token owner.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GetUsersRequest {
    pub ids: Vec<String>,
    pub logins: Vec<String>,
}

impl GetUsersRequest {
    pub fn by_login(login: impl Into<String>) -> Self {
        Self {
            ids: Vec::new(),
            logins: vec![login.into()],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub login: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub broadcaster_type: String,
    pub description: String,
    pub profile_image_url: String,
    pub offline_image_url: String,
    /// Only present with the `user:read:email` scope.
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: String,
}

impl HelixClient {
    pub async fn get_users(&self, request: &GetUsersRequest) -> Result<Vec<User>, HelixError> {
        let query = Query::new()
            .push_all("id", &request.ids)
            .push_all("login", &request.logins);

        let response: DataResponse<User> = self
            .send_json(Method::GET, "users", query.pairs(), NO_BODY)
            .await?;
        Ok(response.data)
    }
}
