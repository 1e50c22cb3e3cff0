//! Channel points custom rewards.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::helix::{DataResponse, HelixClient, HelixError, Query, NO_BODY};

/// Body for creating or updating a reward. Unset fields are left out, so an
/// update only touches what is set. `title` and `cost` are required on
/// create.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomRewardRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_user_input_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_max_per_stream_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_per_stream: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_max_per_user_per_stream_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_per_user_per_stream: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_global_cooldown_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_cooldown_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_paused: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_redemptions_skip_request_queue: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GetCustomRewardsRequest {
    pub broadcaster_id: String,
    pub reward_ids: Vec<String>,
    /// Only rewards created by this client id.
    pub only_manageable_rewards: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CustomReward {
    pub broadcaster_id: String,
    pub broadcaster_login: String,
    pub broadcaster_name: String,
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub prompt: String,
    pub cost: u64,
    #[serde(default)]
    pub image: Option<RewardImage>,
    pub default_image: RewardImage,
    pub background_color: String,
    pub is_enabled: bool,
    pub is_user_input_required: bool,
    pub max_per_stream_setting: MaxPerStreamSetting,
    pub max_per_user_per_stream_setting: MaxPerUserPerStreamSetting,
    pub global_cooldown_setting: GlobalCooldownSetting,
    pub is_paused: bool,
    pub is_in_stock: bool,
    pub should_redemptions_skip_request_queue: bool,
    #[serde(default)]
    pub redemptions_redeemed_current_stream: Option<u64>,
    #[serde(default)]
    pub cooldown_expires_at: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewardImage {
    pub url_1x: String,
    pub url_2x: String,
    pub url_4x: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MaxPerStreamSetting {
    pub is_enabled: bool,
    pub max_per_stream: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MaxPerUserPerStreamSetting {
    pub is_enabled: bool,
    pub max_per_user_per_stream: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlobalCooldownSetting {
    pub is_enabled: bool,
    pub global_cooldown_seconds: u64,
}

impl HelixClient {
    pub async fn create_custom_reward(
        &self,
        broadcaster_id: &str,
        request: &CustomRewardRequest,
    ) -> Result<CustomReward, HelixError> {
        if request.title.is_none() || request.cost.is_none() {
            return Err(HelixError::InvalidRequest(
                "new rewards need a title and a cost".to_string(),
            ));
        }

        let query = Query::new().push("broadcaster_id", broadcaster_id);
        let response: DataResponse<CustomReward> = self
            .send_json(
                Method::POST,
                "channel_points/custom_rewards",
                query.pairs(),
                Some(request),
            )
            .await?;
        response.into_first("create custom reward")
    }

    pub async fn update_custom_reward(
        &self,
        broadcaster_id: &str,
        reward_id: &str,
        request: &CustomRewardRequest,
    ) -> Result<CustomReward, HelixError> {
        let query = Query::new()
            .push("broadcaster_id", broadcaster_id)
            .push("id", reward_id);
        let response: DataResponse<CustomReward> = self
            .send_json(
                Method::PATCH,
                "channel_points/custom_rewards",
                query.pairs(),
                Some(request),
            )
            .await?;
        response.into_first("update custom reward")
    }

    pub async fn get_custom_rewards(
        &self,
        request: &GetCustomRewardsRequest,
    ) -> Result<Vec<CustomReward>, HelixError> {
        let query = Query::new()
            .push("broadcaster_id", &request.broadcaster_id)
            .push_all("id", &request.reward_ids)
            .push("only_manageable_rewards", request.only_manageable_rewards);

        let response: DataResponse<CustomReward> = self
            .send_json(
                Method::GET,
                "channel_points/custom_rewards",
                query.pairs(),
                NO_BODY,
            )
            .await?;
        Ok(response.data)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CustomReward, CustomRewardRequest};

    #[test]
    fn update_body_only_carries_set_fields() {
        let request = CustomRewardRequest {
            is_paused: Some(true),
            ..CustomRewardRequest::default()
        };
        assert_eq!(
            serde_json::to_value(&request).expect("serialize"),
            json!({ "is_paused": true })
        );
    }

    #[test]
    fn reward_parses_nested_settings() {
        let body = json!({
            "broadcaster_name": "torpedo09",
            "broadcaster_login": "torpedo09",
            "broadcaster_id": "274637212",
            "id": "afaa7e34-6b17-49f0-a19a-d1e76eaaf673",
            "image": null,
            "background_color": "#00E5CB",
            "is_enabled": true,
            "cost": 50000,
            "title": "game analysis 1v1",
            "prompt": "",
            "is_user_input_required": false,
            "max_per_stream_setting": { "is_enabled": false, "max_per_stream": 0 },
            "max_per_user_per_stream_setting": { "is_enabled": false, "max_per_user_per_stream": 0 },
            "global_cooldown_setting": { "is_enabled": false, "global_cooldown_seconds": 0 },
            "is_paused": false,
            "is_in_stock": true,
            "default_image": {
                "url_1x": "https://static-cdn.jtvnw.net/custom-reward-images/default-1.png",
                "url_2x": "https://static-cdn.jtvnw.net/custom-reward-images/default-2.png",
                "url_4x": "https://static-cdn.jtvnw.net/custom-reward-images/default-4.png"
            },
            "should_redemptions_skip_request_queue": false,
            "redemptions_redeemed_current_stream": null,
            "cooldown_expires_at": null
        });

        let reward: CustomReward = serde_json::from_value(body).expect("parse");
        assert_eq!(reward.cost, 50000);
        assert_eq!(reward.image, None);
        assert!(!reward.global_cooldown_setting.is_enabled);
    }
}
