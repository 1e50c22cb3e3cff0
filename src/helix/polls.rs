use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::helix::{DataResponse, HelixClient, HelixError};

const MIN_CHOICES: usize = 2;
const MAX_CHOICES: usize = 5;
const MIN_DURATION_SECS: u32 = 15;
const MAX_DURATION_SECS: u32 = 1800;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CreatePollRequest {
    pub broadcaster_id: String,
    pub title: String,
    pub choices: Vec<PollChoice>,
    /// Seconds, 15 to 1800.
    pub duration: u32,
    #[serde(default)]
    pub channel_points_voting_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_points_per_vote: Option<u32>,
}

impl CreatePollRequest {
    fn validate(&self) -> Result<(), HelixError> {
        if !(MIN_CHOICES..=MAX_CHOICES).contains(&self.choices.len()) {
            return Err(HelixError::InvalidRequest(format!(
                "poll needs {MIN_CHOICES} to {MAX_CHOICES} choices, got {}",
                self.choices.len()
            )));
        }
        if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&self.duration) {
            return Err(HelixError::InvalidRequest(format!(
                "poll duration must be {MIN_DURATION_SECS}..={MAX_DURATION_SECS}s, got {}",
                self.duration
            )));
        }
        if self.channel_points_voting_enabled && self.channel_points_per_vote.is_none() {
            return Err(HelixError::InvalidRequest(
                "channel points voting needs channel_points_per_vote".to_string(),
            ));
        }
        Ok(())
    }
}

/// A poll option. Only `title` is sent; the rest is filled by Twitch.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PollChoice {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing)]
    pub votes: u64,
    #[serde(default, skip_serializing)]
    pub channel_points_votes: u64,
    #[serde(default, skip_serializing)]
    pub bits_votes: u64,
}

impl PollChoice {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Poll {
    pub id: String,
    pub broadcaster_id: String,
    pub broadcaster_name: String,
    pub broadcaster_login: String,
    pub title: String,
    pub choices: Vec<PollChoice>,
    #[serde(default)]
    pub channel_points_voting_enabled: bool,
    #[serde(default)]
    pub channel_points_per_vote: u64,
    /// `ACTIVE`, `COMPLETED`, `TERMINATED` and so on.
    pub status: String,
    pub duration: u32,
    pub started_at: DateTime<Utc>,
}

impl HelixClient {
    pub async fn create_poll(&self, request: &CreatePollRequest) -> Result<Poll, HelixError> {
        request.validate()?;

        let response: DataResponse<Poll> = self
            .send_json(Method::POST, "polls", &[], Some(request))
            .await?;
        response.into_first("create poll")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CreatePollRequest, PollChoice};
    use crate::helix::HelixError;

    fn request(choices: usize, duration: u32) -> CreatePollRequest {
        CreatePollRequest {
            broadcaster_id: "141981764".to_string(),
            title: "Heads or Tails?".to_string(),
            choices: (0..choices)
                .map(|n| PollChoice::new(format!("choice {n}")))
                .collect(),
            duration,
            channel_points_voting_enabled: false,
            channel_points_per_vote: None,
        }
    }

    #[test]
    fn validate_bounds() {
        assert!(request(2, 15).validate().is_ok());
        assert!(request(5, 1800).validate().is_ok());
        assert!(matches!(
            request(1, 60).validate(),
            Err(HelixError::InvalidRequest(_))
        ));
        assert!(matches!(
            request(6, 60).validate(),
            Err(HelixError::InvalidRequest(_))
        ));
        assert!(matches!(
            request(2, 10).validate(),
            Err(HelixError::InvalidRequest(_))
        ));
    }

    #[test]
    fn choices_serialize_title_only() {
        let value = serde_json::to_value(PollChoice::new("Heads")).expect("serialize");
        assert_eq!(value, json!({ "title": "Heads" }));
    }
}
