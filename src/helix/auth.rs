//! OAuth token refresh against the Twitch identity endpoint.
//!
//! A successful call swaps the bearer token on the client (and every clone
//! of it) before returning.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::info;

use crate::helix::{read_response, HelixClient, HelixError};

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct UserAccessToken {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until `access_token` expires.
    pub expires_in: u64,
    #[serde(default)]
    pub scope: Vec<String>,
    pub token_type: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AppAccessToken {
    pub access_token: String,
    pub expires_in: u64,
    pub token_type: String,
}

impl HelixClient {
    /// Exchanges a refresh token for a new user access token.
    pub async fn refresh_user_token(
        &self,
        client_secret: &SecretString,
        refresh_token: &SecretString,
    ) -> Result<UserAccessToken, HelixError> {
        let form = [
            ("client_id", self.client_id()),
            ("client_secret", client_secret.expose_secret().as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.expose_secret().as_str()),
        ];

        let token: UserAccessToken = self.token_request(&form).await?;
        self.set_token(SecretString::new(token.access_token.clone()));
        info!(
            event = "helix_user_token_refreshed",
            expires_in = token.expires_in
        );
        Ok(token)
    }

    /// Obtains an app access token with the client credentials grant.
    pub async fn app_access_token(
        &self,
        client_secret: &SecretString,
    ) -> Result<AppAccessToken, HelixError> {
        let form = [
            ("client_id", self.client_id()),
            ("client_secret", client_secret.expose_secret().as_str()),
            ("grant_type", "client_credentials"),
        ];

        let token: AppAccessToken = self.token_request(&form).await?;
        self.set_token(SecretString::new(token.access_token.clone()));
        info!(
            event = "helix_app_token_issued",
            expires_in = token.expires_in
        );
        Ok(token)
    }

    async fn token_request<T>(&self, form: &[(&str, &str)]) -> Result<T, HelixError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http
            .post(&self.auth_url)
            .timeout(self.request_timeout)
            .form(form)
            .send()
            .await
            .map_err(HelixError::Transport)?;

        let body = read_response(response).await?;
        serde_json::from_str(&body).map_err(|err| HelixError::Parse(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::UserAccessToken;

    #[test]
    fn user_token_parses_scope_list() {
        let body = r#"{"access_token":"1ssjqsqfy6bads1ws7m03gras79zfr","refresh_token":"eyJfMzUtNDU0OC4MWYwLTQ5MDY5ODY4NGNlMSJ9%asdfasdf=",
            "expires_in":14124,"scope":["channel:read:subscriptions","chat:read"],"token_type":"bearer"}"#;
        let token: UserAccessToken = serde_json::from_str(body).expect("parse");
        assert_eq!(token.scope.len(), 2);
        assert_eq!(token.token_type, "bearer");
    }
}
