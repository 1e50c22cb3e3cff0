use std::error::Error;

use secrecy::SecretString;
use tracing_subscriber::EnvFilter;
use twitch_sdk::helix::{HelixClient, SendChatMessageRequest};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client_id = "REPLACE_WITH_CLIENT_ID".to_string();
    let token = "REPLACE_WITH_USER_ACCESS_TOKEN".to_string();
    let broadcaster_id = "REPLACE_WITH_BROADCASTER_ID".to_string();
    let sender_id = "REPLACE_WITH_TOKEN_USER_ID".to_string();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let helix = HelixClient::new(client_id, SecretString::new(token))?;
        let response = helix
            .send_chat_message(&SendChatMessageRequest::new(
                broadcaster_id,
                sender_id,
                "hello from twitch-sdk",
            ))
            .await?;

        match response.drop_reason {
            Some(reason) => println!("dropped code={} message={}", reason.code, reason.message),
            None => println!("sent message_id={}", response.message_id),
        }

        Ok::<(), Box<dyn Error>>(())
    })
}
