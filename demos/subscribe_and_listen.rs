//! Opens an EventSub session, registers `stream.online` and
//! `channel.chat.message` for one broadcaster through Helix, then prints
//! matching events until the connection ends.
//!
//! Before running, replace the placeholders below. The token needs the
//! `user:read:chat` scope for chat messages.

use std::error::Error;

use secrecy::SecretString;
use tracing_subscriber::EnvFilter;
use twitch_sdk::eventsub::events::{ChannelChatMessageEvent, StreamOnlineEvent};
use twitch_sdk::eventsub::{EventSubClient, MessageKind};
use twitch_sdk::helix::{ChannelChatMessageCondition, HelixClient, StreamOnlineCondition};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client_id = "REPLACE_WITH_CLIENT_ID".to_string();
    let token = "REPLACE_WITH_USER_ACCESS_TOKEN".to_string();
    let broadcaster_id = "REPLACE_WITH_BROADCASTER_ID".to_string();
    let user_id = "REPLACE_WITH_TOKEN_USER_ID".to_string();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let helix = HelixClient::new(client_id, SecretString::new(token))?;
        let mut connection = EventSubClient::new().connect().await?;
        let session = connection.session();
        let mut subscribed = false;

        while let Some(event) = connection.recv().await {
            match event.kind {
                // Subscriptions follow the session across reconnects, so only
                // the first welcome needs them.
                MessageKind::Welcome if !subscribed => {
                    let session_id = session.session_id();
                    helix
                        .subscribe::<StreamOnlineEvent>(
                            &StreamOnlineCondition {
                                broadcaster_user_id: broadcaster_id.clone(),
                            },
                            &session_id,
                        )
                        .await?;
                    helix
                        .subscribe::<ChannelChatMessageEvent>(
                            &ChannelChatMessageCondition {
                                broadcaster_user_id: broadcaster_id.clone(),
                                user_id: user_id.clone(),
                            },
                            &session_id,
                        )
                        .await?;
                    println!("subscribed on session {session_id}");
                    subscribed = true;
                }
                MessageKind::Notification => {
                    if let Some(online) = event.decode_matching::<StreamOnlineEvent>() {
                        let online = online?;
                        println!(
                            "{} went live at {}",
                            online.broadcaster_user_name, online.started_at
                        );
                    } else if let Some(chat) =
                        event.decode_matching::<ChannelChatMessageEvent>()
                    {
                        let chat = chat?;
                        println!("<{}> {}", chat.chatter_user_name, chat.message.text);
                    }
                }
                MessageKind::Revocation => {
                    println!(
                        "subscription revoked: {}",
                        event.subscription_type.as_deref().unwrap_or("unknown")
                    );
                }
                MessageKind::Welcome | MessageKind::Keepalive | MessageKind::Reconnect => {}
            }
        }

        connection.shutdown().await?;
        Ok::<(), Box<dyn Error>>(())
    })
}
