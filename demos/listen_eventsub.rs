//! Prints every message received on an EventSub websocket session.
//!
//! With no subscriptions registered the server only sends the welcome and
//! keepalives; see `subscribe_and_listen` for registering subscriptions.
//! Set `RUST_LOG=twitch_sdk=debug` to see the connection loop's logs.

use std::error::Error;

use tracing_subscriber::EnvFilter;
use twitch_sdk::eventsub::{EventSubClient, MessageKind};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let client = EventSubClient::new();
        let mut connection = client.connect().await?;
        let session = connection.session();

        while let Some(event) = connection.recv().await {
            match event.kind {
                MessageKind::Welcome => {
                    let snapshot = session.read();
                    println!(
                        "welcome session_id={} keepalive={:?}",
                        snapshot.id, snapshot.keepalive_timeout
                    );
                }
                MessageKind::Keepalive => println!("keepalive"),
                MessageKind::Reconnect => {
                    println!("reconnecting to {}", session.reconnect_url());
                }
                kind => println!(
                    "{kind} subscription_type={}",
                    event.subscription_type.as_deref().unwrap_or("-")
                ),
            }
        }

        connection.shutdown().await?;
        Ok::<(), Box<dyn Error>>(())
    })
}
