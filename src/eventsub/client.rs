//! EventSub websocket client and connection loop.
//!
//! The worker owns exactly one websocket at a time. A server reconnect
//! instruction moves it to a new address while the event channel stays
//! open; any transport failure ends the channel.

use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::eventsub::events::EventPayload;
use crate::eventsub::proto::{
    classify, decode_envelope, decode_kind, extract_event, Envelope, ExtractError, MessageKind,
};
use crate::eventsub::session::{Session, SessionStore};

/// Production websocket endpoint for EventSub.
pub const EVENTSUB_ENDPOINT: &str = "wss://eventsub.wss.twitch.tv/ws";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EventSubDefaults;

impl EventSubDefaults {
    /// Events buffered before the connection loop stops reading.
    pub const EVENT_CAPACITY: usize = 64;
}

/// Entry point for creating EventSub connections.
#[derive(Clone, Debug)]
pub struct EventSubClient {
    endpoint: String,
    event_capacity: usize,
    keepalive_grace: Option<Duration>,
}

impl Default for EventSubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubClient {
    /// Creates a client targeting the production endpoint.
    pub fn new() -> Self {
        Self {
            endpoint: EVENTSUB_ENDPOINT.to_string(),
            event_capacity: EventSubDefaults::EVENT_CAPACITY,
            keepalive_grace: None,
        }
    }

    /// Sets an explicit bootstrap endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.endpoint = endpoint.trim_end().to_string();
        self
    }

    /// Sets how many events may queue before the loop blocks on the consumer.
    ///
    /// A consumer that stops draining stalls reading from the socket, which
    /// eventually trips the server's own keepalive timeout.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Treats `keepalive_timeout + grace` without any frame as a fatal
    /// transport failure.
    ///
    /// Disabled by default. Only applies once a welcome has reported a
    /// keepalive timeout.
    pub fn with_keepalive_watchdog(mut self, grace: Duration) -> Self {
        self.keepalive_grace = Some(grace);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Opens an EventSub connection.
    ///
    /// This spawns a background worker that owns the websocket and returns
    /// once the first dial has succeeded. A failed first dial is returned
    /// here; later failures end the event channel and are reported by
    /// [`EventSubHandle::join`] or [`EventSubHandle::shutdown`].
    pub async fn connect(&self) -> Result<EventSubConnection, EventSubError> {
        let (events_tx, events_rx) = mpsc::channel(self.event_capacity);
        let (ready_tx, ready_rx) = oneshot::channel();
        let session = SessionStore::new(Session::bootstrap(self.endpoint.clone()));
        let cancel = CancellationToken::new();

        let worker = ConnectionWorker {
            store: session.clone(),
            events: events_tx,
            cancel: cancel.clone(),
            keepalive_grace: self.keepalive_grace,
        };
        let task = tokio::spawn(worker.run(Some(ready_tx)));

        match ready_rx.await {
            Ok(Ok(())) => Ok(EventSubConnection {
                events: events_rx,
                handle: EventSubHandle {
                    session,
                    cancel: cancel.clone(),
                    guard: cancel.drop_guard(),
                    task,
                },
            }),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(EventSubError::Protocol(
                "eventsub worker stopped before initial connect".to_string(),
            )),
        }
    }

    /// Runs the connection loop on the current task until it terminates.
    ///
    /// The loop dials this client's endpoint and keeps `session` current.
    /// `events` is dropped (closing the channel) on every exit path.
    /// Cancelling `cancel` is a clean shutdown and returns `Ok(())`.
    pub async fn run(
        &self,
        session: SessionStore,
        events: mpsc::Sender<Event>,
        cancel: CancellationToken,
    ) -> Result<(), EventSubError> {
        session.set_reconnect_url(self.endpoint.clone());
        ConnectionWorker {
            store: session,
            events,
            cancel,
            keepalive_grace: self.keepalive_grace,
        }
        .run(None)
        .await
    }
}

/// Published unit of the event channel.
///
/// Carries the raw frame so the consumer decides which payload shape to
/// decode notifications into.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub kind: MessageKind,
    /// Subscription type for notifications and revocations.
    pub subscription_type: Option<String>,
    /// Undecoded frame bytes.
    pub data: Bytes,
}

impl Event {
    /// Wire value of the message kind.
    pub fn message_type(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Decodes the full envelope.
    pub fn envelope(&self) -> Result<Envelope, EventSubError> {
        decode_kind(&self.data, self.kind).map_err(EventSubError::Json)
    }

    /// Decodes the notification's inner event into `T`.
    pub fn decode<T>(&self) -> Result<T, ExtractError>
    where
        T: DeserializeOwned,
    {
        extract_event(&self.data)
    }

    /// Decodes into `T` only when the subscription type matches `T`.
    pub fn decode_matching<T>(&self) -> Option<Result<T, ExtractError>>
    where
        T: EventPayload,
    {
        (self.subscription_type.as_deref() == Some(T::SUBSCRIPTION_TYPE)).then(|| self.decode())
    }
}

/// Active EventSub connection: the event channel plus its control handle.
#[derive(Debug)]
pub struct EventSubConnection {
    events: mpsc::Receiver<Event>,
    handle: EventSubHandle,
}

impl EventSubConnection {
    /// Receives the next event. `None` once the connection loop has ended.
    pub async fn recv(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Returns the shared session store.
    pub fn session(&self) -> SessionStore {
        self.handle.session()
    }

    /// Splits into the raw event receiver and the control handle.
    pub fn split(self) -> (mpsc::Receiver<Event>, EventSubHandle) {
        (self.events, self.handle)
    }

    /// Stops the connection loop and returns its final result.
    pub async fn shutdown(self) -> Result<(), EventSubError> {
        self.handle.shutdown().await
    }

    /// Waits for the loop to terminate on its own, discarding unread events.
    pub async fn join(mut self) -> Result<(), EventSubError> {
        while self.events.recv().await.is_some() {}
        self.handle.join().await
    }
}

/// Control side of an [`EventSubConnection`].
///
/// Dropping the handle cancels the connection loop.
#[derive(Debug)]
pub struct EventSubHandle {
    session: SessionStore,
    cancel: CancellationToken,
    guard: DropGuard,
    task: JoinHandle<Result<(), EventSubError>>,
}

impl EventSubHandle {
    pub fn session(&self) -> SessionStore {
        self.session.clone()
    }

    /// Token that stops the connection loop when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancels the loop and waits for it to release the socket.
    pub async fn shutdown(self) -> Result<(), EventSubError> {
        self.cancel.cancel();
        self.join().await
    }

    /// Waits for the loop to terminate on its own.
    ///
    /// A failed redial after a server reconnect instruction surfaces here.
    pub async fn join(self) -> Result<(), EventSubError> {
        let EventSubHandle { guard, task, .. } = self;
        let _ = guard.disarm();
        task.await
            .map_err(|err| EventSubError::Protocol(format!("eventsub worker failed: {err}")))?
    }
}

/// Errors produced by EventSub transport and protocol handling.
#[derive(Debug, Error)]
pub enum EventSubError {
    /// The first dial failed.
    #[error("failed to connect to {url}: {source}")]
    Dial {
        url: String,
        #[source]
        source: WsError,
    },

    /// Dialing the address from a server reconnect instruction failed.
    #[error("failed to reconnect to {url}: {source}")]
    Redial {
        url: String,
        #[source]
        source: WsError,
    },

    /// Websocket transport error while reading or answering a ping.
    #[error("websocket error: {0}")]
    WebSocket(#[from] WsError),

    /// The server closed the connection or the stream ended.
    #[error("connection closed (code {code:?}): {reason}")]
    Closed { code: Option<u16>, reason: String },

    /// No frame arrived within the keepalive window.
    #[error("no message received within {0:?}")]
    KeepaliveTimeout(Duration),

    /// JSON deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Protocol contract or worker bookkeeping error.
    #[error("protocol error: {0}")]
    Protocol(String),
}

enum SessionOutcome {
    Shutdown,
    Reconnect(String),
}

#[derive(Debug, PartialEq)]
enum Dispatch {
    Publish(Event),
    Reconnect { event: Event, url: String },
}

struct ConnectionWorker {
    store: SessionStore,
    events: mpsc::Sender<Event>,
    cancel: CancellationToken,
    keepalive_grace: Option<Duration>,
}

impl ConnectionWorker {
    async fn run(
        self,
        mut ready_tx: Option<oneshot::Sender<Result<(), EventSubError>>>,
    ) -> Result<(), EventSubError> {
        let mut url = self.store.reconnect_url();
        let mut redial = false;

        loop {
            let socket = match self.dial(&url).await {
                Ok(Some(socket)) => socket,
                Ok(None) => return Ok(()),
                Err(source) => {
                    warn!(event = "eventsub_dial_failed", url = %url, redial, error = %source);
                    let err = if redial {
                        EventSubError::Redial { url, source }
                    } else {
                        EventSubError::Dial { url, source }
                    };
                    return match ready_tx.take() {
                        Some(tx) => {
                            let _ = tx.send(Err(err));
                            Ok(())
                        }
                        None => Err(err),
                    };
                }
            };

            if let Some(tx) = ready_tx.take() {
                let _ = tx.send(Ok(()));
            }

            match self.read_session(socket, &url).await {
                Ok(SessionOutcome::Reconnect(next)) => {
                    url = next;
                    redial = true;
                }
                Ok(SessionOutcome::Shutdown) => {
                    info!(event = "eventsub_shutdown", url = %url);
                    return Ok(());
                }
                Err(err) => {
                    warn!(event = "eventsub_connection_failed", url = %url, error = %err);
                    return Err(err);
                }
            }
        }
    }

    async fn dial(&self, url: &str) -> Result<Option<Socket>, WsError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Ok(None),
            result = connect_async(url) => result.map(|(socket, _)| Some(socket)),
        }
    }

    async fn read_session(
        &self,
        mut socket: Socket,
        url: &str,
    ) -> Result<SessionOutcome, EventSubError> {
        info!(event = "eventsub_connected", url = %url);

        loop {
            let silence_limit = self.silence_limit();
            let frame = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    let _ = socket.close(None).await;
                    return Ok(SessionOutcome::Shutdown);
                }
                next = next_message(&mut socket, silence_limit) => match next? {
                    Some(Ok(Message::Text(text))) => Bytes::from(text),
                    Some(Ok(Message::Binary(data))) => Bytes::from(data),
                    Some(Ok(Message::Ping(payload))) => {
                        debug!(event = "eventsub_ping", url = %url);
                        socket.send(Message::Pong(payload)).await?;
                        continue;
                    }
                    Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => continue,
                    Some(Ok(Message::Close(frame))) => {
                        return Err(match frame {
                            Some(frame) => EventSubError::Closed {
                                code: Some(u16::from(frame.code)),
                                reason: frame.reason.into_owned(),
                            },
                            None => EventSubError::Closed {
                                code: None,
                                reason: String::new(),
                            },
                        });
                    }
                    Some(Err(err)) => return Err(EventSubError::WebSocket(err)),
                    None => {
                        return Err(EventSubError::Closed {
                            code: None,
                            reason: "stream ended".to_string(),
                        });
                    }
                },
            };

            match dispatch_frame(frame, &self.store, url) {
                None => {}
                Some(Dispatch::Publish(event)) => {
                    if !self.publish(event).await {
                        let _ = socket.close(None).await;
                        return Ok(SessionOutcome::Shutdown);
                    }
                }
                Some(Dispatch::Reconnect { event, url: next }) => {
                    if !self.publish(event).await {
                        let _ = socket.close(None).await;
                        return Ok(SessionOutcome::Shutdown);
                    }
                    if let Err(err) = socket.close(None).await {
                        debug!(event = "eventsub_close_failed", url = %url, error = %err);
                    }
                    return Ok(SessionOutcome::Reconnect(next));
                }
            }
        }
    }

    /// Blocks until the consumer accepts the event.
    ///
    /// Returns false when the loop should stop: cancelled, or the consumer
    /// dropped its receiver.
    async fn publish(&self, event: Event) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            result = self.events.send(event) => {
                if result.is_err() {
                    debug!(event = "eventsub_consumer_dropped");
                }
                result.is_ok()
            }
        }
    }

    fn silence_limit(&self) -> Option<Duration> {
        let grace = self.keepalive_grace?;
        self.store
            .read()
            .keepalive_timeout
            .map(|timeout| timeout + grace)
    }
}

async fn next_message(
    socket: &mut Socket,
    silence_limit: Option<Duration>,
) -> Result<Option<Result<Message, WsError>>, EventSubError> {
    match silence_limit {
        Some(limit) => tokio::time::timeout(limit, socket.next())
            .await
            .map_err(|_| EventSubError::KeepaliveTimeout(limit)),
        None => Ok(socket.next().await),
    }
}

/// Classifies and decodes one data frame, applying its session effects.
///
/// Malformed frames and unknown message kinds are logged and skipped.
fn dispatch_frame(frame: Bytes, store: &SessionStore, current_url: &str) -> Option<Dispatch> {
    let message_type = match classify(&frame) {
        Ok(message_type) => message_type,
        Err(err) => {
            warn!(event = "eventsub_frame_decode_failed", error = %err);
            return None;
        }
    };

    let envelope = match decode_envelope(&frame, &message_type) {
        Ok(Some(envelope)) => envelope,
        Ok(None) => {
            warn!(event = "eventsub_unknown_message_type", message_type = %message_type);
            return None;
        }
        Err(err) => {
            warn!(
                event = "eventsub_envelope_decode_failed",
                message_type = %message_type,
                error = %err
            );
            return None;
        }
    };

    let metadata = envelope.metadata();
    debug!(
        event = "eventsub_message",
        message_id = %metadata.message_id,
        message_type = %message_type
    );
    let event = Event {
        kind: envelope.kind(),
        subscription_type: metadata.subscription_type.clone(),
        data: frame,
    };

    match envelope {
        Envelope::Welcome(message) => {
            store.replace(Session::from_welcome(message.payload.session, current_url));
            Some(Dispatch::Publish(event))
        }
        Envelope::Reconnect(message) => match message.payload.session.reconnect_url {
            Some(url) => {
                info!(event = "eventsub_reconnect_requested", url = %url);
                store.set_reconnect_url(url.clone());
                Some(Dispatch::Reconnect { event, url })
            }
            None => {
                warn!(
                    event = "eventsub_reconnect_missing_url",
                    message_id = %message.metadata.message_id
                );
                None
            }
        },
        Envelope::Keepalive(_) | Envelope::Notification(_) | Envelope::Revocation(_) => {
            Some(Dispatch::Publish(event))
        }
    }
}
