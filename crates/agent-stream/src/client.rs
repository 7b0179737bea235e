//! WebSocket stream client.

use crate::backoff::reconnect_delay_secs;
use crate::messages::{EventName, Frame};
use crate::{StreamError, StreamResult};
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, oneshot, watch, Mutex, RwLock};
use tokio::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Stream client configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Stream endpoint URL (e.g., ws://localhost:8080/stream).
    pub url: String,
    /// Device serial number used for registration.
    pub serial_number: String,
    /// Device type reported during registration.
    pub device_type: String,
    /// Base reconnect delay in seconds.
    pub reconnect_base_delay_secs: u64,
    /// Maximum reconnect delay in seconds.
    pub reconnect_max_delay_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8080/stream".to_string(),
            serial_number: "FW-DEVICE-12345".to_string(),
            device_type: "agricultural_sensor".to_string(),
            reconnect_base_delay_secs: 1,
            reconnect_max_delay_secs: 30,
        }
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Registered,
}

/// Events emitted by the stream client.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Connection established.
    Connected,
    /// Device registration confirmed by the server.
    Registered,
    /// Connection lost.
    Disconnected(Option<String>),
    /// Acknowledgment received for an emitted reading.
    Ack(Value),
    /// Server-side error event.
    ServerError(String),
}

/// WebSocket stream client with automatic reconnection.
///
/// The connection runs in a background task started by [`StreamClient::start`];
/// reconnect delays double from the base up to the cap and retries continue
/// until [`StreamClient::disconnect`] is called. Registration is sent on
/// every connect, and readings are refused until the server confirms it.
pub struct StreamClient {
    config: StreamConfig,
    state: Arc<RwLock<ConnectionState>>,
    sender: Arc<Mutex<Option<mpsc::Sender<Message>>>>,
    pending_ack: Arc<Mutex<Option<oneshot::Sender<Value>>>>,
    event_tx: broadcast::Sender<StreamEvent>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl StreamClient {
    /// Create a new stream client with the given configuration.
    pub fn new(config: StreamConfig) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            sender: Arc::new(Mutex::new(None)),
            pending_ack: Arc::new(Mutex::new(None)),
            event_tx,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Subscribe to stream events.
    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.event_tx.subscribe()
    }

    /// Get the current connection state.
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Check whether registration has completed.
    pub async fn is_registered(&self) -> bool {
        *self.state.read().await == ConnectionState::Registered
    }

    /// Start the connection loop in a background task.
    pub fn start(self: Arc<Self>) {
        tokio::spawn(async move { self.run().await });
    }

    /// Connection loop: connect, serve, back off, reconnect.
    async fn run(&self) {
        let mut shutdown = self.shutdown_rx.clone();
        let mut attempts: u32 = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            if let Err(e) = self.run_connection(&mut shutdown, &mut attempts).await {
                warn!(error = %e, "stream connection ended");
            }
            // A failed connect attempt leaves Connecting behind; backoff
            // always waits in Disconnected
            *self.state.write().await = ConnectionState::Disconnected;

            if *shutdown.borrow() {
                break;
            }

            attempts += 1;
            let delay = reconnect_delay_secs(
                attempts,
                self.config.reconnect_base_delay_secs,
                self.config.reconnect_max_delay_secs,
            );
            info!(attempt = attempts, delay_secs = delay, "scheduling stream reconnect");

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(delay)) => {}
                _ = shutdown.changed() => break,
            }
        }

        *self.state.write().await = ConnectionState::Disconnected;
        debug!("stream client stopped");
    }

    /// One connection lifetime: connect, register, serve until it drops.
    async fn run_connection(
        &self,
        shutdown: &mut watch::Receiver<bool>,
        attempts: &mut u32,
    ) -> StreamResult<()> {
        *self.state.write().await = ConnectionState::Connecting;
        info!(url = %self.config.url, "connecting to collection service");

        let (ws_stream, _) = tokio::select! {
            result = connect_async(&self.config.url) => result?,
            _ = shutdown.changed() => return Ok(()),
        };
        let (mut write, mut read) = ws_stream.split();

        *self.state.write().await = ConnectionState::Connected;
        *attempts = 0;
        let _ = self.event_tx.send(StreamEvent::Connected);

        // Register before any reading may be emitted
        let register = Frame::register_device(&self.config.serial_number, &self.config.device_type);
        let register_json = register.to_json()?;

        // Writer task drains the outbound channel
        let (msg_tx, mut msg_rx) = mpsc::channel::<Message>(64);
        *self.sender.lock().await = Some(msg_tx.clone());
        let writer = tokio::spawn(async move {
            while let Some(msg) = msg_rx.recv().await {
                if write.send(msg).await.is_err() {
                    break;
                }
            }
        });

        if let Err(e) = msg_tx.send(Message::Text(register_json.into())).await {
            writer.abort();
            *self.sender.lock().await = None;
            *self.state.write().await = ConnectionState::Disconnected;
            return Err(StreamError::Send(e.to_string()));
        }
        debug!(serial_number = %self.config.serial_number, "sent register_device");

        let result = self.read_loop(&mut read, &msg_tx, shutdown).await;

        writer.abort();
        *self.sender.lock().await = None;
        self.discard_pending().await;
        *self.state.write().await = ConnectionState::Disconnected;
        let _ = self.event_tx.send(StreamEvent::Disconnected(None));

        result
    }

    /// Process inbound frames until the connection drops or shutdown.
    async fn read_loop(
        &self,
        read: &mut SplitStream<WsStream>,
        msg_tx: &mpsc::Sender<Message>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> StreamResult<()> {
        loop {
            let msg = tokio::select! {
                msg = read.next() => msg,
                _ = shutdown.changed() => return Ok(()),
            };

            let Some(msg) = msg else {
                return Err(StreamError::Closed);
            };

            match msg {
                Ok(Message::Text(text)) => match Frame::from_json(&text) {
                    Ok(frame) => self.handle_frame(frame).await,
                    Err(e) => warn!(error = %e, "failed to parse stream frame"),
                },
                Ok(Message::Ping(data)) => {
                    let _ = msg_tx.send(Message::Pong(data)).await;
                }
                Ok(Message::Close(_)) => {
                    info!("stream closed by server");
                    return Err(StreamError::Closed);
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "websocket error");
                    return Err(e.into());
                }
            }
        }
    }

    /// Handle one inbound frame.
    async fn handle_frame(&self, frame: Frame) {
        match frame.event {
            EventName::Registered => {
                *self.state.write().await = ConnectionState::Registered;
                info!("device registered with collection service");
                let _ = self.event_tx.send(StreamEvent::Registered);
            }
            EventName::SensorDataAck => {
                let payload = frame.data.unwrap_or(Value::Null);
                // Single in-flight: the ack resolves the one outstanding delivery
                if let Some(tx) = self.pending_ack.lock().await.take() {
                    let _ = tx.send(payload.clone());
                } else {
                    debug!("acknowledgment with no outstanding delivery");
                }
                let _ = self.event_tx.send(StreamEvent::Ack(payload));
            }
            EventName::Error => {
                let detail = frame
                    .data
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "unknown server error".to_string());
                warn!(detail = %detail, "server error event");
                let _ = self.event_tx.send(StreamEvent::ServerError(detail));
            }
            other => {
                debug!(event = ?other, "ignoring unexpected inbound event");
            }
        }
    }

    /// Emit a `sensor_data` frame and return the acknowledgment receiver.
    ///
    /// Fails with [`StreamError::NotRegistered`] unless the server has
    /// confirmed registration, and with [`StreamError::DeliveryInFlight`]
    /// if a previous reading is still awaiting its acknowledgment.
    pub async fn emit_reading(&self, payload: Value) -> StreamResult<oneshot::Receiver<Value>> {
        if *self.state.read().await != ConnectionState::Registered {
            return Err(StreamError::NotRegistered);
        }

        let sender = self.sender.lock().await;
        let sender = sender.as_ref().ok_or(StreamError::NotConnected)?;

        let (ack_tx, ack_rx) = oneshot::channel();
        {
            let mut pending = self.pending_ack.lock().await;
            if pending.is_some() {
                return Err(StreamError::DeliveryInFlight);
            }
            *pending = Some(ack_tx);
        }

        let frame = Frame::sensor_data(payload);
        let json = frame.to_json()?;
        if let Err(e) = sender.send(Message::Text(json.into())).await {
            self.pending_ack.lock().await.take();
            return Err(StreamError::Send(e.to_string()));
        }

        debug!("emitted sensor_data frame");
        Ok(ack_rx)
    }

    /// Discard the outstanding acknowledgment wait, freeing the slot.
    ///
    /// Called by the delivery layer when it gives up on an acknowledgment
    /// (timeout), and internally on connection teardown. Dropping the
    /// sender wakes any waiter with an error.
    pub async fn discard_pending(&self) {
        self.pending_ack.lock().await.take();
    }

    /// Shut down the client, stopping reconnect attempts and releasing
    /// the connection. Always safe to call, in any state.
    pub async fn disconnect(&self) {
        let _ = self.shutdown_tx.send(true);
        *self.sender.lock().await = None;
        self.discard_pending().await;
        *self.state.write().await = ConnectionState::Disconnected;
        info!("stream client disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_config_default() {
        let config = StreamConfig::default();
        assert_eq!(config.url, "ws://localhost:8080/stream");
        assert_eq!(config.device_type, "agricultural_sensor");
        assert_eq!(config.reconnect_base_delay_secs, 1);
        assert_eq!(config.reconnect_max_delay_secs, 30);
    }

    #[tokio::test]
    async fn test_initial_state_is_disconnected() {
        let client = StreamClient::new(StreamConfig::default());
        assert_eq!(client.state().await, ConnectionState::Disconnected);
        assert!(!client.is_registered().await);
    }

    #[tokio::test]
    async fn test_emit_refused_before_registration() {
        let client = StreamClient::new(StreamConfig::default());
        let result = client.emit_reading(serde_json::json!({"temperature": 22.5})).await;

        assert!(matches!(result, Err(StreamError::NotRegistered)));
    }

    #[tokio::test]
    async fn test_disconnect_when_not_connected() {
        let client = StreamClient::new(StreamConfig::default());
        client.disconnect().await;
        assert_eq!(client.state().await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_failed_connect_backs_off_in_disconnected_state() {
        // Grab a port that nothing is listening on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Arc::new(StreamClient::new(StreamConfig {
            url: format!("ws://{addr}"),
            ..Default::default()
        }));
        Arc::clone(&client).start();

        // The refused connect fails fast; the first backoff delay is 1s,
        // so by now the client is waiting it out.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(client.state().await, ConnectionState::Disconnected);

        client.disconnect().await;
    }

    #[tokio::test]
    async fn test_discard_pending_frees_the_ack_slot() {
        let client = StreamClient::new(StreamConfig::default());

        *client.pending_ack.lock().await = {
            let (tx, _rx) = oneshot::channel();
            Some(tx)
        };
        client.discard_pending().await;

        assert!(client.pending_ack.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_subscribe_receives_broadcast_events() {
        let client = StreamClient::new(StreamConfig::default());
        let mut events = client.subscribe();

        client
            .event_tx
            .send(StreamEvent::Registered)
            .expect("subscriber exists");

        match events.recv().await {
            Ok(StreamEvent::Registered) => {}
            other => panic!("expected Registered event, got {other:?}"),
        }
    }
}
