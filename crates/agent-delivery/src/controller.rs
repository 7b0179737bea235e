//! The delivery controller.

use crate::DeliveryResult;
use agent_core::TransportChoice;
use agent_readings::Reading;
use agent_request::{RequestError, RequestTransport};
use agent_stream::{ConnectionState, StreamClient, StreamError, StreamEvent};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, warn};

/// Delivery controller configuration.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// How long to wait for a stream acknowledgment.
    pub ack_timeout: Duration,
    /// How long an unregistered stream gets to finish registration
    /// before the reading is routed to the request transport.
    pub registration_grace: Duration,
    /// Transport selection.
    pub transport: TransportChoice,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_secs(5),
            registration_grace: Duration::from_secs(2),
            transport: TransportChoice::Auto,
        }
    }
}

/// Transport-agnostic delivery entry point.
///
/// Owns both transports and enforces the single-in-flight invariant:
/// concurrent `send` calls are serialized, so no two deliveries are
/// ever in flight against the stream at once.
pub struct DeliveryController {
    config: DeliveryConfig,
    stream: Option<Arc<StreamClient>>,
    request: RequestTransport,
    in_flight: Mutex<()>,
}

impl DeliveryController {
    /// Create a controller over the given transports.
    ///
    /// The stream client, when present, should already have been started.
    pub fn new(
        config: DeliveryConfig,
        stream: Option<Arc<StreamClient>>,
        request: RequestTransport,
    ) -> Self {
        Self {
            config,
            stream,
            request,
            in_flight: Mutex::new(()),
        }
    }

    /// Deliver one reading, returning exactly one result.
    ///
    /// Rejections and transport errors are reported in the result, never
    /// raised; the caller's loop is expected to keep running.
    pub async fn send(&self, reading: &Reading) -> DeliveryResult {
        let _guard = self.in_flight.lock().await;

        if let Err(e) = reading.validate() {
            warn!(error = %e, "rejecting invalid reading");
            return DeliveryResult::TransportError {
                cause: e.to_string(),
            };
        }

        match self.config.transport {
            TransportChoice::Http => self.send_http(reading).await,
            TransportChoice::Stream => match self.try_stream(reading).await {
                Ok(result) => result,
                Err(e) => {
                    error!(error = %e, "stream delivery failed");
                    DeliveryResult::TransportError {
                        cause: e.to_string(),
                    }
                }
            },
            TransportChoice::Auto => match self.try_stream(reading).await {
                Ok(result) => result,
                Err(e) => {
                    debug!(error = %e, "stream unavailable, falling back to http");
                    self.send_http(reading).await
                }
            },
        }
    }

    /// Emit over the stream and await the correlated acknowledgment.
    async fn try_stream(&self, reading: &Reading) -> Result<DeliveryResult, StreamError> {
        let stream = self.stream.as_ref().ok_or(StreamError::NotConnected)?;

        match stream.state().await {
            ConnectionState::Registered => {}
            // Connected but not yet confirmed: give registration one cycle
            ConnectionState::Connected => self.await_registration(stream).await?,
            _ => return Err(StreamError::NotConnected),
        }

        let payload = serde_json::to_value(reading)?;
        let ack_rx = stream.emit_reading(payload).await?;

        match timeout(self.config.ack_timeout, ack_rx).await {
            Ok(Ok(ack)) => {
                info!(serial_number = %reading.serial_number, "reading acknowledged over stream");
                Ok(DeliveryResult::Success { ack })
            }
            Ok(Err(_)) => {
                // The connection dropped and the pending ack was discarded
                warn!("stream connection lost while awaiting acknowledgment");
                Err(StreamError::Closed)
            }
            Err(_) => {
                // Free the in-flight slot so the next reading can use the
                // stream; a late ack for this reading is dropped.
                stream.discard_pending().await;
                warn!(
                    timeout_secs = self.config.ack_timeout.as_secs(),
                    "no acknowledgment within timeout"
                );
                Err(StreamError::AckTimeout)
            }
        }
    }

    /// Wait up to the registration grace period for the server to confirm.
    async fn await_registration(&self, stream: &StreamClient) -> Result<(), StreamError> {
        let mut events = stream.subscribe();
        // Re-check after subscribing so a confirmation racing ahead of the
        // subscription is not missed.
        if stream.is_registered().await {
            return Ok(());
        }

        let confirmed = timeout(self.config.registration_grace, async {
            loop {
                match events.recv().await {
                    Ok(StreamEvent::Registered) => break true,
                    Ok(StreamEvent::Disconnected(_)) => break false,
                    Ok(_) => continue,
                    Err(_) => break false,
                }
            }
        })
        .await;

        match confirmed {
            Ok(true) => Ok(()),
            _ => Err(StreamError::NotRegistered),
        }
    }

    /// Deliver over the request transport.
    async fn send_http(&self, reading: &Reading) -> DeliveryResult {
        match self.request.post_reading(reading).await {
            Ok(ack) => {
                info!(serial_number = %reading.serial_number, "reading accepted over http");
                DeliveryResult::Success { ack }
            }
            Err(RequestError::Rejected { status, body }) => {
                warn!(status, body = %body, "reading rejected by collection service");
                DeliveryResult::Rejected { status, body }
            }
            Err(e) => {
                error!(error = %e, "http delivery failed");
                DeliveryResult::TransportError {
                    cause: e.to_string(),
                }
            }
        }
    }

    /// Shut down the controller, releasing the stream connection.
    pub async fn shutdown(&self) {
        if let Some(stream) = &self.stream {
            stream.disconnect().await;
        }
        info!("delivery controller shut down");
    }
}
