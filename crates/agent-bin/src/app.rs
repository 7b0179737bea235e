//! Delivery drivers: continuous scheduler and one-shot mode.

use agent_core::{Config, TransportChoice};
use agent_delivery::{DeliveryConfig, DeliveryController, DeliveryResult};
use agent_readings::{ReadingSource, SimulatedSource};
use agent_request::{RequestConfig, RequestTransport};
use agent_stream::{StreamClient, StreamConfig};
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

/// Wire up the transports and the controller from the configuration.
pub fn build_controller(config: &Config) -> anyhow::Result<DeliveryController> {
    let request = RequestTransport::new(RequestConfig {
        base_url: config.base_url.clone(),
        ..Default::default()
    })?;

    let stream = match config.transport {
        TransportChoice::Http => None,
        _ => {
            let stream = Arc::new(StreamClient::new(StreamConfig {
                url: config.stream_url(),
                serial_number: config.serial_number.clone(),
                ..Default::default()
            }));
            Arc::clone(&stream).start();
            Some(stream)
        }
    };

    Ok(DeliveryController::new(
        DeliveryConfig {
            ack_timeout: Duration::from_secs(config.ack_timeout_secs),
            transport: config.transport,
            ..Default::default()
        },
        stream,
        request,
    ))
}

/// Print the outcome of one delivery for the operator.
pub fn report_outcome(result: &DeliveryResult) {
    match result {
        DeliveryResult::Success { ack } => {
            println!("Reading delivered. Server response: {ack}");
        }
        DeliveryResult::Rejected { status, body } => {
            // The body is surfaced verbatim; rejection is not fatal
            println!("Reading rejected (status {status}): {body}");
        }
        DeliveryResult::TransportError { cause } => {
            println!("Delivery failed: {cause}");
        }
    }
}

/// Continuous mode: deliver a reading every interval until ctrl-c.
pub async fn run_continuous(config: Config) -> anyhow::Result<()> {
    info!(
        serial_number = %config.serial_number,
        interval_secs = config.send_interval_secs,
        transport = %config.transport,
        "starting continuous delivery"
    );

    let controller = build_controller(&config)?;
    let mut source = SimulatedSource::new(&config.serial_number);
    let mut ticker = interval(Duration::from_secs(config.send_interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let reading = source.next_reading();
                // Ctrl-c cancels a delivery in progress rather than
                // waiting out its timeouts.
                tokio::select! {
                    result = controller.send(&reading) => {
                        report_outcome(&result);
                        if !result.is_success() {
                            warn!("delivery did not succeed, continuing on interval");
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("shutdown requested");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
        }
    }

    controller.shutdown().await;
    Ok(())
}

/// One-shot mode: deliver a single reading. Returns whether it succeeded.
pub async fn run_once(config: Config) -> anyhow::Result<bool> {
    let controller = build_controller(&config)?;
    let mut source = SimulatedSource::new(&config.serial_number);

    let reading = source.next_reading();
    info!(serial_number = %reading.serial_number, "taking a single reading");
    let result = controller.send(&reading).await;
    report_outcome(&result);

    controller.shutdown().await;
    Ok(result.is_success())
}
