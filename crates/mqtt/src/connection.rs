//! Connection kernel: drives the `rumqttc` event loop and reports what happens.
//!
//! The kernel is the only place that polls the event loop. It turns the raw
//! packet stream into two things the application cares about:
//!
//! - a [`ConnectionState`] on a `watch` channel (`Connecting` until the first
//!   CONNACK, `Connected` afterwards)
//! - a stream of [`BrokerEvent`]s on an `mpsc` channel, one `Connected` per
//!   successful (re)connection and one `Error` per failed poll
//!
//! The kernel never waits on the application. Events that do not fit into the
//! channel are dropped with a warning so the event loop keeps being polled.
//!
//! Errors are never fatal here. After a failed poll the kernel waits for the
//! reconnect period and polls again, which makes `rumqttc` open a new
//! connection. Deciding when to give up is left to the caller.
//!
//! ```ignore
//! let (client, event_loop) = ClientBuilder::from_config(&config)?.build();
//! let (kernel, events) = ConnectionKernel::new(event_loop, config.reconnect_period(), cancel);
//! let state_rx = kernel.subscribe_state();
//! tokio::spawn(kernel.run());
//! ```

use std::time::Duration;

use rumqttc::{ConnectReturnCode, Event, EventLoop, Packet};
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    watch,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::state::ConnectionState;

/// Capacity of the event channel towards the application.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Observable broker client events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerEvent {
    /// The broker accepted a connection (CONNACK with success code).
    Connected,

    /// The event loop reported an error. The kernel keeps running.
    Error(String),
}

/// Runs the MQTT event loop and publishes connection state and events.
///
/// Designed to run on a single task; the `AsyncClient` paired with the event
/// loop can be used from anywhere else.
pub struct ConnectionKernel {
    event_loop: EventLoop,

    /// Pause after a failed poll before the next attempt.
    reconnect_period: Duration,

    cancel: CancellationToken,

    state_tx: watch::Sender<ConnectionState>,

    events_tx: mpsc::Sender<BrokerEvent>,
}

impl ConnectionKernel {
    /// Creates a kernel and the receiving side of its event channel.
    pub fn new(
        event_loop: EventLoop,
        reconnect_period: Duration,
        cancel: CancellationToken,
    ) -> (Self, mpsc::Receiver<BrokerEvent>) {
        let (state_tx, _) = watch::channel(ConnectionState::Connecting);
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        (
            Self {
                event_loop,
                reconnect_period,
                cancel,
                state_tx,
                events_tx,
            },
            events_rx,
        )
    }

    /// Returns a receiver for connection state changes.
    ///
    /// The receiver sees the current state immediately.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    fn update_state(&self, state: ConnectionState) {
        let changed = self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            info!("Connection state changed to: {}", state);
        }
    }

    fn emit(&self, event: BrokerEvent) {
        match self.events_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!("Broker event channel full, dropping {:?}", event);
            }
            Err(TrySendError::Closed(_)) => {
                warn!("No receiver for broker events");
            }
        }
    }

    /// Polls the event loop until the cancellation token fires.
    pub async fn run(mut self) {
        info!("Starting connection event loop...");
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Connection kernel shutting down");
                    return;
                }

                polled = self.event_loop.poll() => {
                    match polled {
                        Ok(event) => self.handle_event(event),
                        Err(e) => {
                            let message = get_error_message(&e);
                            error!("MQTT connection error: {}", message);
                            debug!("MQTT connection error details: {:?}", e);
                            self.emit(BrokerEvent::Error(message));

                            tokio::select! {
                                _ = self.cancel.cancelled() => {
                                    info!("Connection kernel shutting down");
                                    return;
                                }
                                _ = tokio::time::sleep(self.reconnect_period) => {}
                            }
                        }
                    }
                }
            }
        }
    }

    fn handle_event(&self, event: Event) {
        match event {
            Event::Incoming(Packet::ConnAck(conn_ack)) => {
                if conn_ack.code == ConnectReturnCode::Success {
                    debug!("CONNACK received");
                    self.update_state(ConnectionState::Connected);
                    self.emit(BrokerEvent::Connected);
                } else {
                    warn!("Broker refused connection: {:?}", conn_ack.code);
                }
            }
            Event::Incoming(Packet::Publish(publish)) => {
                trace!("Received publish on topic {}", publish.topic);
            }
            Event::Incoming(Packet::Disconnect) => {
                warn!("Disconnected by broker");
            }
            Event::Incoming(packet) => {
                trace!("Incoming packet: {:?}", packet);
            }
            Event::Outgoing(outgoing) => {
                trace!("Outgoing packet: {:?}", outgoing);
            }
        }
    }
}

/// Extracts the innermost message from an error chain, without quotes.
fn get_error_message(e: &dyn std::error::Error) -> String {
    let mut current = e;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string().trim_matches('"').to_string()
}
