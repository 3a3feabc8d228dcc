//! Application runtime.
//!
//! Everything after startup runs on one task: broker events, the publish
//! interval and the connection watchdog are multiplexed with `tokio::select!`,
//! so the handlers never run concurrently and share no locks. Handlers never
//! await: subscribe and publish only queue requests, so a slow or unreachable
//! broker cannot hold up the other branches.
//!
//! ```text
//! startup ──> waiting for connect ──(Connected)──> armed: publish every interval
//!                    │
//!              (30 s, no connect)
//!                    ▼
//!           ConnectionTimeout (exit 42)
//! ```

use std::{future::Future, time::Duration};

use rand::Rng;
use thiserror::Error;
use tokio::{
    sync::mpsc,
    time::{interval_at, Instant, Interval, MissedTickBehavior},
};
use tracing::{error, info, warn};
use valuegen_mqtt::{BrokerEvent, TransferError};

use super::{
    publisher::ValuePublisher,
    watchdog::{ConnectionWatchdog, WatchdogOutcome},
};
use crate::{
    config::ConfigError, logger::LoggerError, EXIT_CONNECT_TIMEOUT, EXIT_FAILURE,
    EXIT_INVALID_CONFIG,
};

/// Fatal application errors, each mapped to a process exit code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("The environment is invalid (cause: {0}).")]
    Config(#[from] ConfigError),

    #[error("Failed to initialize logging: {0}")]
    Logger(#[from] LoggerError),

    #[error("Failed to set up the MQTT client: {0}")]
    Transfer(#[from] TransferError),

    #[error("System failed to connect to the MQTT broker @ {url}.")]
    ConnectionTimeout { url: String },
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) => EXIT_INVALID_CONFIG,
            AppError::ConnectionTimeout { .. } => EXIT_CONNECT_TIMEOUT,
            AppError::Logger(_) | AppError::Transfer(_) => EXIT_FAILURE,
        }
    }
}

/// Drives the publisher from broker events and timers.
pub struct Application<R> {
    publisher: ValuePublisher<R>,
    broker_url: String,
    interval: Duration,
}

impl<R: Rng> Application<R> {
    pub fn new(
        publisher: ValuePublisher<R>,
        broker_url: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            publisher,
            broker_url: broker_url.into(),
            interval,
        }
    }

    /// Runs until `shutdown` resolves or the watchdog fires.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConnectionTimeout` when no connection was made before
    /// the watchdog deadline.
    pub async fn run<S>(
        mut self,
        mut events: mpsc::Receiver<BrokerEvent>,
        watchdog: ConnectionWatchdog,
        shutdown: S,
    ) -> Result<(), AppError>
    where
        S: Future<Output = ()>,
    {
        let watchdog = watchdog.expire();
        tokio::pin!(watchdog);
        tokio::pin!(shutdown);

        let mut watchdog_pending = true;
        let mut events_open = true;
        let mut ticker: Option<Interval> = None;

        loop {
            tokio::select! {
                event = events.recv(), if events_open => match event {
                    Some(BrokerEvent::Connected) => self.on_connect(&mut ticker),
                    Some(BrokerEvent::Error(cause)) => {
                        error!("Something went wrong. (cause: {})", cause);
                    }
                    None => {
                        warn!("Broker event channel closed");
                        events_open = false;
                    }
                },

                outcome = &mut watchdog, if watchdog_pending => {
                    watchdog_pending = false;
                    if outcome == WatchdogOutcome::TimedOut {
                        let err = AppError::ConnectionTimeout { url: self.broker_url.clone() };
                        error!("{}", err);
                        return Err(err);
                    }
                }

                _ = next_tick(&mut ticker) => {
                    self.publisher.tick();
                }

                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    return Ok(());
                }
            }
        }
    }

    fn on_connect(&mut self, ticker: &mut Option<Interval>) {
        info!("System connected to the MQTT broker @ {}.", self.broker_url);
        if !self.publisher.arm() {
            self.publisher.resubscribe();
            return;
        }

        let start = Instant::now()
            .checked_add(self.interval)
            .filter(|_| !self.interval.is_zero());
        match start {
            Some(start) => {
                let mut interval = interval_at(start, self.interval);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                *ticker = Some(interval);
            }
            None => warn!(
                "Publish interval {:?} is out of range, no values will be published",
                self.interval
            ),
        }
    }
}

/// Resolves on the next tick, or never if the publisher is not armed yet.
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
