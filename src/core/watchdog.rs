//! Connection watchdog.
//!
//! The broker client never reports "gave up connecting"; it keeps retrying.
//! The watchdog bounds that: one deferred check, a fixed time after process
//! start, that looks at the connection state it was handed. It does not
//! detect disconnects that happen after the first successful connection.

use std::time::Duration;

use tokio::{sync::watch, time::Instant};
use valuegen_mqtt::ConnectionState;

/// Deadline for the first successful connection, counted from process start.
pub const CONNECT_DEADLINE: Duration = Duration::from_secs(30);

/// Result of the deferred check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogOutcome {
    /// The connection was established before the deadline.
    Connected,
    /// The deadline passed without a successful connection.
    TimedOut,
}

/// One-shot check of the connection state at a fixed instant.
#[derive(Debug)]
pub struct ConnectionWatchdog {
    deadline: Instant,
    state: watch::Receiver<ConnectionState>,
}

impl ConnectionWatchdog {
    /// Watchdog that fires `CONNECT_DEADLINE` after `started`.
    pub fn new(started: Instant, state: watch::Receiver<ConnectionState>) -> Self {
        Self::with_deadline(started + CONNECT_DEADLINE, state)
    }

    pub fn with_deadline(deadline: Instant, state: watch::Receiver<ConnectionState>) -> Self {
        Self { deadline, state }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Waits for the deadline, then reports whether a connection was made.
    ///
    /// Resolves immediately when the deadline has already passed.
    pub async fn expire(self) -> WatchdogOutcome {
        tokio::time::sleep_until(self.deadline).await;
        if self.state.borrow().is_connected() {
            WatchdogOutcome::Connected
        } else {
            WatchdogOutcome::TimedOut
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_times_out_when_never_connected() {
        let (_tx, rx) = watch::channel(ConnectionState::Connecting);
        let started = Instant::now();

        let outcome = ConnectionWatchdog::new(started, rx).expire().await;

        assert_eq!(outcome, WatchdogOutcome::TimedOut);
        assert!(started.elapsed() >= CONNECT_DEADLINE);
        assert!(started.elapsed() < CONNECT_DEADLINE + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_counts_from_start_not_first_poll() {
        let (_tx, rx) = watch::channel(ConnectionState::Connecting);
        let started = Instant::now();
        let watchdog = ConnectionWatchdog::new(started, rx);

        // Startup work before the watchdog is first awaited.
        tokio::time::sleep(Duration::from_secs(20)).await;

        assert_eq!(watchdog.expire().await, WatchdogOutcome::TimedOut);
        assert!(started.elapsed() >= CONNECT_DEADLINE);
        assert!(started.elapsed() < CONNECT_DEADLINE + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connected_before_deadline() {
        let (tx, rx) = watch::channel(ConnectionState::Connecting);
        let watchdog = ConnectionWatchdog::new(Instant::now(), rx);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            tx.send(ConnectionState::Connected).unwrap();
            // Keep the sender alive past the deadline.
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        assert_eq!(watchdog.expire().await, WatchdogOutcome::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_read_even_if_sender_dropped() {
        let (tx, rx) = watch::channel(ConnectionState::Connecting);
        tx.send(ConnectionState::Connected).unwrap();
        drop(tx);

        let deadline = Instant::now() + Duration::from_secs(1);
        let outcome = ConnectionWatchdog::with_deadline(deadline, rx).expire().await;
        assert_eq!(outcome, WatchdogOutcome::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_deadline() {
        let (_tx, rx) = watch::channel(ConnectionState::Connecting);
        let started = Instant::now();
        assert_eq!(
            ConnectionWatchdog::new(started, rx).deadline(),
            started + Duration::from_secs(30)
        );
    }
}
