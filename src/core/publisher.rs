//! Value publisher: subscribes to the topic and publishes one value per tick.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, error};

use super::{broker::Broker, generator::ValueRange};

/// Publishes randomly drawn values to a single topic.
///
/// The publisher is armed once, on the first successful connection. From then
/// on each `tick` draws and publishes one value; the caller owns the timer.
pub struct ValuePublisher<R> {
    broker: Arc<dyn Broker>,
    topic: String,
    range: ValueRange,
    rng: R,
    armed: bool,
}

impl<R: Rng> ValuePublisher<R> {
    pub fn new(
        broker: Arc<dyn Broker>,
        topic: impl Into<String>,
        range: ValueRange,
        rng: R,
    ) -> Self {
        Self {
            broker,
            topic: topic.into(),
            range,
            rng,
            armed: false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Subscribes to the topic and marks the publisher armed.
    ///
    /// Returns `false` if it was already armed, in which case nothing is sent.
    pub fn arm(&mut self) -> bool {
        if self.armed {
            return false;
        }
        self.subscribe();
        self.armed = true;
        true
    }

    /// Subscribes again after a reconnect without re-arming.
    pub fn resubscribe(&self) {
        self.subscribe();
    }

    fn subscribe(&self) {
        debug!("Subscribe to topic {}.", self.topic);
        if let Err(e) = self.broker.subscribe(&self.topic) {
            error!("Failed to subscribe to topic {}: {}", self.topic, e);
            return;
        }
        debug!("Subscribed to topic {}.", self.topic);
    }

    /// Draws one value and publishes its decimal representation.
    ///
    /// Returns the drawn value. Publish failures are logged and otherwise
    /// ignored. Never waits on the broker.
    pub fn tick(&mut self) -> i64 {
        let value = self.range.draw(&mut self.rng);
        debug!("Publish value {} to topic {}.", value, self.topic);
        match self.broker.publish(&self.topic, value.to_string()) {
            Ok(()) => debug!("Published value {} to topic {}.", value, self.topic),
            Err(e) => error!(
                "Failed to publish value {} to topic {}: {}",
                value, self.topic, e
            ),
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};
    use tracing_test::traced_test;

    use super::*;
    use crate::core::broker::testing::MockBroker;

    fn publisher(broker: Arc<MockBroker>, range: ValueRange) -> ValuePublisher<StdRng> {
        ValuePublisher::new(broker, "values/random", range, StdRng::seed_from_u64(9))
    }

    #[test]
    fn test_arm_subscribes_once() {
        let broker = Arc::new(MockBroker::default());
        let mut publisher = publisher(broker.clone(), ValueRange::new(1, 10));

        assert!(!publisher.is_armed());
        assert!(publisher.arm());
        assert!(!publisher.arm());
        assert!(publisher.is_armed());
        assert_eq!(broker.subscriptions(), vec!["values/random".to_string()]);
    }

    #[test]
    fn test_resubscribe_keeps_armed_state() {
        let broker = Arc::new(MockBroker::default());
        let mut publisher = publisher(broker.clone(), ValueRange::new(1, 10));

        publisher.arm();
        publisher.resubscribe();
        assert!(publisher.is_armed());
        assert_eq!(broker.subscriptions().len(), 2);
    }

    #[tokio::test]
    async fn test_tick_publishes_decimal_string_to_topic() {
        let broker = Arc::new(MockBroker::default());
        let mut publisher = publisher(broker.clone(), ValueRange::new(5, 5));

        for _ in 0..3 {
            assert_eq!(publisher.tick(), 5);
        }
        assert_eq!(broker.payloads(), vec!["5", "5", "5"]);
        assert!(broker.publish_topics().iter().all(|t| t == "values/random"));
    }

    #[tokio::test]
    async fn test_published_values_within_open_lower_bound() {
        let broker = Arc::new(MockBroker::default());
        let mut publisher = publisher(broker.clone(), ValueRange::new(1, 10));

        for _ in 0..500 {
            publisher.tick();
        }
        for payload in broker.payloads() {
            let value: i64 = payload.parse().unwrap();
            assert!((2..=10).contains(&value));
        }
    }

    #[test]
    #[traced_test]
    fn test_full_queue_is_logged_not_fatal() {
        let broker = Arc::new(MockBroker::backed_up());
        let mut publisher = publisher(broker.clone(), ValueRange::new(5, 5));

        assert!(publisher.arm());
        assert!(publisher.is_armed());
        assert_eq!(publisher.tick(), 5);
        assert_eq!(publisher.tick(), 5);

        assert_eq!(broker.publish_count(), 0);
        assert_eq!(broker.rejected(), 3);
        assert!(logs_contain("Failed to subscribe to topic values/random"));
        assert!(logs_contain("Failed to publish value 5 to topic values/random"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_debug_logs_around_publish() {
        let broker = Arc::new(MockBroker::default());
        let mut publisher = publisher(broker, ValueRange::new(3, 3));

        publisher.tick();
        assert!(logs_contain("Publish value 3 to topic values/random."));
        assert!(logs_contain("Published value 3 to topic values/random."));
    }
}
