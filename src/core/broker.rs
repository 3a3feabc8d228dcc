//! Broker abstraction used by the publisher loop.
//!
//! The trait keeps the runtime independent of the concrete MQTT client so the
//! loop can be exercised against an in-memory broker in tests.

use valuegen_mqtt::{MqttClient, TransferError};

/// Subscribe/publish operations against a message broker.
///
/// Both calls are fire-and-forget and must not block: they hand the request
/// to the client and return, without waiting for the broker or for room in a
/// full queue. A request that cannot be queued is an error.
pub trait Broker: Send + Sync {
    fn subscribe(&self, topic: &str) -> Result<(), TransferError>;

    fn publish(&self, topic: &str, payload: String) -> Result<(), TransferError>;
}

impl Broker for MqttClient {
    fn subscribe(&self, topic: &str) -> Result<(), TransferError> {
        MqttClient::subscribe(self, topic)
    }

    fn publish(&self, topic: &str, payload: String) -> Result<(), TransferError> {
        MqttClient::publish(self, topic, payload)
    }
}
