//! MQTT client construction and the client handle used by the application.
//!
//! `ClientBuilder` turns a [`Config`] into a `rumqttc` `AsyncClient` and
//! `EventLoop` pair. [`MqttClient`] wraps the `AsyncClient` half and exposes the
//! two operations the application needs: subscribe and publish.
//!
//! ```ignore
//! let (client, event_loop) = ClientBuilder::from_config(&config)?.build();
//! let handle = MqttClient::new(client);
//! handle.subscribe("sensors/value")?;
//! ```

use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions, NetworkOptions, QoS, Transport};
use tracing::debug;
use validator::Validate;

use super::{
    config::{BrokerUrl, Config, Security},
    error::TransferError,
};

/// Builder for an MQTT client and its event loop.
///
/// The builder is consumed by `build()`. The returned client and event loop
/// belong together: the client sends requests, the event loop must be polled
/// for anything to reach the network.
pub struct ClientBuilder {
    /// MQTT protocol options (host, port, keep-alive, credentials, transport)
    opts: MqttOptions,

    /// Capacity of the request channel.
    cap: usize,

    /// Per-attempt connection timeout in seconds.
    connection_timeout: u64,
}

impl ClientBuilder {
    /// Creates a builder from validated client settings.
    ///
    /// # Errors
    ///
    /// - `TransferError::ConfigError` when `config` fails validation
    /// - `TransferError::InvalidUrl` when the broker URL cannot be used
    pub fn from_config(config: &Config) -> Result<Self, TransferError> {
        config.validate()?;

        let broker = BrokerUrl::parse(&config.url)?;
        let client_id = config.resolve_client_id();
        debug!(
            "Building MQTT client '{}' for {}:{} ({:?})",
            client_id, broker.host, broker.port, broker.security
        );

        let mut opts = MqttOptions::new(client_id, broker.host, broker.port);
        opts.set_keep_alive(Duration::from_secs(config.keep_alive));
        opts.set_clean_session(true);

        if let Some((username, password)) = broker.credentials {
            opts.set_credentials(username, password);
        }

        if broker.security == Security::Tls {
            opts.set_transport(Transport::tls_with_default_config());
        }

        Ok(Self {
            opts,
            cap: config.request_channel_capacity,
            connection_timeout: config.connection_timeout,
        })
    }

    /// Constructs the MQTT client and event loop.
    ///
    /// No network activity happens here; the first connection attempt starts
    /// when the event loop is polled.
    pub fn build(self) -> (AsyncClient, EventLoop) {
        let (client, mut event_loop) = AsyncClient::new(self.opts, self.cap);

        let mut network = NetworkOptions::new();
        network.set_connection_timeout(self.connection_timeout);
        event_loop.set_network_options(network);

        (client, event_loop)
    }
}

/// Cloneable handle for sending requests to the broker.
///
/// Requests are handed to the event loop without waiting. When the request
/// channel is full (the event loop is not draining it, e.g. while the broker
/// is unreachable) the call fails immediately with `ClientTransfer`.
#[derive(Debug, Clone)]
pub struct MqttClient {
    client: AsyncClient,
}

impl MqttClient {
    pub fn new(client: AsyncClient) -> Self {
        Self { client }
    }

    /// Queues a SUBSCRIBE for `topic` at QoS 0.
    pub fn subscribe(&self, topic: &str) -> Result<(), TransferError> {
        self.client.try_subscribe(topic, QoS::AtMostOnce)?;
        Ok(())
    }

    /// Queues a non-retained PUBLISH of `payload` to `topic` at QoS 0.
    pub fn publish(&self, topic: &str, payload: String) -> Result<(), TransferError> {
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload.into_bytes())?;
        Ok(())
    }

    /// Queues a DISCONNECT. Best effort.
    pub fn disconnect(&self) -> Result<(), TransferError> {
        self.client.try_disconnect()?;
        Ok(())
    }
}
