//! # valuegen-mqtt: thin MQTT broker client
//!
//! A small wrapper around `rumqttc` that gives an application exactly what a
//! single-topic publisher needs:
//!
//! - a broker URL parser (`mqtt://`, `tcp://`, `mqtts://`, `ssl://`, `tls://`)
//! - a client builder with a per-attempt connection timeout
//! - a connection kernel that polls the event loop and reports
//!   [`BrokerEvent::Connected`] / [`BrokerEvent::Error`] events
//! - a `watch` channel carrying the [`ConnectionState`]
//! - a cloneable [`MqttClient`] handle with fire-and-forget subscribe/publish
//!
//! # Quick Start
//!
//! ```ignore
//! use valuegen_mqtt::{ClientBuilder, Config, ConnectionKernel, MqttClient};
//!
//! let config = Config::with_url("mqtt://localhost:1883");
//! let (client, event_loop) = ClientBuilder::from_config(&config)?.build();
//! let (kernel, mut events) = ConnectionKernel::new(
//!     event_loop,
//!     config.reconnect_period(),
//!     cancel.clone(),
//! );
//! tokio::spawn(kernel.run());
//!
//! let client = MqttClient::new(client);
//! while let Some(event) = events.recv().await {
//!     if event == BrokerEvent::Connected {
//!         client.subscribe("values")?;
//!     }
//! }
//! ```
//!
//! # Connection Lifecycle
//!
//! ```text
//! Connecting ──(CONNACK)──> Connected
//!     │  ▲
//!     └──┘ poll error: Error event, wait reconnect period, poll again
//! ```
//!
//! The kernel never gives up on its own. Callers that need a deadline enforce
//! it themselves by watching the state channel.

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod state;

pub use client::{ClientBuilder, MqttClient};
pub use config::{BrokerUrl, Config, Security};
pub use connection::{BrokerEvent, ConnectionKernel};
pub use error::TransferError;
pub use state::ConnectionState;

/// Result type for broker client operations.
pub type Result<T> = std::result::Result<T, TransferError>;
