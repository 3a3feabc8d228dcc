//! valuegen — publishes random values to an MQTT topic
//!
//! The process reads its configuration from the environment, connects to an
//! MQTT broker, subscribes to the configured topic and then publishes a
//! randomly drawn integer to that same topic every `VALUE_INTERVAL` seconds.
//!
//! ## Modules
//!
//! * `config` — environment loading and validation, plus
//!   logging settings.
//!
//! * `core` — runtime components:
//!   - value generation
//!   - the `Broker` seam over the MQTT client
//!   - the value publisher
//!   - the connection watchdog
//!   - the single-task application loop
//!
//! * `logger` — `tracing` subscriber setup.
//!
//! ## Exit codes
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 23   | invalid environment configuration                    |
//! | 42   | no broker connection within 30 seconds of startup    |
//! | 1    | any other startup failure                            |

pub mod config;
pub mod core;
pub mod logger;

/// Exit code for an invalid environment.
pub const EXIT_INVALID_CONFIG: u8 = 23;

/// Exit code when the broker connection is not established in time.
pub const EXIT_CONNECT_TIMEOUT: u8 = 42;

/// Exit code for any other startup failure.
pub const EXIT_FAILURE: u8 = 1;
