//! Core runtime components:
//! - value generation
//! - broker abstraction
//! - value publisher
//! - connection watchdog
//! - the application loop tying them together

pub mod app;
pub mod broker;
pub mod generator;
pub mod publisher;
pub mod watchdog;
