// ============================================================================
// logger.rs
// ============================================================================
//! Logging initialization.
//!
//! `LoggerManager` installs the global `tracing` subscriber. Output is a
//! single compact console layer with timestamp, level and message, filtered
//! by `RUST_LOG` when it is set and valid, and by the configured level
//! otherwise. In silent mode (`NODE_ENV=test`) no output layer is installed
//! at all.

use std::io;

use thiserror::Error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

use crate::config::logger::LoggerConfig;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Errors that can occur during logger initialization.
#[derive(Error, Debug)]
pub enum LoggerError {
    /// A global subscriber is already installed.
    #[error("Logger already initialized: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Manages logging configuration and global subscriber initialization.
pub struct LoggerManager {
    config: LoggerConfig,
}

impl LoggerManager {
    pub fn new(config: LoggerConfig) -> Self {
        LoggerManager { config }
    }

    /// Installs the global subscriber. Call once, before any logging.
    ///
    /// # Errors
    ///
    /// Fails if a subscriber is already set.
    pub fn init(&self) -> Result<(), LoggerError> {
        tracing_subscriber::registry()
            .with(self.layers())
            .try_init()?;
        Ok(())
    }

    /// Builds the output layers; empty when silent.
    fn layers(&self) -> Vec<BoxedLayer> {
        if self.config.silent {
            return Vec::new();
        }
        vec![self.console_layer(self.filter())]
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.config.level.as_str()))
    }

    fn console_layer(&self, filter: EnvFilter) -> BoxedLayer {
        fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(io::stdout)
            .with_filter(filter)
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::logger::LogLevel;

    #[test]
    fn test_silent_has_no_layers() {
        let manager = LoggerManager::new(LoggerConfig {
            level: LogLevel::Debug,
            silent: true,
        });
        assert!(manager.layers().is_empty());
    }

    #[test]
    fn test_console_layer_when_not_silent() {
        let manager = LoggerManager::new(LoggerConfig {
            level: LogLevel::Warn,
            silent: false,
        });
        assert_eq!(manager.layers().len(), 1);
    }

    #[test]
    fn test_filter_follows_configured_level() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let manager = LoggerManager::new(LoggerConfig {
            level: LogLevel::Error,
            silent: false,
        });
        assert_eq!(manager.filter().to_string(), "error");
    }
}
