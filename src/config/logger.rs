//! Logging configuration structures.

use std::{fmt, str::FromStr};

/// Log levels accepted in `LOG_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Error,
    Info,
    Warn,
}

impl LogLevel {
    pub const ALLOWED: [&'static str; 4] = ["debug", "error", "info", "warn"];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Error => "error",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    /// Strict allow-list match on the lowercase names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(LogLevel::Debug),
            "error" => Ok(LogLevel::Error),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            _ => Err(format!("must be one of [{}]", Self::ALLOWED.join(", "))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging settings derived from `LOG_LEVEL` and `NODE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Lowest level that reaches the console.
    pub level: LogLevel,

    /// Suppresses all output. Set when running with `NODE_ENV=test`.
    pub silent: bool,
}
