//! Process configuration loading and validation.
//!
//! The whole configuration comes from environment variables and is read once
//! at startup. `Config::from_env` validates every required variable and stops
//! at the first violation. Nothing else in the process runs until it succeeds.
//! Variables this module does not know about are ignored.
//!
//! | Variable          | Rule                                             |
//! |-------------------|--------------------------------------------------|
//! | `LOG_LEVEL`       | one of `debug`, `error`, `info`, `warn`          |
//! | `MAX_VALUE`       | number                                           |
//! | `MIN_VALUE`       | number                                           |
//! | `MQTT_BROKER_URL` | non-empty string                                 |
//! | `MQTT_TOPIC`      | non-empty string                                 |
//! | `NAME`            | non-empty string                                 |
//! | `NODE_ENV`        | one of `development`, `production`, `staging`, `test` |
//! | `VALUE_INTERVAL`  | number from 1 to 2147483 (seconds)               |
//!
//! Only the empty string counts as empty; whitespace is a value like any other.

use std::{collections::HashMap, fmt, str::FromStr, time::Duration};

use self::logger::{LogLevel, LoggerConfig};
use crate::core::generator::ValueRange;

pub mod logger;

/// Longest accepted `VALUE_INTERVAL`, in seconds. Matches the largest
/// timer delay (2^31 - 1 ms) of the runtime the variable set comes from.
pub const MAX_VALUE_INTERVAL: u64 = 2_147_483;

/// Prints a timestamped error before the tracing subscriber is initialized.
/// Used when the configuration cannot be loaded.
#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        eprintln!("{}  {} {}",
            console::style($crate::config::timestamp()).dim(),
            console::style("ERROR").red(),
            format_args!($($arg)*)
        );
    };
}

/// Current UTC time in the same shape the tracing console layer uses.
#[doc(hidden)]
pub fn timestamp() -> String {
    let format = time::macros::format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
    );
    time::OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_else(|_| String::from("-"))
}

/// Errors that can occur while reading or validating the configuration.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("\"{var}\" is required")]
    Missing { var: &'static str },

    /// A variable is set but its value is not acceptable.
    #[error("\"{var}\" {reason} (got \"{value}\")")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime environment tag from `NODE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Staging,
    Test,
}

impl Environment {
    pub const ALLOWED: [&'static str; 4] = ["development", "production", "staging", "test"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Staging => "staging",
            Environment::Test => "test",
        }
    }

    pub fn is_test(&self) -> bool {
        matches!(self, Environment::Test)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "test" => Ok(Environment::Test),
            _ => Err(format!("must be one of [{}]", Self::ALLOWED.join(", "))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of the process configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub log_level: LogLevel,

    /// Upper publish bound as given; truncated to an integer when used.
    pub max_value: f64,

    /// Lower publish bound as given; truncated to an integer when used.
    pub min_value: f64,

    pub broker_url: String,

    pub topic: String,

    /// Service name. Only used for log context.
    pub name: String,

    pub environment: Environment,

    /// Seconds between two publishes, 1 to `MAX_VALUE_INTERVAL`.
    pub value_interval: u64,
}

impl Config {
    /// Loads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` encountered.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Loads the configuration from an arbitrary variable mapping.
    ///
    /// Variables are checked in alphabetical order and the first violation is
    /// returned.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let env = EnvReader { vars: &vars };

        Ok(Config {
            log_level: env.parse_enum("LOG_LEVEL")?,
            max_value: env.number("MAX_VALUE")?,
            min_value: env.number("MIN_VALUE")?,
            broker_url: env.string("MQTT_BROKER_URL")?,
            topic: env.string("MQTT_TOPIC")?,
            name: env.string("NAME")?,
            environment: env.parse_enum("NODE_ENV")?,
            value_interval: env.interval("VALUE_INTERVAL")?,
        })
    }

    /// Integer publish bounds, truncated toward zero.
    pub fn value_range(&self) -> ValueRange {
        ValueRange::new(self.min_value.trunc() as i64, self.max_value.trunc() as i64)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.value_interval)
    }

    /// Logging settings implied by `LOG_LEVEL` and `NODE_ENV`.
    pub fn logger(&self) -> LoggerConfig {
        LoggerConfig {
            level: self.log_level,
            silent: self.environment.is_test(),
        }
    }

    /// Broker client settings with the 5 second per-attempt connection timeout.
    pub fn broker(&self) -> valuegen_mqtt::Config {
        valuegen_mqtt::Config {
            connection_timeout: valuegen_mqtt::config::DEFAULT_CONNECTION_TIMEOUT,
            ..valuegen_mqtt::Config::with_url(self.broker_url.clone())
        }
    }
}

/// Typed accessors over the raw variable map.
struct EnvReader<'a> {
    vars: &'a HashMap<String, String>,
}

impl EnvReader<'_> {
    fn raw(&self, var: &'static str) -> Result<&str, ConfigError> {
        let value = self.vars.get(var).ok_or(ConfigError::Missing { var })?;
        if value.is_empty() {
            return Err(ConfigError::Invalid {
                var,
                value: value.clone(),
                reason: "must not be empty".into(),
            });
        }
        Ok(value)
    }

    fn string(&self, var: &'static str) -> Result<String, ConfigError> {
        self.raw(var).map(str::to_string)
    }

    fn parse_enum<T>(&self, var: &'static str) -> Result<T, ConfigError>
    where
        T: FromStr<Err = String>,
    {
        let value = self.raw(var)?;
        value.parse().map_err(|reason| ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason,
        })
    }

    fn number(&self, var: &'static str) -> Result<f64, ConfigError> {
        let value = self.raw(var)?;
        match value.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(n),
            _ => Err(ConfigError::Invalid {
                var,
                value: value.to_string(),
                reason: "must be a number".into(),
            }),
        }
    }

    /// A number of seconds from 1 to `MAX_VALUE_INTERVAL`; fractions are dropped.
    fn interval(&self, var: &'static str) -> Result<u64, ConfigError> {
        let n = self.number(var)?;
        let reason = if n < 1.0 {
            "must be greater than or equal to 1".to_string()
        } else if n >= (MAX_VALUE_INTERVAL + 1) as f64 {
            format!("must be less than or equal to {}", MAX_VALUE_INTERVAL)
        } else {
            return Ok(n.trunc() as u64);
        };
        Err(ConfigError::Invalid {
            var,
            value: self.raw(var)?.to_string(),
            reason,
        })
    }
}
