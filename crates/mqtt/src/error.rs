//! Error handling for broker client operations.
//!
//! `TransferError` is the single error type returned by this crate. It folds
//! setup problems (bad URL, invalid settings) and request failures coming from
//! `rumqttc` into one enum that callers can match on.
//!
//! # Error Categories
//!
//! **Setup errors** (caught before any network traffic):
//! - `InvalidUrl`: the broker URL cannot be parsed or uses an unsupported scheme
//! - `ConfigError`: validation of the client settings failed
//!
//! **Runtime errors**:
//! - `ClientTransfer`: a subscribe/publish request could not be queued
//!
//! Connection failures are not returned as errors. The connection kernel
//! reports them as `BrokerEvent::Error` and keeps retrying.

use thiserror::Error;

/// The unified error type for broker client operations.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The broker URL is malformed or names a scheme this client cannot speak.
    ///
    /// Supported schemes are `mqtt`, `tcp`, `mqtts`, `ssl` and `tls`.
    #[error("Invalid broker URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Client settings did not pass validation.
    #[error("Configuration error: {0}")]
    ConfigError(#[from] validator::ValidationErrors),

    /// The local client could not queue a request.
    ///
    /// Either the request channel is full because the event loop is not
    /// draining it, or the event loop has stopped and the channel is closed.
    #[error("Client transfer error: {0}")]
    ClientTransfer(#[from] rumqttc::ClientError),
}

#[cfg(test)]
mod tests {
    use rumqttc::{Publish, QoS, Request};

    use super::*;

    #[test]
    fn test_invalid_url_display() {
        let err = TransferError::InvalidUrl {
            url: "ftp://broker".into(),
            reason: "unsupported scheme 'ftp'".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid broker URL 'ftp://broker': unsupported scheme 'ftp'"
        );
    }

    #[test]
    fn test_from_client_error() {
        let request = Request::Publish(Publish::new("values", QoS::AtMostOnce, "7"));
        let err: TransferError = rumqttc::ClientError::TryRequest(request).into();
        assert!(matches!(err, TransferError::ClientTransfer(_)));
        assert!(err.to_string().starts_with("Client transfer error: "));
    }
}
