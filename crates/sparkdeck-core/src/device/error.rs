//! Device boundary errors

use thiserror::Error;

/// Errors from talking to the device over HTTP.
///
/// All of these are transport-class failures: they surface as a transient
/// notification, cached state is preserved, and the operation is abandoned
/// without retry.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("device returned HTTP {0}")]
    Status(u16),

    #[error("invalid response from device: {0}")]
    Decode(String),

    #[error("device rejected the request: {0}")]
    Rejected(String),
}
