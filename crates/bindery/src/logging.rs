//! JSON log output for hosts without their own subscriber.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("a global tracing subscriber is already installed: {0}")]
    AlreadyInstalled(String),
}

/// Install a global JSON subscriber filtered by `RUST_LOG`
/// (default `bindery=info,bindery_observe=info`).
///
/// # Errors
///
/// [`LoggingError::AlreadyInstalled`] when the host installed a subscriber
/// first.
pub fn init_json() -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bindery=info,bindery_observe=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .json()
        .try_init()
        .map_err(|err| LoggingError::AlreadyInstalled(err.to_string()))
}
