use std::io;

use thiserror::Error;

/// Boxed error returned by embedder-supplied collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type for the host SDK.
///
/// Apart from [`HostError::InvalidConfig`], these are reported through
/// [`crate::HudListener::on_error`] rather than returned: an individual
/// frame or fetch failure never stops the engine.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("transport write failed: {0}")]
    TransportWrite(#[source] io::Error),

    #[error("transport close failed: {0}")]
    TransportClose(#[source] io::Error),

    #[error("map provider failed: {0}")]
    Provider(BoxError),

    #[error("map fetch could not be scheduled: {0}")]
    ScheduleReject(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
