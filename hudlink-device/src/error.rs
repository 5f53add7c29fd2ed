use thiserror::Error;

/// The primary error type for the device stream layer.
///
/// Runtime frame failures are per-receiver counters, not errors; these
/// only occur at construction and registration time.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("invalid receiver config: {0}")]
    InvalidConfig(String),

    #[error("a receiver for magic 0x{0:08x} is already registered")]
    DuplicateReceiver(u32),
}
