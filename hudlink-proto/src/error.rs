use thiserror::Error;

/// The primary error type for the hudlink wire layer.
#[derive(Error, Debug)]
pub enum ProtoError {
    #[error("truncated frame: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("frame length mismatch: header says {header} payload bytes, buffer holds {actual}")]
    LengthMismatch { header: usize, actual: usize },

    #[error("payload crc mismatch: header 0x{header:08x}, computed 0x{computed:08x}")]
    CrcMismatch { header: u32, computed: u32 },

    #[error("snapshot body too short: expected {expected} bytes, got {actual}")]
    ShortSnapshot { expected: usize, actual: usize },

    #[error("empty MSGF payload")]
    EmptyPayload,
}
