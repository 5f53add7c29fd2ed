// Wire-level constants shared by the host and device sides.

/// Frame channel magic for vehicle messages ("MSGF" read little-endian).
pub const MAGIC_MSGF: u32 = 0x4647_534D;

/// Frame channel magic for map images ("IMGF" read little-endian).
pub const MAGIC_IMGF: u32 = 0x4647_4D49;

/// Size of the fixed frame header (20 bytes).
pub const FRAME_HEADER_SIZE: usize = 20;

/// Size of the snapshot body following the command byte (26 bytes).
pub const SNAPSHOT_BODY_SIZE: usize = 26;

/// Full MSGF snapshot payload: command byte plus body (27 bytes).
pub const SNAPSHOT_PAYLOAD_SIZE: usize = 1 + SNAPSHOT_BODY_SIZE;

/// Upper bound for the wall-clock field, minutes since midnight.
pub const CURRENT_TIME_MINUTES_MAX: u16 = 1439;
