//! Wire format shared by the hudlink host SDK and device stream layer.
//!
//! Every frame is a fixed 20-byte little-endian header followed by `len`
//! payload bytes. Two channels exist, distinguished by a 32-bit magic:
//! MSGF carries vehicle snapshots and short commands, IMGF carries raw PNG
//! images. See [`frame::FrameHeader`] for the exact layout.

pub mod command;
pub mod constants;
pub mod error;
pub mod frame;
pub mod snapshot;

pub use command::{MsgCommand, MsgFrame};
pub use constants::{FRAME_HEADER_SIZE, MAGIC_IMGF, MAGIC_MSGF};
pub use error::ProtoError;
pub use frame::{
    encode_frame, encode_img_png, encode_msg_command, encode_msg_snapshot, Frame, FrameHeader,
};
pub use snapshot::{SnapshotBodyRaw, VehicleSnapshot};
