//! Device-side stream layer for the hudlink HUD pipeline.
//!
//! A [`StreamRouter`] demultiplexes the transport byte stream into
//! magic-tagged frames and hands each payload to a registered
//! [`FrameReceiver`]: [`ImgfReceiver`] double-buffers PNG images for
//! zero-copy hand-off to the UI task, [`MsgfReceiver`] queues short
//! vehicle messages. The receive path performs no allocation; all payload
//! memory is owned by the receivers and sized at construction.

pub mod error;
pub mod imgf;
pub mod msgf;
pub mod receiver;
pub mod router;
pub mod transport;

pub use error::DeviceError;
pub use imgf::{DropPolicy, ImgToken, ImgfConfig, ImgfReceiver, ImgfStats, ReadyImage};
pub use msgf::{MsgfConfig, MsgfReceiver, MsgfStats};
pub use receiver::{DropReason, FrameReceiver, RxGrant};
pub use router::{RouterConfig, RouterStats, RxCursor, StreamRouter};
pub use transport::DeviceTransport;
