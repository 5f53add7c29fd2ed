use std::fmt;

use crate::error::HostError;
use crate::gps::GpsPoint;

/// Outbound frame channel. The discriminant doubles as the writer
/// priority: control frames overtake snapshots, snapshots overtake images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Channel {
    Cmd = 0,
    Msg = 1,
    Img = 2,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Channel::Cmd => "CMD",
            Channel::Msg => "MSGF",
            Channel::Img => "IMGF",
        })
    }
}

/// Event callbacks from the SDK. Every method defaults to a no-op.
///
/// Callbacks run on SDK threads (writer, scheduler, fetch workers) and
/// should return quickly.
pub trait HudListener: Send + Sync {
    /// A frame was written and flushed.
    fn on_frame_sent(&self, channel: Channel, seq: u32, bytes: usize) {
        let _ = (channel, seq, bytes);
    }

    /// A frame was dropped before reaching the transport.
    fn on_frame_dropped(&self, channel: Channel, reason: &str) {
        let _ = (channel, reason);
    }

    /// A GPS point passed the filter and joined the track.
    fn on_gps_accepted(&self, point: &GpsPoint) {
        let _ = point;
    }

    /// A GPS point was filtered out.
    fn on_gps_filtered(&self, point: &GpsPoint, reason: &str) {
        let _ = (point, reason);
    }

    /// An internal stage failed; the SDK keeps running.
    fn on_error(&self, stage: &str, error: &HostError) {
        let _ = (stage, error);
    }
}
