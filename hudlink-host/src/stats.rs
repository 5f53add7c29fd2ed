use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Point-in-time statistics snapshot, see [`crate::HudHostSdk::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HudStats {
    pub msg_sent: u64,
    pub img_sent: u64,
    pub cmd_sent: u64,
    pub dropped: u64,
    pub errors: u64,
    pub queue_depth: usize,
}

/// Lock-free counters behind [`HudStats`].
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub msg_sent: AtomicU64,
    pub img_sent: AtomicU64,
    pub cmd_sent: AtomicU64,
    pub dropped: AtomicU64,
    pub errors: AtomicU64,
}

impl Counters {
    pub fn snapshot(&self, queue_depth: usize) -> HudStats {
        HudStats {
            msg_sent: self.msg_sent.load(Ordering::Relaxed),
            img_sent: self.img_sent.load(Ordering::Relaxed),
            cmd_sent: self.cmd_sent.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            queue_depth,
        }
    }
}
