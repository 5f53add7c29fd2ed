use std::cell::UnsafeCell;
use std::collections::VecDeque;
use std::sync::Mutex;

use hudlink_proto::{FrameHeader, MAGIC_MSGF};

use crate::error::DeviceError;
use crate::receiver::{DropReason, FrameReceiver, RxGrant};

/// Config for [`MsgfReceiver`].
#[derive(Debug, Clone)]
pub struct MsgfConfig {
    /// Capacity of each pool slot.
    pub max_msg_bytes: usize,
    /// Number of pool slots, which also bounds the ready queue.
    pub queue_depth: usize,
    /// Gate frames on the payload CRC.
    pub require_crc: bool,
}

impl Default for MsgfConfig {
    fn default() -> Self {
        Self {
            max_msg_bytes: 1024,
            queue_depth: 8,
            require_crc: false,
        }
    }
}

/// Per-receiver counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MsgfStats {
    pub frames_ok: u64,
    pub frames_drop: u64,
    pub frames_bad: u64,
}

#[derive(Debug, Clone, Copy)]
struct MsgItem {
    slot: usize,
    len: usize,
    seq: u32,
}

/// Bounded FIFO of short messages backed by a rotating slot pool.
///
/// The write slot advances round-robin on every `acquire`, independently
/// of the ready queue, so a slot can be overwritten if the consumer lags
/// far behind: call [`MsgfReceiver::pop`] promptly after frames arrive;
/// `queue_depth` bounds the slack window.
pub struct MsgfReceiver {
    config: MsgfConfig,
    pool: Vec<UnsafeCell<Box<[u8]>>>,
    inner: Mutex<Inner>,
}

struct Inner {
    next_slot: usize,
    ready: VecDeque<MsgItem>,
    stats: MsgfStats,
}

// SAFETY: the router writes only the slot it was granted; `pop` copies
// out under the same mutex that rotates slots, and `acquire` refuses new
// grants while the ready queue is full, keeping reads and writes on
// distinct slots under the documented pop-promptly contract.
unsafe impl Send for MsgfReceiver {}
unsafe impl Sync for MsgfReceiver {}

impl MsgfReceiver {
    /// Allocate the whole pool up front; the receive path never allocates.
    pub fn new(config: MsgfConfig) -> Result<Self, DeviceError> {
        if config.max_msg_bytes < 16 {
            return Err(DeviceError::InvalidConfig(
                "max_msg_bytes must be >= 16".into(),
            ));
        }
        if config.queue_depth < 2 {
            return Err(DeviceError::InvalidConfig(
                "queue_depth must be >= 2".into(),
            ));
        }
        let pool = (0..config.queue_depth)
            .map(|_| UnsafeCell::new(vec![0u8; config.max_msg_bytes].into_boxed_slice()))
            .collect();
        Ok(Self {
            config,
            pool,
            inner: Mutex::new(Inner {
                next_slot: 0,
                ready: VecDeque::new(),
                stats: MsgfStats::default(),
            }),
        })
    }

    pub fn stats(&self) -> MsgfStats {
        self.inner.lock().unwrap().stats
    }

    /// Pop the oldest ready message into `dst`, copying at most
    /// `dst.len()` bytes. Non-blocking; returns `(len, seq)`.
    pub fn pop(&self, dst: &mut [u8]) -> Option<(usize, u32)> {
        if dst.is_empty() {
            return None;
        }
        let mut inner = self.inner.lock().unwrap();
        let item = inner.ready.pop_front()?;
        let n = item.len.min(dst.len());
        // SAFETY: the copy happens under the same lock that rotates
        // slots, and the grant for this slot was committed before the
        // item entered the queue.
        let src = unsafe { &(&*self.pool[item.slot].get())[..n] };
        dst[..n].copy_from_slice(src);
        Some((n, item.seq))
    }
}

impl FrameReceiver for MsgfReceiver {
    fn magic(&self) -> u32 {
        MAGIC_MSGF
    }

    fn max_len(&self) -> usize {
        self.config.max_msg_bytes
    }

    fn require_crc(&self) -> bool {
        self.config.require_crc
    }

    fn acquire(&self, _header: &FrameHeader) -> Option<RxGrant<'_>> {
        let mut inner = self.inner.lock().unwrap();
        if inner.ready.len() >= self.config.queue_depth {
            inner.stats.frames_drop += 1;
            return None;
        }
        let slot = inner.next_slot;
        inner.next_slot = (slot + 1) % self.config.queue_depth;
        drop(inner);
        // SAFETY: the slot was just claimed by rotation and its previous
        // contents are either consumed or sacrificed by contract.
        let buf = unsafe { &mut *self.pool[slot].get() };
        Some(RxGrant::new(&mut buf[..], slot as u32))
    }

    fn commit(&self, header: &FrameHeader, grant: RxGrant<'_>, len: usize) {
        let mut inner = self.inner.lock().unwrap();
        if inner.ready.len() >= self.config.queue_depth {
            inner.stats.frames_drop += 1;
            return;
        }
        inner.ready.push_back(MsgItem {
            slot: grant.token() as usize,
            len,
            seq: header.seq.get(),
        });
        inner.stats.frames_ok += 1;
    }

    fn abort(&self, _grant: RxGrant<'_>, _reason: DropReason) {
        self.inner.lock().unwrap().stats.frames_bad += 1;
    }

    fn reject(&self, _header: &FrameHeader, _reason: DropReason) {
        self.inner.lock().unwrap().stats.frames_bad += 1;
    }
}
