use std::cell::UnsafeCell;
use std::sync::Mutex;

use hudlink_proto::{FrameHeader, MAGIC_IMGF};

use crate::error::DeviceError;
use crate::receiver::{DropReason, FrameReceiver, RxGrant};

/// What to do when a new image arrives while both buffers are occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropPolicy {
    /// Demote a READY (not yet consumed) image and reuse its buffer.
    #[default]
    DropOld,
    /// Drop the incoming frame instead.
    DropNew,
}

/// Config for [`ImgfReceiver`].
#[derive(Debug, Clone)]
pub struct ImgfConfig {
    /// Capacity of each of the two image buffers.
    pub max_png_bytes: usize,
    /// Gate frames on the payload CRC.
    pub require_crc: bool,
    pub drop_policy: DropPolicy,
}

impl Default for ImgfConfig {
    fn default() -> Self {
        Self {
            max_png_bytes: 128 * 1024,
            require_crc: false,
            drop_policy: DropPolicy::DropOld,
        }
    }
}

/// Per-receiver counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImgfStats {
    /// Frames committed.
    pub frames_ok: u64,
    /// Frames dropped by the buffer policy.
    pub frames_drop: u64,
    /// Frames the router discarded (bad length, bad CRC, ...).
    pub frames_bad: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Free,
    Writing,
    Ready,
    Reading,
}

/// Names the slot loaned to the consumer by [`ImgfReceiver::ready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImgToken(u32);

/// A ready PNG on loan to the consumer.
#[derive(Debug)]
pub struct ReadyImage<'a> {
    pub png: &'a [u8],
    pub seq: u32,
    pub token: ImgToken,
}

/// Double-buffered, zero-copy PNG receiver.
///
/// The router fills one buffer while the consumer may still be reading
/// the other. Slot states move FREE → WRITING → READY → READING → FREE
/// under one mutex; at most one slot is WRITING and one READING at any
/// time. The consumer must hand its token back through
/// [`ImgfReceiver::release`] before that slot can be recycled.
pub struct ImgfReceiver {
    config: ImgfConfig,
    buffers: [UnsafeCell<Box<[u8]>>; 2],
    inner: Mutex<Inner>,
}

struct Inner {
    state: [SlotState; 2],
    len: [usize; 2],
    seq: [u32; 2],
    write_idx: usize,
    stats: ImgfStats,
}

// SAFETY: buffer bytes are only touched by the holder of a grant (the
// WRITING slot, router task) or of a token (the READING slot, consumer
// task); the state machine under `inner` never lets those name the same
// slot.
unsafe impl Send for ImgfReceiver {}
unsafe impl Sync for ImgfReceiver {}

impl ImgfReceiver {
    /// Allocate both buffers up front; the receive path never allocates.
    pub fn new(config: ImgfConfig) -> Result<Self, DeviceError> {
        if config.max_png_bytes < 1024 {
            return Err(DeviceError::InvalidConfig(
                "max_png_bytes must be >= 1024".into(),
            ));
        }
        let cap = config.max_png_bytes;
        Ok(Self {
            config,
            buffers: [
                UnsafeCell::new(vec![0u8; cap].into_boxed_slice()),
                UnsafeCell::new(vec![0u8; cap].into_boxed_slice()),
            ],
            inner: Mutex::new(Inner {
                state: [SlotState::Free; 2],
                len: [0; 2],
                seq: [0; 2],
                write_idx: 0,
                stats: ImgfStats::default(),
            }),
        })
    }

    pub fn stats(&self) -> ImgfStats {
        self.inner.lock().unwrap().stats
    }

    /// Take a READY image, moving its slot to READING. Slot 0 wins a tie.
    pub fn ready(&self) -> Option<ReadyImage<'_>> {
        let mut inner = self.inner.lock().unwrap();
        let idx = if inner.state[0] == SlotState::Ready {
            0
        } else if inner.state[1] == SlotState::Ready {
            1
        } else {
            return None;
        };
        inner.state[idx] = SlotState::Reading;
        let len = inner.len[idx];
        let seq = inner.seq[idx];
        drop(inner);
        // SAFETY: the slot is READING; the router will not write it until
        // the token is released.
        let png = unsafe { &(&*self.buffers[idx].get())[..len] };
        Some(ReadyImage {
            png,
            seq,
            token: ImgToken(idx as u32),
        })
    }

    /// Hand a loaned slot back; it becomes FREE for the router again.
    pub fn release(&self, token: ImgToken) {
        let mut inner = self.inner.lock().unwrap();
        let idx = token.0 as usize;
        // only a loaned slot goes back to FREE
        if inner.state[idx] == SlotState::Reading {
            inner.state[idx] = SlotState::Free;
            inner.len[idx] = 0;
        }
    }
}

impl FrameReceiver for ImgfReceiver {
    fn magic(&self) -> u32 {
        MAGIC_IMGF
    }

    fn max_len(&self) -> usize {
        self.config.max_png_bytes
    }

    fn require_crc(&self) -> bool {
        self.config.require_crc
    }

    fn acquire(&self, _header: &FrameHeader) -> Option<RxGrant<'_>> {
        let mut inner = self.inner.lock().unwrap();
        let mut idx = inner.write_idx;
        if inner.state[idx] != SlotState::Free && inner.state[idx ^ 1] == SlotState::Free {
            idx ^= 1;
        }
        if inner.state[idx] != SlotState::Free {
            match self.config.drop_policy {
                DropPolicy::DropOld => {
                    let stale = if inner.state[0] == SlotState::Ready {
                        Some(0)
                    } else if inner.state[1] == SlotState::Ready {
                        Some(1)
                    } else {
                        None
                    };
                    let Some(stale) = stale else {
                        inner.stats.frames_drop += 1;
                        return None;
                    };
                    inner.state[stale] = SlotState::Free;
                    inner.len[stale] = 0;
                    inner.stats.frames_drop += 1;
                    idx = stale;
                }
                DropPolicy::DropNew => {
                    inner.stats.frames_drop += 1;
                    return None;
                }
            }
        }
        inner.write_idx = idx;
        inner.state[idx] = SlotState::Writing;
        drop(inner);
        // SAFETY: the slot is WRITING and exclusively the grant holder's
        // until commit or abort.
        let buf = unsafe { &mut *self.buffers[idx].get() };
        Some(RxGrant::new(&mut buf[..], idx as u32))
    }

    fn commit(&self, header: &FrameHeader, grant: RxGrant<'_>, len: usize) {
        let mut inner = self.inner.lock().unwrap();
        let idx = grant.token() as usize;
        inner.state[idx] = SlotState::Ready;
        inner.len[idx] = len;
        inner.seq[idx] = header.seq.get();
        inner.stats.frames_ok += 1;
        inner.write_idx = idx ^ 1;
    }

    fn abort(&self, grant: RxGrant<'_>, _reason: DropReason) {
        let mut inner = self.inner.lock().unwrap();
        let idx = grant.token() as usize;
        inner.stats.frames_bad += 1;
        if inner.state[idx] == SlotState::Writing {
            inner.state[idx] = SlotState::Free;
            inner.len[idx] = 0;
        }
    }

    fn reject(&self, _header: &FrameHeader, _reason: DropReason) {
        self.inner.lock().unwrap().stats.frames_bad += 1;
    }
}
