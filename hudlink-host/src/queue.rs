use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::listener::Channel;

/// One encoded frame waiting for the writer thread.
#[derive(Debug, Clone)]
pub(crate) struct OutboundFrame {
    pub channel: Channel,
    pub order: u64,
    pub seq: u32,
    pub bytes: Bytes,
}

impl OutboundFrame {
    fn key(&self) -> (u8, u64) {
        (self.channel as u8, self.order)
    }
}

/// Priority send queue with per-channel replacement policies.
///
/// Frames drain in `(priority, enqueue order)` order. An MSGF push replaces
/// every queued MSGF frame (the newest snapshot wins); IMGF is bounded with
/// oldest-out eviction; CTRL frames are always kept. Policy drops are
/// returned so the caller can report them.
#[derive(Debug, Default)]
pub(crate) struct SendQueue {
    inner: Mutex<Vec<OutboundFrame>>,
    available: Condvar,
}

impl SendQueue {
    pub fn push_cmd(&self, frame: OutboundFrame) {
        let mut queue = self.inner.lock().unwrap();
        queue.push(frame);
        self.available.notify_one();
    }

    /// Replace every queued MSGF frame with `frame`; returns the number of
    /// stale snapshots removed.
    pub fn push_msg(&self, frame: OutboundFrame) -> usize {
        let mut queue = self.inner.lock().unwrap();
        let before = queue.len();
        queue.retain(|f| f.channel != Channel::Msg);
        let dropped = before - queue.len();
        queue.push(frame);
        self.available.notify_one();
        dropped
    }

    /// Append an IMGF frame, then evict the oldest IMGF frames beyond
    /// `capacity`; returns the number evicted.
    pub fn push_img(&self, frame: OutboundFrame, capacity: usize) -> usize {
        let capacity = capacity.max(1);
        let mut queue = self.inner.lock().unwrap();
        queue.push(frame);
        let mut imgs: Vec<u64> = queue
            .iter()
            .filter(|f| f.channel == Channel::Img)
            .map(|f| f.order)
            .collect();
        if imgs.len() <= capacity {
            self.available.notify_one();
            return 0;
        }
        imgs.sort_unstable();
        let evicted = &imgs[..imgs.len() - capacity];
        queue.retain(|f| f.channel != Channel::Img || !evicted.contains(&f.order));
        self.available.notify_one();
        evicted.len()
    }

    /// Remove and return the highest-priority frame, waiting up to
    /// `timeout` for one to arrive.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<OutboundFrame> {
        let deadline = Instant::now() + timeout;
        let mut queue = self.inner.lock().unwrap();
        loop {
            if let Some(frame) = Self::take_min(&mut queue) {
                return Some(frame);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, _) = self
                .available
                .wait_timeout(queue, deadline - now)
                .unwrap();
            queue = guard;
        }
    }

    /// Non-blocking pop, used by the shutdown drain.
    pub fn try_pop(&self) -> Option<OutboundFrame> {
        Self::take_min(&mut self.inner.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    fn take_min(queue: &mut Vec<OutboundFrame>) -> Option<OutboundFrame> {
        let idx = queue
            .iter()
            .enumerate()
            .min_by_key(|(_, f)| f.key())
            .map(|(i, _)| i)?;
        Some(queue.swap_remove(idx))
    }
}
