use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing::{debug, trace};

use hudlink_proto::{FrameHeader, FRAME_HEADER_SIZE};

use crate::error::DeviceError;
use crate::receiver::{DropReason, FrameReceiver};
use crate::transport::DeviceTransport;

const MIN_READ_CHUNK: usize = 512;
const MAX_READ_CHUNK: usize = 16 * 1024;
const IDLE_SLEEP: Duration = Duration::from_millis(1);

/// Hook invoked with the byte count after every successful transport read.
pub type RxActivityHook = Box<dyn Fn(usize) + Send + Sync>;

/// Router tuning.
pub struct RouterConfig {
    /// Transport read size; clamped to [512, 16384].
    pub read_chunk: usize,
    /// Observer for link activity (host-idle detection and the like).
    pub on_rx_activity: Option<RxActivityHook>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            read_chunk: 8192,
            on_rx_activity: None,
        }
    }
}

/// Point-in-time router counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub bytes_rx: u64,
    pub frames_ok: u64,
    pub frames_dropped: u64,
    pub resync_count: u64,
}

#[derive(Default)]
struct StatCells {
    bytes_rx: AtomicU64,
    frames_ok: AtomicU64,
    frames_dropped: AtomicU64,
    resync_count: AtomicU64,
}

/// Parse state carried between [`StreamRouter::poll`] calls: the scratch
/// read buffer and the partially assembled header.
pub struct RxCursor {
    scratch: Vec<u8>,
    header: [u8; FRAME_HEADER_SIZE],
    header_got: usize,
}

/// Demultiplexes the transport byte stream into registered receivers.
///
/// A three-state machine per frame: collect the 20-byte header (possibly
/// across reads), bind the receiver by magic, then move the payload
/// straight into receiver-owned storage. Header validation failures slide
/// the header window one byte and rescan. The router owns no payload
/// memory and allocates nothing on the receive path beyond the scratch
/// buffer created with the cursor.
pub struct StreamRouter {
    read_chunk: usize,
    on_rx_activity: Option<RxActivityHook>,
    registry: Mutex<Registry>,
    stats: StatCells,
    running: AtomicBool,
}

#[derive(Default)]
struct Registry {
    receivers: Vec<Arc<dyn FrameReceiver>>,
    default: Option<Arc<dyn FrameReceiver>>,
}

impl StreamRouter {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            read_chunk: config.read_chunk.clamp(MIN_READ_CHUNK, MAX_READ_CHUNK),
            on_rx_activity: config.on_rx_activity,
            registry: Mutex::new(Registry::default()),
            stats: StatCells::default(),
            running: AtomicBool::new(true),
        }
    }

    /// Register a receiver for its magic.
    pub fn register(&self, receiver: Arc<dyn FrameReceiver>) -> Result<(), DeviceError> {
        let mut registry = self.registry.lock().unwrap();
        if registry
            .receivers
            .iter()
            .any(|r| r.magic() == receiver.magic())
        {
            return Err(DeviceError::DuplicateReceiver(receiver.magic()));
        }
        debug!("registered receiver for magic 0x{:08x}", receiver.magic());
        registry.receivers.push(receiver);
        Ok(())
    }

    /// Install a catch-all receiver for unknown magics, or remove it.
    pub fn set_default(&self, receiver: Option<Arc<dyn FrameReceiver>>) {
        self.registry.lock().unwrap().default = receiver;
    }

    pub fn stats(&self) -> RouterStats {
        RouterStats {
            bytes_rx: self.stats.bytes_rx.load(Ordering::Relaxed),
            frames_ok: self.stats.frames_ok.load(Ordering::Relaxed),
            frames_dropped: self.stats.frames_dropped.load(Ordering::Relaxed),
            resync_count: self.stats.resync_count.load(Ordering::Relaxed),
        }
    }

    pub fn reset_stats(&self) {
        self.stats.bytes_rx.store(0, Ordering::Relaxed);
        self.stats.frames_ok.store(0, Ordering::Relaxed);
        self.stats.frames_dropped.store(0, Ordering::Relaxed);
        self.stats.resync_count.store(0, Ordering::Relaxed);
    }

    /// Ask a running [`StreamRouter::run`] loop to exit.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Fresh parse state sized for this router.
    pub fn cursor(&self) -> RxCursor {
        RxCursor {
            scratch: vec![0u8; self.read_chunk],
            header: [0; FRAME_HEADER_SIZE],
            header_got: 0,
        }
    }

    /// Receive loop: poll until [`StreamRouter::stop`], yielding briefly
    /// when the transport is idle.
    pub fn run<T: DeviceTransport>(&self, transport: &mut T) {
        self.running.store(true, Ordering::SeqCst);
        let mut cursor = self.cursor();
        debug!("stream router rx loop started");
        while self.running.load(Ordering::SeqCst) {
            if self.poll(transport, &mut cursor) == 0 {
                thread::sleep(IDLE_SLEEP);
            }
        }
        debug!("stream router rx loop stopped");
    }

    /// Drain what the transport has right now; returns the number of
    /// bytes consumed. Blocks only to finish a frame whose payload is
    /// mid-flight.
    pub fn poll<T: DeviceTransport>(&self, transport: &mut T, cursor: &mut RxCursor) -> usize {
        if transport.available() == 0 {
            return 0;
        }
        let mut n = transport.read(&mut cursor.scratch);
        if n == 0 {
            return 0;
        }
        self.note_read(n);
        let mut total = n;
        let mut off = 0usize;

        loop {
            // assemble the 20-byte header, possibly across polls
            if cursor.header_got < FRAME_HEADER_SIZE {
                let take = (FRAME_HEADER_SIZE - cursor.header_got).min(n - off);
                cursor.header[cursor.header_got..cursor.header_got + take]
                    .copy_from_slice(&cursor.scratch[off..off + take]);
                cursor.header_got += take;
                off += take;
                if cursor.header_got < FRAME_HEADER_SIZE {
                    return total;
                }
            }

            let header = FrameHeader::from(cursor.header);
            let magic = header.magic.get();
            let Some(receiver) = self.lookup(magic) else {
                trace!("no receiver for magic 0x{:08x}", magic);
                self.stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
                self.resync(cursor);
                continue;
            };

            let len = header.len.get() as usize;
            if len == 0 || len > receiver.max_len() {
                receiver.reject(&header, DropReason::BadLen);
                self.stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
                self.resync(cursor);
                continue;
            }
            // the header is consumed from here on
            cursor.header_got = 0;

            let Some(mut grant) = receiver.acquire(&header) else {
                receiver.reject(&header, DropReason::NoBuffer);
                self.stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
                // discard the payload so the stream stays framed
                let (nn, noff, read) = self.skip_payload(transport, cursor, n, off, len);
                n = nn;
                off = noff;
                total += read;
                continue;
            };
            if grant.capacity() < len {
                receiver.abort(grant, DropReason::NoBuffer);
                self.stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
                let (nn, noff, read) = self.skip_payload(transport, cursor, n, off, len);
                n = nn;
                off = noff;
                total += read;
                continue;
            }

            // move the payload into the granted buffer, across as many
            // reads as it takes
            let mut got = len.min(n - off);
            grant.as_mut()[..got].copy_from_slice(&cursor.scratch[off..off + got]);
            off += got;
            while got < len {
                if transport.available() == 0 {
                    if !self.running.load(Ordering::SeqCst) {
                        // frame cut short by shutdown
                        receiver.abort(grant, DropReason::BadLen);
                        self.stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
                        return total;
                    }
                    thread::sleep(IDLE_SLEEP);
                    continue;
                }
                let nn = transport.read(&mut cursor.scratch);
                if nn == 0 {
                    continue;
                }
                self.note_read(nn);
                total += nn;
                let take = (len - got).min(nn);
                grant.as_mut()[got..got + take].copy_from_slice(&cursor.scratch[..take]);
                got += take;
                if take < nn {
                    // bytes past the payload start the next frame
                    cursor.scratch.copy_within(take..nn, 0);
                    n = nn - take;
                    off = 0;
                } else {
                    n = nn;
                    off = nn;
                }
            }

            if receiver.require_crc() {
                let header_crc = header.crc32.get();
                let computed = crc32fast::hash(&grant.as_mut()[..len]);
                // a zero header CRC is rejected even when it would match
                if header_crc == 0 || header_crc != computed {
                    receiver.abort(grant, DropReason::BadCrc);
                    self.stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            }

            receiver.commit(&header, grant, len);
            self.stats.frames_ok.fetch_add(1, Ordering::Relaxed);
            trace!(
                "frame ok: magic=0x{:08x}, len={}, seq={}",
                magic,
                len,
                header.seq.get()
            );
        }
    }

    /// Consume and discard `len` payload bytes for a frame nobody could
    /// buffer. Returns the updated `(n, off)` view over the scratch buffer
    /// and the number of extra bytes read.
    fn skip_payload<T: DeviceTransport>(
        &self,
        transport: &mut T,
        cursor: &mut RxCursor,
        n: usize,
        off: usize,
        len: usize,
    ) -> (usize, usize, usize) {
        let mut skipped = len.min(n - off);
        let mut new_n = n;
        let mut new_off = off + skipped;
        let mut read_total = 0;
        while skipped < len {
            if transport.available() == 0 {
                if !self.running.load(Ordering::SeqCst) {
                    return (new_n, new_off, read_total);
                }
                thread::sleep(IDLE_SLEEP);
                continue;
            }
            let nn = transport.read(&mut cursor.scratch);
            if nn == 0 {
                continue;
            }
            self.note_read(nn);
            read_total += nn;
            let take = (len - skipped).min(nn);
            skipped += take;
            if take < nn {
                cursor.scratch.copy_within(take..nn, 0);
                new_n = nn - take;
                new_off = 0;
            } else {
                new_n = nn;
                new_off = nn;
            }
        }
        (new_n, new_off, read_total)
    }

    /// Slide the header window one byte and rescan.
    fn resync(&self, cursor: &mut RxCursor) {
        cursor.header.copy_within(1.., 0);
        cursor.header_got = FRAME_HEADER_SIZE - 1;
        self.stats.resync_count.fetch_add(1, Ordering::Relaxed);
    }

    fn lookup(&self, magic: u32) -> Option<Arc<dyn FrameReceiver>> {
        let registry = self.registry.lock().unwrap();
        registry
            .receivers
            .iter()
            .find(|r| r.magic() == magic)
            .cloned()
            .or_else(|| registry.default.clone())
    }

    fn note_read(&self, n: usize) {
        self.stats.bytes_rx.fetch_add(n as u64, Ordering::Relaxed);
        if let Some(hook) = &self.on_rx_activity {
            hook(n);
        }
    }
}
