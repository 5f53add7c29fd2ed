use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tracing::{debug, info, trace, warn};

use hudlink_proto::{encode_img_png, encode_msg_command, encode_msg_snapshot, MsgCommand};

use crate::config::HudConfig;
use crate::error::HostError;
use crate::gps::GpsPoint;
use crate::listener::{Channel, HudListener};
use crate::provider::MapImageProvider;
use crate::queue::{OutboundFrame, SendQueue};
use crate::state::VehicleStateStore;
use crate::stats::{Counters, HudStats};
use crate::track::{Ingest, MapAction, TrackState};
use crate::transport::HudTransport;

const WRITER_POLL: Duration = Duration::from_millis(100);
const DRAIN_PATIENCE: Duration = Duration::from_secs(1);

/// The host-side HUD engine.
///
/// Accepts vehicle-state writes and GPS samples from any thread, coalesces
/// them into MSGF snapshot frames at the configured rate, renders the GPS
/// track into IMGF map frames through the [`MapImageProvider`], and drains
/// everything to the [`HudTransport`] on a prioritized writer thread.
///
/// `start`/`stop` are idempotent; `close` additionally closes the
/// transport. All public methods take `&self`.
pub struct HudHostSdk {
    shared: Arc<Shared>,
}

struct Shared {
    config: HudConfig,
    transport: Mutex<Box<dyn HudTransport>>,
    provider: Option<Box<dyn MapImageProvider>>,
    listener: RwLock<Option<Arc<dyn HudListener>>>,
    store: VehicleStateStore,
    queue: SendQueue,
    counters: Counters,
    seq: AtomicU32,
    order: AtomicU64,
    running: AtomicBool,
    writer_running: AtomicBool,
    msg_clock: Mutex<i64>,
    gps: Mutex<TrackState>,
    threads: Mutex<Threads>,
    sleep_lock: Mutex<()>,
    sleep_cv: Condvar,
}

#[derive(Default)]
struct Threads {
    scheduler: Option<thread::JoinHandle<()>>,
    writer: Option<thread::JoinHandle<()>>,
}

fn epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl HudHostSdk {
    /// Create an engine over `transport`.
    ///
    /// Without a `provider` only MSGF traffic is produced and GPS points
    /// still maintain the track, but no map renders are triggered.
    pub fn new(
        transport: Box<dyn HudTransport>,
        provider: Option<Box<dyn MapImageProvider>>,
        config: HudConfig,
    ) -> Self {
        let gps = Mutex::new(TrackState::new(&config));
        Self {
            shared: Arc::new(Shared {
                transport: Mutex::new(transport),
                provider,
                listener: RwLock::new(None),
                store: VehicleStateStore::new(),
                queue: SendQueue::default(),
                counters: Counters::default(),
                seq: AtomicU32::new(1),
                order: AtomicU64::new(0),
                running: AtomicBool::new(false),
                writer_running: AtomicBool::new(false),
                msg_clock: Mutex::new(0),
                gps,
                threads: Mutex::new(Threads::default()),
                sleep_lock: Mutex::new(()),
                sleep_cv: Condvar::new(),
                config,
            }),
        }
    }

    /// Install or remove the event listener.
    pub fn set_listener(&self, listener: Option<Arc<dyn HudListener>>) {
        *self.shared.listener.write().unwrap() = listener;
    }

    /// Current counters and queue depth.
    pub fn stats(&self) -> HudStats {
        self.shared.counters.snapshot(self.shared.queue.len())
    }

    /// Start the writer thread and the MSG scheduler. Safe to call again.
    pub fn start(&self) {
        let shared = &self.shared;
        if shared.running.swap(true, Ordering::SeqCst) {
            return;
        }
        shared.writer_running.store(true, Ordering::SeqCst);
        info!("hud sdk starting");

        let mut threads = shared.threads.lock().unwrap();
        let writer_shared = Arc::clone(shared);
        threads.writer = thread::Builder::new()
            .name("hudlink-writer".into())
            .spawn(move || writer_loop(&writer_shared))
            .ok();

        let period_ms = (1000 / shared.config.msg_rate_hz.max(1)).max(1) as u64;
        let scheduler_shared = Arc::clone(shared);
        threads.scheduler = thread::Builder::new()
            .name("hudlink-msg-scheduler".into())
            .spawn(move || scheduler_loop(&scheduler_shared, Duration::from_millis(period_ms)))
            .ok();
    }

    /// Stop both threads, draining the queue with bounded patience. Safe to
    /// call again.
    pub fn stop(&self) {
        let shared = &self.shared;
        if !shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("hud sdk stopping");
        shared.writer_running.store(false, Ordering::SeqCst);
        {
            // pair the notify with the sleep lock so no sleeper misses it
            let _guard = shared.sleep_lock.lock().unwrap();
            shared.sleep_cv.notify_all();
        }

        let mut threads = shared.threads.lock().unwrap();
        if let Some(handle) = threads.scheduler.take() {
            let _ = handle.join();
        }
        if let Some(handle) = threads.writer.take() {
            let _ = handle.join();
        }
    }

    /// Stop and close the transport.
    pub fn close(&self) {
        self.stop();
        let result = self.shared.transport.lock().unwrap().close();
        if let Err(e) = result {
            self.shared
                .emit_error("transport.close", HostError::TransportClose(e));
        }
    }

    pub fn set_speed_kmh(&self, value: i32) {
        self.shared.store.set_speed_kmh(value);
        self.maybe_burst();
    }

    pub fn set_engine_rpm(&self, value: i32) {
        self.shared.store.set_engine_rpm(value);
        self.maybe_burst();
    }

    pub fn set_odo_m(&self, value: i32) {
        self.shared.store.set_odo_m(value);
        self.maybe_burst();
    }

    pub fn set_trip_odo_m(&self, value: i32) {
        self.shared.store.set_trip_odo_m(value);
        self.maybe_burst();
    }

    pub fn set_outside_temp_deci_c(&self, value: i32) {
        self.shared.store.set_outside_temp_deci_c(value);
        self.maybe_burst();
    }

    pub fn set_inside_temp_deci_c(&self, value: i32) {
        self.shared.store.set_inside_temp_deci_c(value);
        self.maybe_burst();
    }

    pub fn set_battery_mv(&self, value: i32) {
        self.shared.store.set_battery_mv(value);
        self.maybe_burst();
    }

    pub fn set_current_time_minutes(&self, value: i32) {
        self.shared.store.set_current_time_minutes(value);
        self.maybe_burst();
    }

    pub fn set_trip_time_minutes(&self, value: i32) {
        self.shared.store.set_trip_time_minutes(value);
        self.maybe_burst();
    }

    pub fn set_fuel_left_deci_l(&self, value: i32) {
        self.shared.store.set_fuel_left_deci_l(value);
        self.maybe_burst();
    }

    pub fn set_fuel_total_deci_l(&self, value: i32) {
        self.shared.store.set_fuel_total_deci_l(value);
        self.maybe_burst();
    }

    /// Overwrite the whole snapshot at once.
    pub fn update_snapshot(&self, snapshot: hudlink_proto::VehicleSnapshot) {
        self.shared.store.update(snapshot);
        self.maybe_burst();
    }

    /// Queue a reboot command (MSGF cmd 0x01) on the control lane.
    pub fn send_reboot(&self) {
        let shared = &self.shared;
        let seq = shared.next_seq();
        let bytes = encode_msg_command(MsgCommand::Reboot, seq, shared.config.enable_crc32);
        shared.queue.push_cmd(shared.frame(Channel::Cmd, seq, bytes));
        debug!("queued reboot command, seq={}", seq);
    }

    /// Queue a PNG on the IMGF lane.
    ///
    /// Empty or oversized images are dropped and reported, not errors.
    pub fn send_png(&self, png: &[u8]) {
        if png.is_empty() {
            self.shared.emit_drop(Channel::Img, "empty image");
            return;
        }
        enqueue_png(&self.shared, png);
    }

    /// Feed one GPS sample through the filter and, when accepted, the map
    /// triggers.
    pub fn push_gps_point(&self, point: GpsPoint) {
        let shared = &self.shared;
        let now = epoch_ms();
        let running = shared.running.load(Ordering::SeqCst);
        let (outcome, action) = {
            let mut gps = shared.gps.lock().unwrap();
            match gps.ingest(point, &shared.config) {
                Ingest::Filtered(reason) => (Some(reason), MapAction::None),
                Ingest::Accepted => {
                    let action = if shared.provider.is_some() {
                        gps.maybe_trigger(now, running, &shared.config)
                    } else {
                        MapAction::None
                    };
                    (None, action)
                }
            }
        };

        match outcome {
            Some(reason) => {
                trace!("gps point filtered: {}", reason);
                if let Some(l) = shared.listener() {
                    l.on_gps_filtered(&point, &reason);
                }
            }
            None => {
                if let Some(l) = shared.listener() {
                    l.on_gps_accepted(&point);
                }
            }
        }
        handle_map_action(shared, action);
    }

    /// Convenience overload taking the bare fix.
    pub fn push_gps_fix(&self, latitude: f64, longitude: f64, timestamp_ms: i64) {
        self.push_gps_point(GpsPoint::new(latitude, longitude, timestamp_ms));
    }

    fn maybe_burst(&self) {
        let shared = &self.shared;
        if !shared.config.burst_on_vehicle_data_change || !shared.running.load(Ordering::SeqCst) {
            return;
        }
        msg_tick(shared);
    }
}

impl Drop for HudHostSdk {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Shared {
    fn listener(&self) -> Option<Arc<dyn HudListener>> {
        self.listener.read().unwrap().clone()
    }

    fn next_seq(&self) -> u32 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }

    fn frame(&self, channel: Channel, seq: u32, bytes: Bytes) -> OutboundFrame {
        OutboundFrame {
            channel,
            order: self.order.fetch_add(1, Ordering::SeqCst),
            seq,
            bytes,
        }
    }

    fn emit_drop(&self, channel: Channel, reason: &str) {
        self.counters.dropped.fetch_add(1, Ordering::Relaxed);
        debug!("frame dropped: channel={}, reason={}", channel, reason);
        if let Some(l) = self.listener() {
            l.on_frame_dropped(channel, reason);
        }
    }

    fn emit_error(&self, stage: &str, error: HostError) {
        self.counters.errors.fetch_add(1, Ordering::Relaxed);
        warn!("host error at {}: {}", stage, error);
        if let Some(l) = self.listener() {
            l.on_error(stage, &error);
        }
    }

    /// Sleep for `duration` unless `stop` wakes us first; returns whether
    /// the SDK is still running.
    fn wait_cancellable(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut guard = self.sleep_lock.lock().unwrap();
        while self.running.load(Ordering::SeqCst) {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            let (g, _) = self.sleep_cv.wait_timeout(guard, deadline - now).unwrap();
            guard = g;
        }
        false
    }
}

fn handle_map_action(shared: &Arc<Shared>, action: MapAction) {
    match action {
        MapAction::None => {}
        MapAction::Fetch(points) => spawn_fetch(shared, points),
        MapAction::Retry { delay_ms } => spawn_retry(shared, delay_ms),
    }
}

fn spawn_fetch(shared: &Arc<Shared>, points: Vec<GpsPoint>) {
    let worker = Arc::clone(shared);
    let spawned = thread::Builder::new()
        .name("hudlink-map-fetch".into())
        .spawn(move || run_fetch(&worker, points));
    if let Err(e) = spawned {
        shared.gps.lock().unwrap().fetch_rejected();
        shared.emit_error("map.schedule", HostError::ScheduleReject(e.to_string()));
    }
}

fn spawn_retry(shared: &Arc<Shared>, delay_ms: i64) {
    let timer = Arc::clone(shared);
    let spawned = thread::Builder::new()
        .name("hudlink-map-retry".into())
        .spawn(move || {
            if !timer.wait_cancellable(Duration::from_millis(delay_ms.max(1) as u64)) {
                timer.gps.lock().unwrap().retry_cancelled();
                return;
            }
            let running = timer.running.load(Ordering::SeqCst);
            let action = timer.gps.lock().unwrap().retry_fire(epoch_ms(), running);
            handle_map_action(&timer, action);
        });
    if let Err(e) = spawned {
        shared.gps.lock().unwrap().retry_cancelled();
        shared.emit_error(
            "map.retry.schedule",
            HostError::ScheduleReject(e.to_string()),
        );
    }
}

fn run_fetch(shared: &Arc<Shared>, points: Vec<GpsPoint>) {
    debug!("map fetch with {} track points", points.len());
    // provider presence is checked before a fetch is ever scheduled
    let Some(provider) = shared.provider.as_ref() else {
        return;
    };
    let mut ok = false;
    match provider.fetch_track_image(&points) {
        Ok(png) if !png.is_empty() => {
            enqueue_png(shared, &png);
            ok = true;
        }
        Ok(_) => shared.emit_drop(Channel::Img, "map provider returned empty image"),
        Err(e) => shared.emit_error("map.fetch", HostError::Provider(e)),
    }

    let running = shared.running.load(Ordering::SeqCst);
    let action = shared
        .gps
        .lock()
        .unwrap()
        .complete_fetch(ok, epoch_ms(), running, &shared.config);
    handle_map_action(shared, action);
}

fn enqueue_png(shared: &Arc<Shared>, png: &[u8]) {
    if png.len() > shared.config.img_max_bytes {
        shared.emit_drop(Channel::Img, &format!("image too large: {}", png.len()));
        return;
    }
    let seq = shared.next_seq();
    let bytes = encode_img_png(png, seq, shared.config.enable_crc32);
    let dropped = shared
        .queue
        .push_img(shared.frame(Channel::Img, seq, bytes), shared.config.img_queue_capacity);
    for _ in 0..dropped {
        shared.emit_drop(Channel::Img, "drop old image");
    }
    trace!("queued IMGF frame, seq={}, {} bytes", seq, png.len());
}

fn scheduler_loop(shared: &Arc<Shared>, period: Duration) {
    debug!("msg scheduler started, period={:?}", period);
    while shared.running.load(Ordering::SeqCst) {
        msg_tick(shared);
        if !shared.wait_cancellable(period) {
            break;
        }
    }
    debug!("msg scheduler stopped");
}

fn msg_tick(shared: &Arc<Shared>) {
    if !shared.running.load(Ordering::SeqCst) {
        return;
    }
    let (snapshot, dirty) = shared.store.snapshot();
    let now = epoch_ms();

    let mut last_sent = shared.msg_clock.lock().unwrap();
    let should_send = if dirty {
        true
    } else {
        let idle_interval = (1000 / i64::from(shared.config.msg_idle_rate_hz.max(1))).max(1);
        now - *last_sent >= idle_interval
    };
    if !should_send {
        return;
    }

    let seq = shared.next_seq();
    let bytes = encode_msg_snapshot(&snapshot, seq, shared.config.enable_crc32);
    let dropped = shared.queue.push_msg(shared.frame(Channel::Msg, seq, bytes));
    *last_sent = now;
    drop(last_sent);

    for _ in 0..dropped {
        shared.emit_drop(Channel::Msg, "replace old snapshot");
    }
}

fn writer_loop(shared: &Arc<Shared>) {
    debug!("writer thread started");
    while shared.writer_running.load(Ordering::SeqCst) {
        if let Some(frame) = shared.queue.pop_timeout(WRITER_POLL) {
            write_frame(shared, frame);
        }
    }
    // drain what is left, with bounded patience
    let deadline = Instant::now() + DRAIN_PATIENCE;
    while let Some(frame) = shared.queue.try_pop() {
        write_frame(shared, frame);
        if Instant::now() >= deadline {
            break;
        }
    }
    debug!("writer thread stopped");
}

fn write_frame(shared: &Arc<Shared>, frame: OutboundFrame) {
    let result = {
        let mut transport = shared.transport.lock().unwrap();
        transport
            .write(&frame.bytes)
            .and_then(|_| transport.flush())
    };
    match result {
        Ok(()) => {
            let counter = match frame.channel {
                Channel::Msg => &shared.counters.msg_sent,
                Channel::Img => &shared.counters.img_sent,
                Channel::Cmd => &shared.counters.cmd_sent,
            };
            counter.fetch_add(1, Ordering::Relaxed);
            trace!(
                "frame sent: channel={}, seq={}, {} bytes",
                frame.channel,
                frame.seq,
                frame.bytes.len()
            );
            if let Some(l) = shared.listener() {
                l.on_frame_sent(frame.channel, frame.seq, frame.bytes.len());
            }
        }
        Err(e) => shared.emit_error("transport.write", HostError::TransportWrite(e)),
    }
}
