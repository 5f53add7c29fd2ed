//! Common test doubles: a capturing transport and a recording listener.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use hudlink_host::{Channel, GpsPoint, HostError, HudListener, HudTransport};

/// Transport that records every written frame.
#[derive(Default)]
pub struct MockTransport {
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
    closed: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn new() -> (Self, Arc<Mutex<Vec<Vec<u8>>>>, Arc<AtomicBool>) {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        (
            Self {
                frames: Arc::clone(&frames),
                closed: Arc::clone(&closed),
            },
            frames,
            closed,
        )
    }
}

impl HudTransport for MockTransport {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.frames.lock().unwrap().push(data.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Transport whose writes always fail.
#[allow(dead_code)]
pub struct FailingTransport;

impl HudTransport for FailingTransport {
    fn write(&mut self, _data: &[u8]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Everything the listener observed, in arrival order.
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum Event {
    Sent(Channel, u32, usize),
    Dropped(Channel, String),
    GpsAccepted(i64),
    GpsFiltered(i64, String),
    Error(String),
}

#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Event>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl HudListener for RecordingListener {
    fn on_frame_sent(&self, channel: Channel, seq: u32, bytes: usize) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Sent(channel, seq, bytes));
    }

    fn on_frame_dropped(&self, channel: Channel, reason: &str) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Dropped(channel, reason.to_string()));
    }

    fn on_gps_accepted(&self, point: &GpsPoint) {
        self.events
            .lock()
            .unwrap()
            .push(Event::GpsAccepted(point.timestamp_ms));
    }

    fn on_gps_filtered(&self, point: &GpsPoint, reason: &str) {
        self.events
            .lock()
            .unwrap()
            .push(Event::GpsFiltered(point.timestamp_ms, reason.to_string()));
    }

    fn on_error(&self, stage: &str, _error: &HostError) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Error(stage.to_string()));
    }
}
