use std::collections::VecDeque;

use crate::config::HudConfig;
use crate::gps::{bearing_delta_deg, haversine_m, GpsPoint};

/// Outcome of feeding one GPS point through the filter.
#[derive(Debug, PartialEq)]
pub(crate) enum Ingest {
    /// Point appended to the track.
    Accepted,
    /// Point rejected; the reason string is surfaced to the listener.
    Filtered(String),
}

/// What the SDK must do after a coordinator transition.
#[derive(Debug, PartialEq)]
pub(crate) enum MapAction {
    None,
    /// Launch a provider fetch with this track snapshot.
    Fetch(Vec<GpsPoint>),
    /// Arm the single retry timer for this delay.
    Retry { delay_ms: i64 },
}

/// Everything that lives under the GPS lock: the filtered track, the map
/// trigger counters, and the fetch/backoff state machine.
///
/// Methods take an explicit `now_ms` so the trigger and backoff schedule
/// are deterministic under test. The caller holds the surrounding mutex.
#[derive(Debug)]
pub(crate) struct TrackState {
    track: VecDeque<GpsPoint>,
    last_accepted: Option<GpsPoint>,
    last_ingest_ms: i64,
    last_fetch_ms: i64,
    accepted_since_fetch: u32,
    distance_since_fetch_m: f64,
    fetch_in_flight: bool,
    fetch_pending: bool,
    retry_scheduled: bool,
    next_retry_at_ms: i64,
    backoff_ms: i64,
}

impl TrackState {
    pub fn new(config: &HudConfig) -> Self {
        Self {
            track: VecDeque::new(),
            last_accepted: None,
            last_ingest_ms: 0,
            last_fetch_ms: 0,
            accepted_since_fetch: 0,
            distance_since_fetch_m: 0.0,
            fetch_in_flight: false,
            fetch_pending: false,
            retry_scheduled: false,
            next_retry_at_ms: 0,
            backoff_ms: config.map_retry_backoff_initial_ms,
        }
    }

    #[cfg(test)]
    pub fn track_len(&self) -> usize {
        self.track.len()
    }

    /// Run the ingestion pipeline for one point.
    pub fn ingest(&mut self, point: GpsPoint, config: &HudConfig) -> Ingest {
        if point.latitude.is_nan() || point.longitude.is_nan() {
            return Ingest::Filtered("nan".into());
        }
        if !(-90.0..=90.0).contains(&point.latitude)
            || !(-180.0..=180.0).contains(&point.longitude)
        {
            return Ingest::Filtered("latlon out of range".into());
        }
        if self.last_ingest_ms > 0 && point.timestamp_ms <= self.last_ingest_ms {
            return Ingest::Filtered("timestamp not monotonic".into());
        }
        if self.last_ingest_ms > 0
            && point.timestamp_ms - self.last_ingest_ms < config.gps_min_interval_ms
        {
            return Ingest::Filtered(format!("interval<{}ms", config.gps_min_interval_ms));
        }
        if let Some(accuracy) = point.accuracy_m {
            if accuracy > config.gps_accuracy_threshold_m {
                return Ingest::Filtered(format!(
                    "accuracy>{}",
                    config.gps_accuracy_threshold_m
                ));
            }
        }

        if let Some(last) = self.last_accepted {
            let distance = haversine_m(&last, &point);
            // the first two points bootstrap so the track becomes
            // non-degenerate
            let bootstrap = self.track.len() < 2;
            if !bootstrap
                && distance < config.gps_min_distance_m
                && !keeps_turn(&last, &point, distance, config)
            {
                return Ingest::Filtered(format!("distance<{}m", config.gps_min_distance_m));
            }
            self.distance_since_fetch_m += distance;
        }

        self.track.push_back(point);
        while self.track.len() > config.track_max_points {
            self.track.pop_front();
        }
        self.last_accepted = Some(point);
        self.last_ingest_ms = point.timestamp_ms;
        self.accepted_since_fetch += 1;
        Ingest::Accepted
    }

    /// Evaluate the map triggers after an accepted point.
    ///
    /// `running` gates fetch starts and retry arming the same way the SDK
    /// lifecycle does.
    pub fn maybe_trigger(&mut self, now_ms: i64, running: bool, config: &HudConfig) -> MapAction {
        if self.track.len() < 2 {
            return MapAction::None;
        }
        if now_ms < self.next_retry_at_ms {
            self.fetch_pending = true;
            return self.schedule_retry(now_ms, running);
        }
        let by_points = self.accepted_since_fetch >= config.map_trigger_point_count;
        let by_time = now_ms - self.last_fetch_ms >= config.map_trigger_interval_ms;
        let by_distance = self.distance_since_fetch_m >= config.map_trigger_distance_m;
        if !(by_points || by_time || by_distance) {
            return MapAction::None;
        }
        self.request_fetch(now_ms, running)
    }

    /// Record the end of a fetch and decide what happens next.
    pub fn complete_fetch(
        &mut self,
        ok: bool,
        now_ms: i64,
        running: bool,
        config: &HudConfig,
    ) -> MapAction {
        self.fetch_in_flight = false;
        if ok {
            self.accepted_since_fetch = 0;
            self.distance_since_fetch_m = 0.0;
            self.backoff_ms = config.map_retry_backoff_initial_ms;
            self.next_retry_at_ms = 0;
            if self.fetch_pending {
                return self.request_fetch(now_ms, running);
            }
            MapAction::None
        } else {
            self.next_retry_at_ms = now_ms + self.backoff_ms;
            self.backoff_ms = (self.backoff_ms * 2).min(config.map_retry_backoff_max_ms);
            self.fetch_pending = true;
            self.schedule_retry(now_ms, running)
        }
    }

    /// The one-shot retry timer fired.
    pub fn retry_fire(&mut self, now_ms: i64, running: bool) -> MapAction {
        self.retry_scheduled = false;
        if !self.fetch_pending || self.fetch_in_flight {
            return MapAction::None;
        }
        if now_ms < self.next_retry_at_ms {
            return self.schedule_retry(now_ms, running);
        }
        self.request_fetch(now_ms, running)
    }

    /// The retry timer was cancelled before firing (shutdown).
    pub fn retry_cancelled(&mut self) {
        self.retry_scheduled = false;
    }

    /// A fetch worker could not be spawned; keep the work pending.
    pub fn fetch_rejected(&mut self) {
        self.fetch_in_flight = false;
        self.fetch_pending = true;
    }

    fn request_fetch(&mut self, now_ms: i64, running: bool) -> MapAction {
        if !running {
            return MapAction::None;
        }
        if self.fetch_in_flight {
            self.fetch_pending = true;
            return MapAction::None;
        }
        self.fetch_in_flight = true;
        self.fetch_pending = false;
        self.last_fetch_ms = now_ms;
        MapAction::Fetch(self.track.iter().copied().collect())
    }

    fn schedule_retry(&mut self, now_ms: i64, running: bool) -> MapAction {
        if !running || self.retry_scheduled {
            return MapAction::None;
        }
        self.retry_scheduled = true;
        MapAction::Retry {
            delay_ms: (self.next_retry_at_ms - now_ms).max(1),
        }
    }
}

fn keeps_turn(last: &GpsPoint, current: &GpsPoint, distance_m: f64, config: &HudConfig) -> bool {
    if distance_m < 3.0 {
        return false;
    }
    match (last.bearing_deg, current.bearing_deg) {
        (Some(b1), Some(b2)) => bearing_delta_deg(b1, b2) >= config.gps_turn_angle_deg,
        _ => false,
    }
}
