use crate::error::HostError;

/// Runtime tuning for [`crate::HudHostSdk`].
///
/// Built through [`HudConfig::builder`]; unset fields keep the defaults
/// listed per field. Validation happens once at `build()` so the SDK never
/// has to re-check invariants at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct HudConfig {
    /// MSGF emission rate while data is changing (Hz). Default 24.
    pub msg_rate_hz: u32,
    /// Keep-alive emission rate while data is idle (Hz). Default 2.
    pub msg_idle_rate_hz: u32,
    /// Emit an extra tick synchronously with a setter. Default true.
    pub burst_on_vehicle_data_change: bool,

    /// Minimum distance between kept GPS points (m). Default 5.
    pub gps_min_distance_m: f64,
    /// Minimum interval between GPS samples (ms). Default 250.
    pub gps_min_interval_ms: i64,
    /// Bearing change that preserves an otherwise-close point (deg). Default 20.
    pub gps_turn_angle_deg: f64,
    /// Points with a reported accuracy above this are dropped (m). Default 30.
    pub gps_accuracy_threshold_m: f32,

    /// Map render trigger: accepted points since the last render. Default 5.
    pub map_trigger_point_count: u32,
    /// Map render trigger: elapsed time since the last render (ms). Default 2000.
    pub map_trigger_interval_ms: i64,
    /// Map render trigger: accumulated distance since the last render (m). Default 30.
    pub map_trigger_distance_m: f64,
    /// Track buffer bound, oldest-out. Default 200.
    pub track_max_points: usize,
    /// Largest PNG accepted for an IMGF frame (bytes). Default 128 KiB.
    pub img_max_bytes: usize,

    /// Write the IEEE CRC-32 of each payload into the header. Default false.
    pub enable_crc32: bool,
    /// Queued IMGF frames beyond this are evicted oldest-first. Default 2.
    pub img_queue_capacity: usize,

    /// First retry delay after a failed map render (ms). Default 1000.
    pub map_retry_backoff_initial_ms: i64,
    /// Retry delay ceiling (ms). Default 15000.
    pub map_retry_backoff_max_ms: i64,
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            msg_rate_hz: 24,
            msg_idle_rate_hz: 2,
            burst_on_vehicle_data_change: true,
            gps_min_distance_m: 5.0,
            gps_min_interval_ms: 250,
            gps_turn_angle_deg: 20.0,
            gps_accuracy_threshold_m: 30.0,
            map_trigger_point_count: 5,
            map_trigger_interval_ms: 2000,
            map_trigger_distance_m: 30.0,
            track_max_points: 200,
            img_max_bytes: 128 * 1024,
            enable_crc32: false,
            img_queue_capacity: 2,
            map_retry_backoff_initial_ms: 1000,
            map_retry_backoff_max_ms: 15_000,
        }
    }
}

impl HudConfig {
    pub fn builder() -> HudConfigBuilder {
        HudConfigBuilder::default()
    }
}

/// Builder for [`HudConfig`].
#[derive(Debug, Clone, Default)]
pub struct HudConfigBuilder {
    config: HudConfig,
}

impl HudConfigBuilder {
    pub fn msg_rate_hz(mut self, value: u32) -> Self {
        self.config.msg_rate_hz = value;
        self
    }

    pub fn msg_idle_rate_hz(mut self, value: u32) -> Self {
        self.config.msg_idle_rate_hz = value;
        self
    }

    pub fn burst_on_vehicle_data_change(mut self, value: bool) -> Self {
        self.config.burst_on_vehicle_data_change = value;
        self
    }

    pub fn gps_min_distance_m(mut self, value: f64) -> Self {
        self.config.gps_min_distance_m = value;
        self
    }

    pub fn gps_min_interval_ms(mut self, value: i64) -> Self {
        self.config.gps_min_interval_ms = value;
        self
    }

    pub fn gps_turn_angle_deg(mut self, value: f64) -> Self {
        self.config.gps_turn_angle_deg = value;
        self
    }

    pub fn gps_accuracy_threshold_m(mut self, value: f32) -> Self {
        self.config.gps_accuracy_threshold_m = value;
        self
    }

    pub fn map_trigger_point_count(mut self, value: u32) -> Self {
        self.config.map_trigger_point_count = value;
        self
    }

    pub fn map_trigger_interval_ms(mut self, value: i64) -> Self {
        self.config.map_trigger_interval_ms = value;
        self
    }

    pub fn map_trigger_distance_m(mut self, value: f64) -> Self {
        self.config.map_trigger_distance_m = value;
        self
    }

    pub fn track_max_points(mut self, value: usize) -> Self {
        self.config.track_max_points = value;
        self
    }

    pub fn img_max_bytes(mut self, value: usize) -> Self {
        self.config.img_max_bytes = value;
        self
    }

    pub fn enable_crc32(mut self, value: bool) -> Self {
        self.config.enable_crc32 = value;
        self
    }

    pub fn img_queue_capacity(mut self, value: usize) -> Self {
        self.config.img_queue_capacity = value;
        self
    }

    pub fn map_retry_backoff_initial_ms(mut self, value: i64) -> Self {
        self.config.map_retry_backoff_initial_ms = value;
        self
    }

    pub fn map_retry_backoff_max_ms(mut self, value: i64) -> Self {
        self.config.map_retry_backoff_max_ms = value;
        self
    }

    /// Validate and return the finished config.
    pub fn build(self) -> Result<HudConfig, HostError> {
        let c = self.config;
        if c.msg_rate_hz == 0 {
            return Err(HostError::InvalidConfig("msg_rate_hz must be > 0".into()));
        }
        if c.msg_idle_rate_hz == 0 {
            return Err(HostError::InvalidConfig("msg_idle_rate_hz must be > 0".into()));
        }
        if c.gps_min_distance_m < 0.0 || !c.gps_min_distance_m.is_finite() {
            return Err(HostError::InvalidConfig(
                "gps_min_distance_m must be >= 0".into(),
            ));
        }
        if c.gps_min_interval_ms < 0 {
            return Err(HostError::InvalidConfig(
                "gps_min_interval_ms must be >= 0".into(),
            ));
        }
        if c.map_trigger_point_count == 0 {
            return Err(HostError::InvalidConfig(
                "map_trigger_point_count must be > 0".into(),
            ));
        }
        if c.map_trigger_interval_ms <= 0 {
            return Err(HostError::InvalidConfig(
                "map_trigger_interval_ms must be > 0".into(),
            ));
        }
        if c.track_max_points < 2 {
            return Err(HostError::InvalidConfig(
                "track_max_points must be >= 2".into(),
            ));
        }
        if c.img_max_bytes == 0 {
            return Err(HostError::InvalidConfig("img_max_bytes must be > 0".into()));
        }
        if c.img_queue_capacity == 0 {
            return Err(HostError::InvalidConfig(
                "img_queue_capacity must be > 0".into(),
            ));
        }
        if c.map_retry_backoff_initial_ms <= 0 || c.map_retry_backoff_max_ms <= 0 {
            return Err(HostError::InvalidConfig(
                "map retry backoff must be > 0".into(),
            ));
        }
        if c.map_retry_backoff_initial_ms > c.map_retry_backoff_max_ms {
            return Err(HostError::InvalidConfig(
                "initial backoff cannot exceed max backoff".into(),
            ));
        }
        Ok(c)
    }
}
