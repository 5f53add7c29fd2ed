#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A single GPS fix as delivered by the positioning source.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GpsPoint {
    /// Latitude in degrees, [-90, 90].
    pub latitude: f64,
    /// Longitude in degrees, [-180, 180].
    pub longitude: f64,
    /// Sample timestamp in epoch milliseconds.
    pub timestamp_ms: i64,
    /// Horizontal accuracy in meters, when the fix reports one.
    pub accuracy_m: Option<f32>,
    /// Ground speed in m/s, when the fix reports one.
    pub speed_mps: Option<f32>,
    /// Course over ground in degrees, when the fix reports one.
    pub bearing_deg: Option<f32>,
}

impl GpsPoint {
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp_ms,
            accuracy_m: None,
            speed_mps: None,
            bearing_deg: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy_m: f32) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    pub fn with_speed(mut self, speed_mps: f32) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }

    pub fn with_bearing(mut self, bearing_deg: f32) -> Self {
        self.bearing_deg = Some(bearing_deg);
        self
    }
}

/// Great-circle distance between two points in meters.
pub fn haversine_m(a: &GpsPoint, b: &GpsPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Circular difference between two bearings, in [0, 180].
pub fn bearing_delta_deg(b1: f32, b2: f32) -> f64 {
    let diff = (f64::from(b1) - f64::from(b2)).abs();
    diff.min(360.0 - diff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_known_distance() {
        // One degree of latitude is ~111.2 km
        let a = GpsPoint::new(50.0, 8.0, 0);
        let b = GpsPoint::new(51.0, 8.0, 1);
        let d = haversine_m(&a, &b);
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn haversine_zero_for_same_point() {
        let a = GpsPoint::new(48.1, 11.5, 0);
        assert!(haversine_m(&a, &a) < 1e-9);
    }

    #[test]
    fn bearing_delta_wraps() {
        assert!((bearing_delta_deg(350.0, 10.0) - 20.0).abs() < 1e-9);
        assert!((bearing_delta_deg(10.0, 350.0) - 20.0).abs() < 1e-9);
        assert!((bearing_delta_deg(90.0, 270.0) - 180.0).abs() < 1e-9);
        assert!(bearing_delta_deg(42.0, 42.0) < 1e-9);
    }
}
