use crate::error::BoxError;
use crate::gps::GpsPoint;

/// Renders an ordered GPS track into a PNG image.
///
/// The SDK calls this on a worker thread with an immutable snapshot of the
/// track: ascending timestamps, at least two points. An empty result counts
/// as a failure and drives the retry backoff. The usual implementation
/// POSTs `{"points":[[lon,lat], ...]}` to a rendering service and returns
/// the PNG response body.
pub trait MapImageProvider: Send + Sync {
    fn fetch_track_image(&self, points: &[GpsPoint]) -> Result<Vec<u8>, BoxError>;
}
