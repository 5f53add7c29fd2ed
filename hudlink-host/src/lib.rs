//! Host-side dispatch engine for the hudlink HUD pipeline.
//!
//! [`HudHostSdk`] accepts asynchronous vehicle-state writes and GPS samples,
//! coalesces them into periodic MSGF snapshot frames, filters GPS points
//! into a bounded track, rate-limits map-image renders with exponential
//! backoff, and serializes all outbound frames through a prioritized writer
//! thread. The byte transport and the map renderer are capability traits
//! ([`HudTransport`], [`MapImageProvider`]) supplied by the embedder.

pub mod config;
pub mod error;
pub mod gps;
pub mod listener;
pub mod provider;
pub mod sdk;
pub mod state;
pub mod stats;
pub mod transport;

mod queue;
mod track;

pub use config::{HudConfig, HudConfigBuilder};
pub use error::{BoxError, HostError};
pub use gps::GpsPoint;
pub use listener::{Channel, HudListener};
pub use provider::MapImageProvider;
pub use sdk::HudHostSdk;
pub use state::VehicleStateStore;
pub use stats::HudStats;
pub use transport::HudTransport;

pub use hudlink_proto::VehicleSnapshot;
