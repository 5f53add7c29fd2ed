//! Common test utilities and shared imports

// Allow unused imports since this module is shared across multiple test
// files and not every helper is used in every file.
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use hudlink_proto::constants::*;
#[allow(unused_imports)]
pub use hudlink_proto::{
    encode_frame, encode_img_png, encode_msg_command, encode_msg_snapshot, Frame, FrameHeader,
    MsgCommand, MsgFrame, ProtoError, VehicleSnapshot,
};

/// Decode a hex string into bytes for fixtures.
#[allow(dead_code)]
pub fn hex_to_bytes(hex_data: &str) -> Bytes {
    Bytes::from(hex::decode(hex_data).expect("Failed to decode hex"))
}

/// The snapshot used by the literal encoding fixtures.
#[allow(dead_code)]
pub fn sample_snapshot() -> VehicleSnapshot {
    VehicleSnapshot {
        speed_kmh: 80,
        engine_rpm: 1800,
        odo_m: 123_456,
        trip_odo_m: 789,
        outside_temp_deci_c: -5,
        inside_temp_deci_c: 220,
        battery_mv: 12_800,
        current_time_minutes: 754,
        trip_time_minutes: 42,
        fuel_left_deci_l: 35,
        fuel_total_deci_l: 450,
    }
}
