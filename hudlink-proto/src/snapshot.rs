use zerocopy::byteorder::little_endian::{I16, I32, U16};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::{CURRENT_TIME_MINUTES_MAX, SNAPSHOT_BODY_SIZE};
use crate::error::ProtoError;

/// Latest vehicle field values in host units.
///
/// Fields are plain `i32` on the host side; the wire codec saturates each
/// one into its declared wire width when encoding (see [`SnapshotBodyRaw`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleSnapshot {
    /// Road speed in km/h.
    pub speed_kmh: i32,
    /// Engine speed in rpm.
    pub engine_rpm: i32,
    /// Odometer in meters.
    pub odo_m: i32,
    /// Trip odometer in meters.
    pub trip_odo_m: i32,
    /// Outside temperature in 0.1 °C.
    pub outside_temp_deci_c: i32,
    /// Inside temperature in 0.1 °C.
    pub inside_temp_deci_c: i32,
    /// Battery voltage in mV.
    pub battery_mv: i32,
    /// Wall clock, minutes since midnight (0..=1439).
    pub current_time_minutes: i32,
    /// Trip time in minutes.
    pub trip_time_minutes: i32,
    /// Fuel left in 0.1 L.
    pub fuel_left_deci_l: i32,
    /// Tank capacity in 0.1 L.
    pub fuel_total_deci_l: i32,
}

impl VehicleSnapshot {
    /// Decode a snapshot body (the payload bytes after the command byte).
    pub fn from_wire(body: &[u8]) -> Result<Self, ProtoError> {
        let raw = SnapshotBodyRaw::ref_from_bytes(body.get(..SNAPSHOT_BODY_SIZE).ok_or(
            ProtoError::ShortSnapshot {
                expected: SNAPSHOT_BODY_SIZE,
                actual: body.len(),
            },
        )?)
        .map_err(|_| ProtoError::ShortSnapshot {
            expected: SNAPSHOT_BODY_SIZE,
            actual: body.len(),
        })?;
        Ok((*raw).into())
    }
}

/// Wire layout of the snapshot body (26 bytes, little-endian).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct SnapshotBodyRaw {
    pub speed_kmh: I16,
    pub engine_rpm: I16,
    pub odo_m: I32,
    pub trip_odo_m: I32,
    pub outside_temp_deci_c: I16,
    pub inside_temp_deci_c: I16,
    pub battery_mv: I16,
    pub current_time_minutes: U16,
    pub trip_time_minutes: U16,
    pub fuel_left_deci_l: U16,
    pub fuel_total_deci_l: U16,
}

fn clamp_i16(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn clamp_u16(value: i32, max: u16) -> u16 {
    value.clamp(0, max as i32) as u16
}

impl From<&VehicleSnapshot> for SnapshotBodyRaw {
    fn from(s: &VehicleSnapshot) -> Self {
        Self {
            speed_kmh: I16::new(clamp_i16(s.speed_kmh)),
            engine_rpm: I16::new(clamp_i16(s.engine_rpm)),
            odo_m: I32::new(s.odo_m),
            trip_odo_m: I32::new(s.trip_odo_m),
            outside_temp_deci_c: I16::new(clamp_i16(s.outside_temp_deci_c)),
            inside_temp_deci_c: I16::new(clamp_i16(s.inside_temp_deci_c)),
            battery_mv: I16::new(clamp_i16(s.battery_mv)),
            current_time_minutes: U16::new(clamp_u16(s.current_time_minutes, CURRENT_TIME_MINUTES_MAX)),
            trip_time_minutes: U16::new(clamp_u16(s.trip_time_minutes, u16::MAX)),
            fuel_left_deci_l: U16::new(clamp_u16(s.fuel_left_deci_l, u16::MAX)),
            fuel_total_deci_l: U16::new(clamp_u16(s.fuel_total_deci_l, u16::MAX)),
        }
    }
}

impl From<SnapshotBodyRaw> for VehicleSnapshot {
    fn from(raw: SnapshotBodyRaw) -> Self {
        Self {
            speed_kmh: raw.speed_kmh.get() as i32,
            engine_rpm: raw.engine_rpm.get() as i32,
            odo_m: raw.odo_m.get(),
            trip_odo_m: raw.trip_odo_m.get(),
            outside_temp_deci_c: raw.outside_temp_deci_c.get() as i32,
            inside_temp_deci_c: raw.inside_temp_deci_c.get() as i32,
            battery_mv: raw.battery_mv.get() as i32,
            current_time_minutes: raw.current_time_minutes.get() as i32,
            trip_time_minutes: raw.trip_time_minutes.get() as i32,
            fuel_left_deci_l: raw.fuel_left_deci_l.get() as i32,
            fuel_total_deci_l: raw.fuel_total_deci_l.get() as i32,
        }
    }
}
