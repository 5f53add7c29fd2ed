use std::sync::Mutex;

use hudlink_proto::VehicleSnapshot;

/// Serializes concurrent vehicle field updates into one canonical snapshot
/// with a dirty bit.
///
/// Writing a field with its current value does not mark the store dirty;
/// [`VehicleStateStore::snapshot`] reads and clears the bit atomically.
#[derive(Debug)]
pub struct VehicleStateStore {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    snapshot: VehicleSnapshot,
    dirty: bool,
}

impl Default for VehicleStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VehicleStateStore {
    pub fn new() -> Self {
        // battery starts at 12 V nominal, everything else at zero;
        // dirty so the first tick always emits
        Self {
            inner: Mutex::new(Inner {
                snapshot: VehicleSnapshot {
                    battery_mv: 12_000,
                    ..VehicleSnapshot::default()
                },
                dirty: true,
            }),
        }
    }

    /// Copy the current snapshot, returning it together with the dirty bit,
    /// and clear the bit.
    pub fn snapshot(&self) -> (VehicleSnapshot, bool) {
        let mut inner = self.inner.lock().unwrap();
        let dirty = inner.dirty;
        inner.dirty = false;
        (inner.snapshot, dirty)
    }

    /// Overwrite every field and mark the store dirty.
    pub fn update(&self, snapshot: VehicleSnapshot) {
        let mut inner = self.inner.lock().unwrap();
        inner.snapshot = snapshot;
        inner.dirty = true;
    }

    fn set_field<F>(&self, value: i32, field: F)
    where
        F: FnOnce(&mut VehicleSnapshot) -> &mut i32,
    {
        let inner = &mut *self.inner.lock().unwrap();
        let slot = field(&mut inner.snapshot);
        if *slot != value {
            *slot = value;
            inner.dirty = true;
        }
    }

    pub fn set_speed_kmh(&self, value: i32) {
        self.set_field(value, |s| &mut s.speed_kmh);
    }

    pub fn set_engine_rpm(&self, value: i32) {
        self.set_field(value, |s| &mut s.engine_rpm);
    }

    pub fn set_odo_m(&self, value: i32) {
        self.set_field(value, |s| &mut s.odo_m);
    }

    pub fn set_trip_odo_m(&self, value: i32) {
        self.set_field(value, |s| &mut s.trip_odo_m);
    }

    pub fn set_outside_temp_deci_c(&self, value: i32) {
        self.set_field(value, |s| &mut s.outside_temp_deci_c);
    }

    pub fn set_inside_temp_deci_c(&self, value: i32) {
        self.set_field(value, |s| &mut s.inside_temp_deci_c);
    }

    pub fn set_battery_mv(&self, value: i32) {
        self.set_field(value, |s| &mut s.battery_mv);
    }

    pub fn set_current_time_minutes(&self, value: i32) {
        self.set_field(value, |s| &mut s.current_time_minutes);
    }

    pub fn set_trip_time_minutes(&self, value: i32) {
        self.set_field(value, |s| &mut s.trip_time_minutes);
    }

    pub fn set_fuel_left_deci_l(&self, value: i32) {
        self.set_field(value, |s| &mut s.fuel_left_deci_l);
    }

    pub fn set_fuel_total_deci_l(&self, value: i32) {
        self.set_field(value, |s| &mut s.fuel_total_deci_l);
    }
}
