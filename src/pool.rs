use crate::error::{SimError, SimResult};
use crate::geometry::{Approach, LaneRole, Layout};
use crate::vehicle::Vehicle;
use crate::{VehicleId, VehicleSet};

/// A fixed-capacity store of the vehicles in the simulation.
///
/// Vehicles are identified by generation-tagged slot keys, so the ID of a
/// despawned vehicle never refers to a vehicle spawned later into the same slot.
#[derive(Clone, Debug)]
pub struct VehiclePool {
    /// The active vehicles.
    vehicles: VehicleSet,
    /// The maximum number of active vehicles.
    capacity: usize,
    /// The maximum number of active vehicles in any one lane.
    lane_capacity: usize,
    /// The centre-to-centre distance kept between vehicles in a lane.
    spacing: f64,
    /// The velocity given to newly spawned vehicles.
    cruise_speed: f64,
}

impl VehiclePool {
    /// Creates an empty pool.
    pub fn new(capacity: usize, lane_capacity: usize, spacing: f64, cruise_speed: f64) -> Self {
        Self {
            vehicles: VehicleSet::with_capacity_and_key(capacity),
            capacity,
            lane_capacity,
            spacing,
            cruise_speed,
        }
    }

    /// The maximum number of active vehicles.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of active vehicles.
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    /// Whether there are no active vehicles.
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Whether a vehicle could be spawned into the given lane right now.
    pub fn has_room(&self, approach: Approach, role: LaneRole) -> bool {
        self.len() < self.capacity && self.count_in_lane(approach, role) < self.lane_capacity
    }

    /// Spawns a vehicle at the entry of the given lane, travelling at cruise speed.
    ///
    /// If the entry is still occupied, the vehicle is placed one spacing behind the
    /// rearmost vehicle in the lane instead. Fails if the pool or the lane is full,
    /// in which case the pool is unchanged.
    pub fn spawn(
        &mut self,
        layout: &Layout,
        approach: Approach,
        role: LaneRole,
        plate: impl Into<String>,
    ) -> SimResult<VehicleId> {
        if !self.has_room(approach, role) {
            return Err(SimError::CapacityExceeded { approach, role });
        }
        let pos = self
            .lane(approach, role)
            .map(|vehicle| vehicle.pos() - self.spacing)
            .fold(layout.entry(approach, role), f64::min);
        let plate = plate.into();
        let vel = self.cruise_speed;
        Ok(self
            .vehicles
            .insert_with_key(|id| Vehicle::new(id, plate, approach, role, pos, vel)))
    }

    /// Removes a vehicle, freeing its capacity. Returns the removed vehicle, if it was active.
    pub fn despawn(&mut self, id: VehicleId) -> Option<Vehicle> {
        self.vehicles.remove(id)
    }

    /// Counts the active vehicles in a lane.
    pub fn count_in_lane(&self, approach: Approach, role: LaneRole) -> usize {
        self.lane(approach, role).count()
    }

    /// Returns an iterator over the active vehicles in a lane, in no particular order.
    pub fn lane(&self, approach: Approach, role: LaneRole) -> impl Iterator<Item = &Vehicle> {
        self.vehicles
            .values()
            .filter(move |vehicle| vehicle.in_lane(approach, role))
    }

    /// Returns an iterator over all the active vehicles.
    pub fn iter(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    /// Gets a reference to the vehicle with the given ID, if it is active.
    pub fn get(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    /// Gets a mutable reference to the vehicle with the given ID, if it is active.
    pub(crate) fn get_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(id)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::SimulationConfig;
    use assert_approx_eq::assert_approx_eq;

    fn pool(capacity: usize, lane_capacity: usize) -> (VehiclePool, Layout) {
        let config = SimulationConfig::default();
        (
            VehiclePool::new(capacity, lane_capacity, config.spacing(), config.cruise_speed),
            Layout::new(&config),
        )
    }

    #[test]
    fn spawns_at_lane_entry() {
        let (mut pool, layout) = pool(4, 4);
        let id = pool
            .spawn(&layout, Approach::East, LaneRole::Controlled, "AB1CD234")
            .unwrap();
        let vehicle = pool.get(id).unwrap();
        assert_eq!(vehicle.plate(), "AB1CD234");
        assert_approx_eq!(vehicle.pos(), layout.entry(Approach::East, LaneRole::Controlled));
        assert_approx_eq!(vehicle.vel(), 80.0);
    }

    #[test]
    fn queues_behind_occupied_entry() {
        let (mut pool, layout) = pool(4, 4);
        let a = pool.spawn(&layout, Approach::North, LaneRole::FreeTurn, "A").unwrap();
        let b = pool.spawn(&layout, Approach::North, LaneRole::FreeTurn, "B").unwrap();
        let gap = pool.get(a).unwrap().pos() - pool.get(b).unwrap().pos();
        assert_approx_eq!(gap, 60.0);
    }

    #[test]
    fn full_pool_rejects_spawn() {
        let (mut pool, layout) = pool(2, 4);
        pool.spawn(&layout, Approach::North, LaneRole::Controlled, "A").unwrap();
        pool.spawn(&layout, Approach::South, LaneRole::Controlled, "B").unwrap();
        let result = pool.spawn(&layout, Approach::East, LaneRole::Controlled, "C");
        assert!(matches!(result, Err(SimError::CapacityExceeded { .. })));
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.count_in_lane(Approach::East, LaneRole::Controlled), 0);
    }

    #[test]
    fn full_lane_rejects_spawn() {
        let (mut pool, layout) = pool(8, 1);
        pool.spawn(&layout, Approach::West, LaneRole::Controlled, "A").unwrap();
        assert!(pool
            .spawn(&layout, Approach::West, LaneRole::Controlled, "B")
            .is_err());
        assert!(pool
            .spawn(&layout, Approach::West, LaneRole::FreeTurn, "B")
            .is_ok());
    }

    #[test]
    fn despawn_frees_capacity() {
        let (mut pool, layout) = pool(1, 1);
        let a = pool.spawn(&layout, Approach::North, LaneRole::Controlled, "A").unwrap();
        assert!(pool.despawn(a).is_some());
        let b = pool.spawn(&layout, Approach::North, LaneRole::Controlled, "B").unwrap();
        assert_ne!(a, b);
        assert!(pool.get(a).is_none());
        assert!(pool.despawn(a).is_none());
    }
}
