use crate::geometry::{Approach, LaneRole};
use crate::VehicleId;

pub(crate) mod following;

/// A simulated vehicle.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// The vehicle's ID.
    pub(crate) id: VehicleId,
    /// The licence plate, as given by the arrival feed.
    plate: String,
    /// The approach the vehicle is on.
    approach: Approach,
    /// The lane the vehicle is in.
    role: LaneRole,
    /// The position along the lane's travel axis.
    pos: f64,
    /// The velocity along the lane's travel axis.
    vel: f64,
}

impl Vehicle {
    /// Creates a new vehicle.
    pub(crate) fn new(
        id: VehicleId,
        plate: String,
        approach: Approach,
        role: LaneRole,
        pos: f64,
        vel: f64,
    ) -> Self {
        Self {
            id,
            plate,
            approach,
            role,
            pos,
            vel,
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// The vehicle's licence plate.
    pub fn plate(&self) -> &str {
        &self.plate
    }

    /// The approach the vehicle is on.
    pub fn approach(&self) -> Approach {
        self.approach
    }

    /// The role of the lane the vehicle is in.
    pub fn role(&self) -> LaneRole {
        self.role
    }

    /// Whether the vehicle is in the given lane.
    pub fn in_lane(&self, approach: Approach, role: LaneRole) -> bool {
        self.approach == approach && self.role == role
    }

    /// The travel coordinate of the centre of the vehicle.
    pub fn pos(&self) -> f64 {
        self.pos
    }

    /// The vehicle's velocity.
    pub fn vel(&self) -> f64 {
        self.vel
    }

    /// Whether the vehicle is stopped.
    pub fn has_stopped(&self) -> bool {
        self.vel == 0.0
    }

    /// Moves the vehicle to an exact coordinate and stops it there.
    pub(crate) fn snap_to(&mut self, pos: f64) {
        self.pos = pos;
        self.vel = 0.0;
    }

    /// Stops the vehicle where it is.
    pub(crate) fn stop(&mut self) {
        self.vel = 0.0;
    }

    /// Integrates the position over `dt` at the given velocity, without moving
    /// past `limit`. A vehicle held in place by the limit is left stopped.
    pub(crate) fn integrate(&mut self, vel: f64, dt: f64, limit: f64) {
        let pos = f64::min(self.pos + vel * dt, f64::max(limit, self.pos));
        self.vel = if pos > self.pos { vel } else { 0.0 };
        self.pos = pos;
    }
}
