use crate::geometry::{Approach, LaneRole, Point2d};
use crate::signal::ControllerState;
#[cfg(feature = "serde")]
use serde::Serialize;

/// A read-only picture of the simulation for drawing.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Snapshot {
    /// The simulation time, in s.
    pub time: f64,
    pub vehicles: Vec<VehicleView>,
    pub controller: ControllerState,
    /// The lanes with active saturation alerts.
    pub alerts: Vec<(Approach, LaneRole)>,
}

/// A vehicle as seen by the renderer.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct VehicleView {
    pub plate: String,
    pub approach: Approach,
    pub role: LaneRole,
    /// The travel coordinate along the lane.
    pub pos: f64,
    /// The centre of the vehicle in screen space.
    pub position: Point2d,
}
