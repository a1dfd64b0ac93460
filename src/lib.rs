pub use arrival::{ArrivalRecord, ArrivalSource, ChannelSource, FileSource};
pub use cgmath;
pub use config::SimulationConfig;
pub use error::{SimError, SimResult};
pub use event::{EventKind, SimEvent};
pub use geometry::{Approach, LaneRole, Layout, Point2d, Vector2d};
pub use pool::VehiclePool;
pub use queue::{LaneQueue, LaneQueues};
pub use router::{Transition, TransitionRouter};
pub use saturation::SaturationMonitor;
pub use signal::{ControllerState, IntersectionController, PhaseChange};
pub use simulation::Simulation;
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use snapshot::{Snapshot, VehicleView};
pub use util::Interval;
pub use vehicle::following::CarFollowingModel;
pub use vehicle::Vehicle;

mod arrival;
mod config;
mod error;
mod event;
mod geometry;
mod pool;
mod queue;
mod router;
mod saturation;
mod signal;
mod simulation;
mod snapshot;
mod util;
mod vehicle;

new_key_type! {
    /// Unique ID of a [Vehicle].
    pub struct VehicleId;
}

type VehicleSet = SlotMap<VehicleId, Vehicle>;
