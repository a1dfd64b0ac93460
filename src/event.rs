use crate::geometry::{Approach, LaneRole};
#[cfg(feature = "serde")]
use serde::Serialize;

/// Something noteworthy that happened during the simulation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SimEvent {
    /// The simulation time at which it happened, in s.
    pub time: f64,
    pub kind: EventKind,
}

/// The kinds of [SimEvent].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum EventKind {
    /// Right-of-way passed from one approach to another.
    ApproachChanged { from: Approach, to: Approach },
    /// The priority override took hold of the signal for an approach.
    OverrideActivated { approach: Approach },
    /// The priority override released the signal.
    OverrideReleased { approach: Approach },
    /// A lane was found saturated.
    SaturationAlert { approach: Approach, role: LaneRole },
}
