use crate::geometry::{Approach, LaneRole};
use thiserror::Error;

/// An error raised by the simulation.
///
/// None of these halt a running simulation: a rejected spawn or a malformed arrival
/// drops that one unit of work.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("no room for a vehicle on {approach:?} {role:?}")]
    CapacityExceeded { approach: Approach, role: LaneRole },

    #[error("malformed arrival record: {0}")]
    MalformedArrival(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for the crate.
pub type SimResult<T> = Result<T, SimError>;
