use crate::config::SimulationConfig;
use crate::geometry::{Approach, LaneRole, Layout};
use crate::pool::VehiclePool;
use crate::queue::LaneQueues;
use crate::vehicle::Vehicle;
use crate::VehicleId;
use itertools::Itertools;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Moves vehicles that have reached the intersection onto their departure lanes.
///
/// A vehicle crossing the intersection is not simulated inside it. The step it reaches
/// the intersection box it is removed and a new vehicle with the same plate appears
/// at the start of the incoming lane of the approach it leaves by, or one spacing
/// behind the last vehicle on that lane if the start is still occupied.
#[derive(Clone, Debug)]
pub struct TransitionRouter {
    /// Chooses between going straight and turning right.
    rng: SmallRng,
}

/// A vehicle that crossed the intersection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// The vehicle that reached the intersection, which no longer exists.
    pub from: VehicleId,
    /// The vehicle that replaced it on the departure lane.
    pub to: VehicleId,
    /// The approach the vehicle arrived on.
    pub origin: Approach,
    /// The approach the vehicle left by.
    pub departure: Approach,
}

impl TransitionRouter {
    /// Creates a router whose choices are determined by the configured seed.
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(config.seed),
        }
    }

    /// Chooses the approach a vehicle in the given arrival lane leaves by.
    ///
    /// Free turn vehicles always turn left. Controlled vehicles go straight or
    /// turn right with equal probability.
    pub fn route(&mut self, approach: Approach, role: LaneRole) -> Approach {
        match role {
            LaneRole::FreeTurn => approach.left_turn(),
            _ if self.rng.gen_bool(0.5) => approach.opposite(),
            _ => approach.right_turn(),
        }
    }

    /// Transitions every vehicle that has reached the intersection, front-most first.
    pub fn step(
        &mut self,
        pool: &mut VehiclePool,
        queues: &mut LaneQueues,
        layout: &Layout,
    ) -> Vec<Transition> {
        let arrived = pool
            .iter()
            .filter(|v| v.role().is_arrival() && layout.reached_footprint(v.pos()))
            .map(|v| (v.id(), v.pos()))
            .sorted_by(|a, b| b.1.total_cmp(&a.1))
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        arrived
            .into_iter()
            .filter_map(|id| self.maybe_transition(id, pool, queues, layout))
            .collect()
    }

    /// Transitions a vehicle if it is in an arrival lane and has reached the intersection.
    ///
    /// Whether the signal is green plays no part: a vehicle that reaches the
    /// intersection box always leaves its arrival lane in the same step.
    pub fn maybe_transition(
        &mut self,
        id: VehicleId,
        pool: &mut VehiclePool,
        queues: &mut LaneQueues,
        layout: &Layout,
    ) -> Option<Transition> {
        let vehicle = pool.get(id)?;
        if !vehicle.role().is_arrival() || !layout.reached_footprint(vehicle.pos()) {
            return None;
        }
        let (origin, role) = (vehicle.approach(), vehicle.role());
        let departure = self.route(origin, role);

        let vehicle = pool.despawn(id)?;
        if role == LaneRole::Controlled {
            Self::unqueue(queues, origin, id);
        }
        let to = match pool.spawn(layout, departure, LaneRole::Incoming, vehicle.plate()) {
            Ok(to) => to,
            Err(e) => {
                log::warn!("{} lost crossing to {:?}: {}", vehicle.plate(), departure, e);
                return None;
            }
        };
        log::trace!(
            "{} crossed from {:?} to {:?}",
            vehicle.plate(),
            origin,
            departure
        );
        Some(Transition {
            from: id,
            to,
            origin,
            departure,
        })
    }

    /// Removes vehicles that have driven out of view on the incoming lanes.
    pub fn despawn_exited(&self, pool: &mut VehiclePool, layout: &Layout) -> Vec<Vehicle> {
        let exited = pool
            .iter()
            .filter(|v| v.role() == LaneRole::Incoming && v.pos() > layout.exit(v.approach()))
            .map(|v| v.id())
            .collect::<Vec<_>>();
        exited
            .into_iter()
            .filter_map(|id| pool.despawn(id))
            .collect()
    }

    /// Removes a crossing vehicle from its queue, where it should be at the front.
    fn unqueue(queues: &mut LaneQueues, approach: Approach, id: VehicleId) {
        let queue = &mut queues[approach];
        debug_assert_eq!(
            queue.peek_front(),
            Some(id),
            "{:?} crossed out of turn on {:?}",
            id,
            approach
        );
        if queue.peek_front() == Some(id) {
            queue.dequeue();
        } else {
            queue.remove(id);
        }
    }
}
