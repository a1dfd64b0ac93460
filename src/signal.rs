use crate::config::SimulationConfig;
use crate::geometry::Approach;
use crate::queue::LaneQueues;
#[cfg(feature = "serde")]
use serde::Serialize;
use smallvec::SmallVec;

/// The right-of-way scheduler of the intersection.
///
/// Exactly one approach has a green signal at any time. Normally the green rotates
/// through the approaches in a fixed order, with each phase lasting longer the more
/// vehicles are queued across the whole intersection. When the controlled lane of the
/// designated approach fills up, the override holds that approach green until its
/// queue drains below a lower threshold.
#[derive(Clone, Debug)]
pub struct IntersectionController {
    /// The approach with right-of-way.
    active: Approach,
    /// The time since the current phase started, in s.
    phase_elapsed: f64,
    /// The length of the current phase, in s.
    phase_duration: f64,
    /// Whether the priority override is holding the signal.
    override_active: bool,
    /// The approach the override watches and grants right-of-way to.
    override_approach: Approach,
    /// The queue depth at which the override activates.
    override_on: usize,
    /// The queue depth at or below which the override is released.
    override_off: usize,
    /// The green time per queued vehicle, in s.
    time_per_vehicle: f64,
}

/// A read-only view of the controller.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ControllerState {
    pub active_approach: Approach,
    pub phase_elapsed: f64,
    pub phase_duration: f64,
    pub override_active: bool,
}

/// A change of signal state made by [IntersectionController::advance].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseChange {
    /// The base rotation moved the green from one approach to the next.
    Rotated { from: Approach, to: Approach },
    /// The override took the green from `from` and gave it to `to`.
    OverrideActivated { from: Approach, to: Approach },
    /// The override released the signal back to the base rotation.
    OverrideReleased,
}

impl IntersectionController {
    /// Creates a controller with the green on the south approach.
    pub fn new(config: &SimulationConfig, queues: &LaneQueues) -> Self {
        let mut controller = Self {
            active: Approach::South,
            phase_elapsed: 0.0,
            phase_duration: 0.0,
            override_active: false,
            override_approach: config.override_approach,
            override_on: config.override_on,
            override_off: config.override_off,
            time_per_vehicle: config.time_per_vehicle,
        };
        controller.phase_duration = controller.green_duration(queues);
        controller
    }

    /// The approach with right-of-way.
    pub fn active_approach(&self) -> Approach {
        self.active
    }

    /// Whether the given approach has right-of-way.
    pub fn is_green(&self, approach: Approach) -> bool {
        self.active == approach
    }

    /// Whether the priority override is holding the signal.
    pub fn override_active(&self) -> bool {
        self.override_active
    }

    /// Gets a read-only view of the controller.
    pub fn state(&self) -> ControllerState {
        ControllerState {
            active_approach: self.active,
            phase_elapsed: self.phase_elapsed,
            phase_duration: self.phase_duration,
            override_active: self.override_active,
        }
    }

    /// Advances the signal timing by `dt` seconds and returns what changed.
    pub fn advance(&mut self, dt: f64, queues: &LaneQueues) -> SmallVec<[PhaseChange; 2]> {
        let mut changes = SmallVec::new();
        let occupancy = queues.depth(self.override_approach);

        if !self.override_active && occupancy >= self.override_on {
            self.override_active = true;
            changes.push(PhaseChange::OverrideActivated {
                from: self.active,
                to: self.override_approach,
            });
        } else if self.override_active && occupancy <= self.override_off {
            self.override_active = false;
            self.phase_elapsed = 0.0;
            self.phase_duration = self.green_duration(queues);
            changes.push(PhaseChange::OverrideReleased);
        }

        if self.override_active {
            self.active = self.override_approach;
            self.phase_elapsed = 0.0;
            return changes;
        }

        self.phase_elapsed += dt;
        if self.phase_elapsed >= self.phase_duration {
            let from = self.active;
            self.active = from.next();
            self.phase_elapsed = 0.0;
            self.phase_duration = self.green_duration(queues);
            changes.push(PhaseChange::Rotated {
                from,
                to: self.active,
            });
        }
        changes
    }

    /// The green time budgeted from the mean controlled queue depth,
    /// never less than the time for one vehicle.
    fn green_duration(&self, queues: &LaneQueues) -> f64 {
        f64::max(
            self.time_per_vehicle,
            queues.mean_depth() * self.time_per_vehicle,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::VehicleId;
    use assert_approx_eq::assert_approx_eq;
    use slotmap::KeyData;

    fn fill(queues: &mut LaneQueues, approach: Approach, depth: usize) {
        while queues.depth(approach) > depth {
            queues[approach].dequeue();
        }
        while queues.depth(approach) < depth {
            let n = 1000 * approach.index() as u64 + queues.depth(approach) as u64;
            queues[approach].enqueue(VehicleId::from(KeyData::from_ffi(n | (1 << 32))));
        }
    }

    fn controller(queues: &LaneQueues) -> IntersectionController {
        IntersectionController::new(&SimulationConfig::default(), queues)
    }

    #[test]
    fn empty_intersection_rotates_at_floor_duration() {
        let queues = LaneQueues::default();
        let mut controller = controller(&queues);
        assert_approx_eq!(controller.state().phase_duration, 0.8);
        assert_eq!(controller.active_approach(), Approach::South);

        let mut order = vec![];
        for _ in 0..4 {
            for _ in 0..4 {
                controller.advance(0.25, &queues);
            }
            order.push(controller.active_approach());
        }
        assert_eq!(
            order,
            vec![Approach::East, Approach::West, Approach::North, Approach::South]
        );
    }

    #[test]
    fn duration_follows_mean_depth() {
        let mut queues = LaneQueues::default();
        fill(&mut queues, Approach::South, 4);
        fill(&mut queues, Approach::East, 8);
        fill(&mut queues, Approach::West, 8);
        let mut controller = controller(&queues);
        assert_approx_eq!(controller.state().phase_duration, 4.0);

        let changes = controller.advance(4.0, &queues);
        assert_eq!(
            changes.as_slice(),
            &[PhaseChange::Rotated {
                from: Approach::South,
                to: Approach::East
            }]
        );
        assert_approx_eq!(controller.state().phase_elapsed, 0.0);
    }

    #[test]
    fn override_holds_green() {
        let mut queues = LaneQueues::default();
        let mut controller = controller(&queues);
        fill(&mut queues, Approach::North, 10);

        let changes = controller.advance(0.1, &queues);
        assert_eq!(
            changes.as_slice(),
            &[PhaseChange::OverrideActivated {
                from: Approach::South,
                to: Approach::North
            }]
        );
        for _ in 0..1000 {
            assert!(controller.advance(0.1, &queues).is_empty());
            assert!(controller.is_green(Approach::North));
            assert_eq!(controller.state().phase_elapsed, 0.0);
        }
    }

    #[test]
    fn hysteresis_band_never_toggles() {
        let mut queues = LaneQueues::default();
        let mut controller = controller(&queues);

        // Inside the band with the override off: it stays off.
        for depth in (5..10).chain((5..10).rev()).cycle().take(200) {
            fill(&mut queues, Approach::North, depth);
            controller.advance(0.1, &queues);
            assert!(!controller.override_active());
        }

        fill(&mut queues, Approach::North, 10);
        controller.advance(0.1, &queues);
        assert!(controller.override_active());

        // Inside the band with the override on: it stays on.
        for depth in (5..10).chain((5..10).rev()).cycle().take(200) {
            fill(&mut queues, Approach::North, depth);
            controller.advance(0.1, &queues);
            assert!(controller.override_active());
            assert!(controller.is_green(Approach::North));
        }

        fill(&mut queues, Approach::North, 4);
        let changes = controller.advance(0.1, &queues);
        assert_eq!(changes.as_slice(), &[PhaseChange::OverrideReleased]);
        assert!(!controller.override_active());
    }

    #[test]
    fn release_resumes_rotation_with_fresh_duration() {
        let mut queues = LaneQueues::default();
        let mut controller = controller(&queues);
        fill(&mut queues, Approach::North, 12);
        controller.advance(0.1, &queues);

        fill(&mut queues, Approach::North, 4);
        fill(&mut queues, Approach::East, 4);
        controller.advance(0.1, &queues);
        let state = controller.state();
        assert!(!state.override_active);
        assert_eq!(state.active_approach, Approach::North);
        assert_approx_eq!(state.phase_duration, 1.6);
        assert_approx_eq!(state.phase_elapsed, 0.1);

        controller.advance(1.6, &queues);
        assert_eq!(controller.active_approach(), Approach::South);
    }
}
