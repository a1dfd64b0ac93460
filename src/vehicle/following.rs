use crate::config::SimulationConfig;
use crate::geometry::{LaneRole, Layout};
use crate::pool::VehiclePool;
use crate::signal::IntersectionController;
use itertools::Itertools;

/// The car following and stopping model shared by all vehicles.
///
/// Vehicles either move at cruise speed or stand still. A vehicle that has to stop
/// drives up to its stopping point and is snapped exactly onto it once within the
/// snap tolerance, so stopped vehicles do not oscillate around the stop line.
#[derive(Clone, Debug)]
pub struct CarFollowingModel {
    /// The speed of a moving vehicle.
    cruise_speed: f64,
    /// The centre-to-centre distance kept from the vehicle ahead.
    spacing: f64,
    /// The tolerance band around a stopping point.
    snap_tolerance: f64,
    /// Where a vehicle's centre is when its front touches the stop line.
    stop_coordinate: f64,
}

/// What a vehicle does during one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Motion {
    /// Move at the given velocity, but not past `limit`.
    Advance { vel: f64, limit: f64 },
    /// Move onto the given coordinate and stop.
    Snap(f64),
    /// Stop where it is.
    Stop,
}

impl CarFollowingModel {
    /// Creates the model for a configuration and layout.
    pub fn new(config: &SimulationConfig, layout: &Layout) -> Self {
        Self {
            cruise_speed: config.cruise_speed,
            spacing: config.spacing(),
            snap_tolerance: config.snap_tolerance,
            stop_coordinate: layout.stop_coordinate(),
        }
    }

    /// Decides how a vehicle moves.
    ///
    /// # Parameters
    /// * `pos` - The vehicle's coordinate
    /// * `leader` - The coordinate of the nearest vehicle ahead in the same lane,
    ///   after it has moved this step
    /// * `red` - Whether the vehicle must not cross the stop line
    pub(crate) fn decide(&self, pos: f64, leader: Option<f64>, red: bool) -> Motion {
        let follow_limit = leader.map_or(f64::INFINITY, |leader| leader - self.spacing);
        let desired = f64::min(self.stop_coordinate, follow_limit);
        // A leader snapped back onto the line pulls its queue back with it.
        if red && (pos - desired).abs() <= self.snap_tolerance {
            return Motion::Snap(desired);
        }
        if pos > follow_limit {
            return Motion::Stop;
        }
        if !red {
            return self.advance(follow_limit);
        }

        if pos < desired {
            self.advance(desired)
        } else {
            // Already over the line when the signal changed; clear the intersection.
            self.advance(follow_limit)
        }
    }

    /// Moves every vehicle in the pool by one step of `dt` seconds.
    ///
    /// Each lane is moved front to back, so every vehicle follows where its leader
    /// ends up this step rather than where it started.
    pub fn step(&self, pool: &mut VehiclePool, controller: &IntersectionController, dt: f64) {
        let lanes = pool
            .iter()
            .map(|vehicle| {
                let red = vehicle.role() == LaneRole::Controlled
                    && !controller.is_green(vehicle.approach());
                ((vehicle.approach(), vehicle.role()), (vehicle.id(), vehicle.pos(), red))
            })
            .into_group_map();

        for (_, lane) in lanes {
            let mut leader = None;
            for (id, pos, red) in lane.into_iter().sorted_by(|a, b| b.1.total_cmp(&a.1)) {
                let Some(vehicle) = pool.get_mut(id) else {
                    continue;
                };
                match self.decide(pos, leader, red) {
                    Motion::Advance { vel, limit } => vehicle.integrate(vel, dt, limit),
                    Motion::Snap(pos) => vehicle.snap_to(pos),
                    Motion::Stop => vehicle.stop(),
                }
                leader = Some(vehicle.pos());
            }
        }
    }

    fn advance(&self, limit: f64) -> Motion {
        Motion::Advance {
            vel: self.cruise_speed,
            limit,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::Approach;
    use crate::queue::LaneQueues;
    use crate::VehicleId;
    use assert_approx_eq::assert_approx_eq;

    fn model() -> CarFollowingModel {
        let config = SimulationConfig::default();
        CarFollowingModel::new(&config, &Layout::new(&config))
    }

    #[test]
    fn free_road() {
        assert_eq!(
            model().decide(-400.0, None, false),
            Motion::Advance {
                vel: 80.0,
                limit: f64::INFINITY
            }
        );
    }

    #[test]
    fn red_signal_approach() {
        // The stop coordinate is -123.
        assert_eq!(
            model().decide(-300.0, None, true),
            Motion::Advance {
                vel: 80.0,
                limit: -123.0
            }
        );
        assert_eq!(model().decide(-123.8, None, true), Motion::Snap(-123.0));
        assert_eq!(model().decide(-122.5, None, true), Motion::Snap(-123.0));
    }

    #[test]
    fn red_signal_past_the_line() {
        assert_eq!(
            model().decide(-110.0, None, true),
            Motion::Advance {
                vel: 80.0,
                limit: f64::INFINITY
            }
        );
    }

    #[test]
    fn queue_behind_leader() {
        // The leader is stopped at the line, so the follower stops one spacing behind.
        assert_eq!(
            model().decide(-300.0, Some(-123.0), true),
            Motion::Advance {
                vel: 80.0,
                limit: -183.0
            }
        );
        assert_eq!(model().decide(-183.5, Some(-123.0), true), Motion::Snap(-183.0));
    }

    #[test]
    fn headway_overrides_signal() {
        assert_eq!(model().decide(-100.0, Some(-50.0), false), Motion::Stop);
        assert_eq!(model().decide(-100.0, Some(-50.0), true), Motion::Stop);
    }

    #[test]
    fn exactly_one_spacing_behind() {
        // Not too close, but there is no room to move either.
        assert_eq!(
            model().decide(-110.0, Some(-50.0), false),
            Motion::Advance {
                vel: 80.0,
                limit: -110.0
            }
        );
    }

    #[test]
    fn follow_at_distance() {
        assert_eq!(
            model().decide(-300.0, Some(-200.0), false),
            Motion::Advance {
                vel: 80.0,
                limit: -260.0
            }
        );
    }

    /// Spawns a leader stopped at the line and a follower queued one spacing behind it.
    fn queue_of_two(approach: Approach) -> (VehiclePool, VehicleId, VehicleId) {
        let config = SimulationConfig::default();
        let layout = Layout::new(&config);
        let mut pool = VehiclePool::new(8, 8, config.spacing(), config.cruise_speed);
        let leader = pool
            .spawn(&layout, approach, LaneRole::Controlled, "L")
            .unwrap();
        let follower = pool
            .spawn(&layout, approach, LaneRole::Controlled, "F")
            .unwrap();
        pool.get_mut(leader).unwrap().snap_to(-123.0);
        pool.get_mut(follower).unwrap().snap_to(-183.0);
        (pool, leader, follower)
    }

    #[test]
    fn queue_resumes_together_on_green() {
        let config = SimulationConfig::default();
        let controller = IntersectionController::new(&config, &LaneQueues::default());
        assert!(controller.is_green(Approach::South));

        let (mut pool, leader, follower) = queue_of_two(Approach::South);
        model().step(&mut pool, &controller, 0.25);
        let (leader, follower) = (pool.get(leader).unwrap(), pool.get(follower).unwrap());
        assert_approx_eq!(leader.pos(), -103.0);
        assert_approx_eq!(follower.pos(), -163.0);
        assert_approx_eq!(follower.vel(), 80.0);
    }

    #[test]
    fn queue_holds_on_red() {
        let config = SimulationConfig::default();
        let controller = IntersectionController::new(&config, &LaneQueues::default());

        let (mut pool, leader, follower) = queue_of_two(Approach::East);
        model().step(&mut pool, &controller, 0.25);
        let (leader, follower) = (pool.get(leader).unwrap(), pool.get(follower).unwrap());
        assert_eq!(leader.pos(), -123.0);
        assert_eq!(follower.pos(), -183.0);
        assert!(leader.has_stopped() && follower.has_stopped());
    }

    #[test]
    fn queue_follows_leader_back_onto_line() {
        let config = SimulationConfig::default();
        let controller = IntersectionController::new(&config, &LaneQueues::default());

        // The signal turned red just after the leader crossed the stop coordinate.
        let (mut pool, leader, follower) = queue_of_two(Approach::East);
        pool.get_mut(leader).unwrap().snap_to(-122.5);
        pool.get_mut(follower).unwrap().snap_to(-182.5);
        model().step(&mut pool, &controller, 0.25);
        assert_eq!(pool.get(leader).unwrap().pos(), -123.0);
        assert_eq!(pool.get(follower).unwrap().pos(), -183.0);
    }
}
