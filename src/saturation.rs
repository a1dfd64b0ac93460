use crate::config::SimulationConfig;
use crate::geometry::{Approach, LaneRole};
use itertools::iproduct;

/// Raises a timed alert for each lane whose occupancy reaches a threshold.
///
/// Alerts are purely informational and have no effect on the simulation.
#[derive(Clone, Debug)]
pub struct SaturationMonitor {
    /// The remaining alert time of each lane, indexed by approach then lane role.
    timers: [[f64; 3]; 4],
    /// The occupancy at which a lane is saturated.
    threshold: usize,
    /// The alert time set when a lane is found saturated.
    alert_secs: f64,
}

impl SaturationMonitor {
    /// Creates a monitor with no active alerts.
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            timers: Default::default(),
            threshold: config.saturation_threshold,
            alert_secs: config.saturation_alert_secs,
        }
    }

    /// Checks a lane's occupancy, restarting its alert if it is saturated.
    /// Returns `true` iff this raised an alert that was not already active.
    pub fn check(&mut self, approach: Approach, role: LaneRole, occupancy: usize) -> bool {
        if occupancy < self.threshold {
            return false;
        }
        let timer = &mut self.timers[approach.index()][role.index()];
        let raised = *timer <= 0.0;
        *timer = self.alert_secs;
        raised
    }

    /// Counts down all the alert timers by `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        for timer in self.timers.iter_mut().flatten() {
            *timer = f64::max(*timer - dt, 0.0);
        }
    }

    /// The remaining alert time of a lane, in s.
    pub fn timer(&self, approach: Approach, role: LaneRole) -> f64 {
        self.timers[approach.index()][role.index()]
    }

    /// Whether a lane's alert is active.
    pub fn is_active(&self, approach: Approach, role: LaneRole) -> bool {
        self.timer(approach, role) > 0.0
    }

    /// Returns an iterator over the lanes with active alerts.
    pub fn active_alerts(&self) -> impl Iterator<Item = (Approach, LaneRole)> + '_ {
        iproduct!(Approach::ALL, LaneRole::ALL)
            .filter(move |(approach, role)| self.is_active(*approach, *role))
    }
}
