use crate::error::{SimError, SimResult};
use crate::geometry::Approach;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The parameters of a simulation.
///
/// Distances are in screen units and times in seconds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulationConfig {
    /// The maximum number of vehicles in the simulation at once.
    pub capacity: usize,
    /// The maximum number of vehicles in any one lane.
    pub lane_capacity: usize,
    /// The speed of every moving vehicle.
    pub cruise_speed: f64,
    /// The vehicle length.
    pub vehicle_length: f64,
    /// The vehicle width.
    pub vehicle_width: f64,
    /// The minimum bumper-to-bumper gap between a vehicle and the one ahead.
    pub min_headway: f64,
    /// The width of each road, which is also the side of the intersection box.
    pub road_width: f64,
    /// The width of a single lane.
    pub lane_width: f64,
    /// The distance between the stop line and the intersection box.
    pub stop_line_margin: f64,
    /// The width of the visible region.
    pub view_width: f64,
    /// The height of the visible region.
    pub view_height: f64,
    /// The green time budgeted per queued vehicle, and the shortest possible phase.
    pub time_per_vehicle: f64,
    /// The lane occupancy at which a saturation alert is raised.
    pub saturation_threshold: usize,
    /// How long a saturation alert stays active after it is raised.
    pub saturation_alert_secs: f64,
    /// The maximum number of arrival records consumed per tick.
    pub max_arrivals_per_tick: usize,
    /// Vehicles this close to their stopping point are snapped onto it.
    pub snap_tolerance: f64,
    /// The approach whose controlled lane can preempt the signal.
    pub override_approach: Approach,
    /// The occupancy at which the priority override activates.
    pub override_on: usize,
    /// The occupancy at or below which the priority override is released.
    pub override_off: usize,
    /// The seed of the routing random number generator.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            capacity: 64,
            lane_capacity: 16,
            cruise_speed: 80.0,
            vehicle_length: 36.0,
            vehicle_width: 18.0,
            min_headway: 24.0,
            road_width: 180.0,
            lane_width: 60.0,
            stop_line_margin: 15.0,
            view_width: 1200.0,
            view_height: 900.0,
            time_per_vehicle: 0.8,
            saturation_threshold: 10,
            saturation_alert_secs: 3.0,
            max_arrivals_per_tick: 16,
            snap_tolerance: 1.0,
            override_approach: Approach::North,
            override_on: 10,
            override_off: 4,
            seed: 0,
        }
    }
}

impl SimulationConfig {
    /// The centre-to-centre distance a vehicle keeps from the one ahead.
    pub fn spacing(&self) -> f64 {
        self.vehicle_length + self.min_headway
    }

    /// Checks that the parameters describe a workable intersection.
    pub fn validate(&self) -> SimResult<()> {
        let invalid = |msg: &str| Err(SimError::InvalidConfig(msg.to_owned()));
        if self.capacity == 0 || self.lane_capacity == 0 {
            return invalid("capacities must be positive");
        }
        if self.override_off >= self.override_on {
            return invalid("override_off must be below override_on");
        }
        let positive = [
            self.cruise_speed,
            self.vehicle_length,
            self.min_headway,
            self.road_width,
            self.lane_width,
            self.time_per_vehicle,
            self.snap_tolerance,
        ];
        if positive.iter().any(|v| !(*v > 0.0)) {
            return invalid("speeds, lengths and times must be positive");
        }
        if self.view_width <= self.road_width || self.view_height <= self.road_width {
            return invalid("the view must be larger than the intersection");
        }
        Ok(())
    }

    /// Parses a configuration from JSON. Missing fields take their default values.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> SimResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SimError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_hysteresis() {
        let config = SimulationConfig {
            override_on: 4,
            override_off: 4,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_speed() {
        let config = SimulationConfig {
            cruise_speed: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn loads_partial_json() {
        let config = SimulationConfig::from_json(r#"{ "capacity": 8, "seed": 7 }"#).unwrap();
        assert_eq!(config.capacity, 8);
        assert_eq!(config.seed, 7);
        assert_eq!(config.lane_capacity, 16);
    }
}
