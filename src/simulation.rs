use crate::arrival::{ArrivalRecord, ArrivalSource};
use crate::config::SimulationConfig;
use crate::error::{SimError, SimResult};
use crate::event::{EventKind, SimEvent};
use crate::geometry::{Approach, LaneRole, Layout};
use crate::pool::VehiclePool;
use crate::queue::{LaneQueue, LaneQueues};
use crate::router::TransitionRouter;
use crate::saturation::SaturationMonitor;
use crate::signal::{IntersectionController, PhaseChange};
use crate::snapshot::{Snapshot, VehicleView};
use crate::vehicle::following::CarFollowingModel;
use crate::vehicle::Vehicle;
use crate::VehicleId;

/// A simulation of a single signalised intersection.
///
/// All simulation state lives here, so independent simulations can run side by side.
#[derive(Clone, Debug)]
pub struct Simulation {
    /// The parameters of the simulation.
    config: SimulationConfig,
    /// The geometry of the intersection.
    layout: Layout,
    /// The vehicles being simulated.
    vehicles: VehiclePool,
    /// The controlled lane queues.
    queues: LaneQueues,
    /// The signal.
    controller: IntersectionController,
    /// The car following model.
    following: CarFollowingModel,
    /// Moves vehicles across the intersection.
    router: TransitionRouter,
    /// The lane saturation alerts.
    saturation: SaturationMonitor,
    /// Events not yet taken by [Self::take_events].
    events: Vec<SimEvent>,
    /// The current frame of simulation.
    frame: usize,
    /// The simulation time in s.
    time: f64,
}

impl Simulation {
    /// Creates a new, empty simulation.
    pub fn new(config: SimulationConfig) -> SimResult<Self> {
        config.validate()?;
        let layout = Layout::new(&config);
        let queues = LaneQueues::default();
        Ok(Self {
            vehicles: VehiclePool::new(
                config.capacity,
                config.lane_capacity,
                config.spacing(),
                config.cruise_speed,
            ),
            controller: IntersectionController::new(&config, &queues),
            following: CarFollowingModel::new(&config, &layout),
            router: TransitionRouter::new(&config),
            saturation: SaturationMonitor::new(&config),
            queues,
            layout,
            config,
            events: vec![],
            frame: 0,
            time: 0.0,
        })
    }

    /// Adds an arriving vehicle to the simulation.
    ///
    /// Only the controlled and free turn lanes accept arrivals. Fails if the record
    /// targets an incoming lane, or if the pool or the lane is full.
    pub fn arrive(&mut self, record: &ArrivalRecord) -> SimResult<VehicleId> {
        let (approach, role) = (record.approach, record.role);
        if !role.is_arrival() {
            return Err(SimError::MalformedArrival(record.to_string()));
        }

        self.check_saturation(approach, role);
        let id = self
            .vehicles
            .spawn(&self.layout, approach, role, record.plate.as_str())?;
        if role == LaneRole::Controlled {
            self.queues[approach].enqueue(id);
        }
        self.check_saturation(approach, role);
        Ok(id)
    }

    /// Takes arrivals from a source, up to the per-tick limit, and adds them to the
    /// simulation. Records that cannot be parsed or placed are dropped.
    /// Returns the number of vehicles added.
    pub fn ingest(&mut self, source: &mut dyn ArrivalSource) -> usize {
        let lines = match source.poll(self.config.max_arrivals_per_tick) {
            Ok(lines) => lines,
            Err(e) => {
                log::warn!("could not read arrivals: {}", e);
                return 0;
            }
        };
        let mut added = 0;
        for line in lines {
            match line.parse::<ArrivalRecord>().and_then(|record| self.arrive(&record)) {
                Ok(_) => added += 1,
                Err(e) => log::debug!("dropped arrival: {}", e),
            }
        }
        added
    }

    /// Advances the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        self.advance_signal(dt);
        self.following.step(&mut self.vehicles, &self.controller, dt);
        self.transition_vehicles();
        self.saturation.update(dt);
        self.frame += 1;
        self.time += dt;

        #[cfg(debug_assertions)]
        self.check_invariants();
    }

    /// Takes arrivals from a source and then advances the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f64, source: &mut dyn ArrivalSource) {
        self.ingest(source);
        self.step(dt);
    }

    /// Gets the parameters of the simulation.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Gets the geometry of the intersection.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Gets the current simulation frame index.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Gets the simulation time in s.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Returns an iterator over all the vehicles in the simulation.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.iter()
    }

    /// Gets a reference to the vehicle with the given ID, if it still exists.
    pub fn get_vehicle(&self, vehicle_id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(vehicle_id)
    }

    /// Counts the vehicles in a lane.
    pub fn count_in_lane(&self, approach: Approach, role: LaneRole) -> usize {
        self.vehicles.count_in_lane(approach, role)
    }

    /// Gets the controlled lane queue of an approach.
    pub fn queue(&self, approach: Approach) -> &LaneQueue {
        &self.queues[approach]
    }

    /// Gets the signal.
    pub fn controller(&self) -> &IntersectionController {
        &self.controller
    }

    /// Gets the lane saturation alerts.
    pub fn saturation(&self) -> &SaturationMonitor {
        &self.saturation
    }

    /// Takes the events that happened since the last call.
    pub fn take_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Gets a read-only picture of the simulation.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            time: self.time,
            vehicles: self
                .vehicles
                .iter()
                .map(|vehicle| VehicleView {
                    plate: vehicle.plate().to_owned(),
                    approach: vehicle.approach(),
                    role: vehicle.role(),
                    pos: vehicle.pos(),
                    position: self.layout.world_position(
                        vehicle.approach(),
                        vehicle.role(),
                        vehicle.pos(),
                    ),
                })
                .collect(),
            controller: self.controller.state(),
            alerts: self.saturation.active_alerts().collect(),
        }
    }

    /// Updates the signal and records what changed.
    fn advance_signal(&mut self, dt: f64) {
        for change in self.controller.advance(dt, &self.queues) {
            let kind = match change {
                PhaseChange::Rotated { from, to } => EventKind::ApproachChanged { from, to },
                PhaseChange::OverrideActivated { from, to } => {
                    if from != to {
                        self.record(EventKind::ApproachChanged { from, to });
                    }
                    EventKind::OverrideActivated { approach: to }
                }
                PhaseChange::OverrideReleased => EventKind::OverrideReleased {
                    approach: self.config.override_approach,
                },
            };
            self.record(kind);
        }
    }

    /// Moves vehicles across the intersection and removes those that have left.
    fn transition_vehicles(&mut self) {
        self.router.step(&mut self.vehicles, &mut self.queues, &self.layout);
        for vehicle in self.router.despawn_exited(&mut self.vehicles, &self.layout) {
            log::trace!("{} left by {:?}", vehicle.plate(), vehicle.approach());
        }
    }

    /// Raises a saturation alert for a lane if it is full enough.
    fn check_saturation(&mut self, approach: Approach, role: LaneRole) {
        let occupancy = self.vehicles.count_in_lane(approach, role);
        if self.saturation.check(approach, role, occupancy) {
            self.record(EventKind::SaturationAlert { approach, role });
        }
    }

    /// Logs an event and keeps it for [Self::take_events].
    fn record(&mut self, kind: EventKind) {
        match kind {
            EventKind::ApproachChanged { from, to } => {
                log::debug!("t={:.2} green {:?} -> {:?}", self.time, from, to)
            }
            EventKind::OverrideActivated { approach } => {
                log::info!("t={:.2} priority override on for {:?}", self.time, approach)
            }
            EventKind::OverrideReleased { approach } => {
                log::info!("t={:.2} priority override off for {:?}", self.time, approach)
            }
            EventKind::SaturationAlert { approach, role } => {
                log::warn!("t={:.2} {:?} {:?} saturated", self.time, approach, role)
            }
        }
        self.events.push(SimEvent {
            time: self.time,
            kind,
        });
    }

    /// Panics if the queues, the intersection box or vehicle spacing are inconsistent.
    #[cfg(debug_assertions)]
    fn check_invariants(&self) {
        use itertools::Itertools;

        for approach in Approach::ALL {
            self.queues[approach].check_order(&self.vehicles, approach);
        }
        if let Some(vehicle) = self
            .vehicles
            .iter()
            .find(|v| v.role().is_arrival() && self.layout.reached_footprint(v.pos()))
        {
            panic!("{} was left in the intersection at {}", vehicle.plate(), vehicle.pos());
        }
        let min_spacing = self.config.spacing() - 1e-6;
        let lanes = self
            .vehicles
            .iter()
            .map(|v| ((v.approach(), v.role()), v.pos()))
            .into_group_map();
        for ((approach, role), positions) in lanes {
            for (ahead, behind) in positions
                .into_iter()
                .sorted_by(|a, b| b.total_cmp(a))
                .tuple_windows()
            {
                assert!(
                    ahead - behind >= min_spacing,
                    "{:?} {:?} vehicles at {} and {} are too close",
                    approach,
                    role,
                    ahead,
                    behind
                );
            }
        }
    }
}
