use log::{debug, info, warn};
use thiserror::Error;

use veer_core::edge::EdgeId;
use veer_core::episode::EpisodeOutcome;
use veer_core::step::Step;
use veer_net::network::Adjacency;
use veer_traci::control::{Launch, TrafficControl};
use veer_traci::error::TraciError;

use crate::routing::policy::RoutePolicy;
use crate::simulation::config::EpisodeSettings;

/// Failure while observing or steering the tracked vehicle during a tick.
#[derive(Error, Debug)]
pub enum TickError {
    /// The simulator refused a request about the vehicle: it left the network or
    /// cannot take the new target.
    #[error("simulator rejected a request for vehicle {vehicle}: {source}")]
    VehicleRejected { vehicle: String, source: TraciError },
    #[error(transparent)]
    Simulator(#[from] TraciError),
}

/// Reroute issued when the vehicle entered `at`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reroute {
    pub at: EdgeId,
    pub target: EdgeId,
}

#[derive(Debug)]
pub struct EpisodeReport {
    pub outcome: EpisodeOutcome,
    pub start: Option<EdgeId>,
    pub reroutes: Vec<Reroute>,
}

impl EpisodeReport {
    /// The start edge followed by every rerouting decision, e.g. `E0 -> E3[E8] -> E8[E9]`.
    pub fn trail(&self) -> String {
        let mut trail = self
            .start
            .as_ref()
            .map_or_else(|| "?".to_string(), |start| start.to_string());
        for reroute in self.reroutes.iter() {
            trail.push_str(&format!(" -> {}[{}]", reroute.at, reroute.target));
        }
        trail
    }
}

#[derive(Default)]
struct EpisodeState {
    steps: Step,
    start: Option<EdgeId>,
    previous: Option<EdgeId>,
    reroutes: Vec<Reroute>,
}

impl EpisodeState {
    fn into_report(self, outcome: EpisodeOutcome) -> EpisodeReport {
        EpisodeReport {
            outcome,
            start: self.start,
            reroutes: self.reroutes,
        }
    }
}

/// Drives a single vehicle through one simulation per episode, asking the policy
/// for a new target every time the vehicle enters another edge.
pub struct EpisodeRunner<'a, P: RoutePolicy> {
    settings: &'a EpisodeSettings,
    adjacency: &'a Adjacency,
    policy: P,
}

impl<'a, P: RoutePolicy> EpisodeRunner<'a, P> {
    pub fn new(settings: &'a EpisodeSettings, adjacency: &'a Adjacency, policy: P) -> Self {
        Self {
            settings,
            adjacency,
            policy,
        }
    }

    /// Runs one episode in a freshly launched simulation. A request about the
    /// vehicle that the simulator refuses ends the episode without a result; any
    /// other simulator failure is returned.
    pub fn run<L: Launch>(
        &mut self,
        launcher: &mut L,
        episode: u32,
    ) -> Result<EpisodeReport, TraciError> {
        info!("Episode {} starting", episode);
        let mut control = launcher.launch()?;
        let mut state = EpisodeState::default();

        match self.drive(&mut control, &mut state) {
            Ok(outcome) => {
                control.close()?;
                info!("Episode {} {}", episode, outcome);
                Ok(state.into_report(outcome))
            }
            Err(TickError::VehicleRejected { vehicle, source }) => {
                warn!(
                    "Episode {} aborted at step {}: simulator rejected {} ({})",
                    episode, state.steps, vehicle, source
                );
                if let Err(e) = control.close() {
                    warn!("Failed to close the simulation cleanly: {}", e);
                }
                let outcome = EpisodeOutcome::Lost {
                    steps: state.steps,
                    reason: source.to_string(),
                };
                Ok(state.into_report(outcome))
            }
            Err(TickError::Simulator(e)) => {
                if let Err(close_error) = control.close() {
                    debug!("Closing after failure also failed: {}", close_error);
                }
                Err(e)
            }
        }
    }

    fn drive<C: TrafficControl>(
        &mut self,
        control: &mut C,
        state: &mut EpisodeState,
    ) -> Result<EpisodeOutcome, TickError> {
        let settings = self.settings;
        let vehicle = settings.vehicle_id.as_str();
        control.add_route(&settings.route_id, &settings.default_route)?;
        control.add_vehicle(vehicle, &settings.route_id)?;
        control.simulation_step()?;

        let start = self.current_edge(control)?;
        debug!("{} departs on {}", vehicle, start);
        state.start = Some(start.clone());
        state.previous = Some(start);

        while control.min_expected_vehicles()? > 0 {
            control.simulation_step()?;
            state.steps.increment();
            let current = self.current_edge(control)?;

            if current == settings.success_edge {
                return Ok(EpisodeOutcome::Arrived { steps: state.steps });
            }

            if state.previous.as_ref() != Some(&current) && self.adjacency.contains(&current) {
                self.reroute(control, state, &current)?;
                state.previous = Some(current);
            }

            if let Some(max_steps) = settings.max_steps {
                if state.steps.as_u64() >= max_steps {
                    return Ok(EpisodeOutcome::Lost {
                        steps: state.steps,
                        reason: format!("no arrival within {} steps", max_steps),
                    });
                }
            }
        }

        Ok(EpisodeOutcome::Lost {
            steps: state.steps,
            reason: "simulation ended before arrival".to_string(),
        })
    }

    fn reroute<C: TrafficControl>(
        &mut self,
        control: &mut C,
        state: &mut EpisodeState,
        current: &EdgeId,
    ) -> Result<(), TickError> {
        let adjacency = self.adjacency;
        let options = match adjacency.next_edges(current) {
            Some(options) => options,
            None => return Ok(()),
        };
        match self.policy.next_edge(current, options) {
            Some(target) => {
                debug!("{} -> {}", current, target);
                control
                    .change_target(&self.settings.vehicle_id, target)
                    .map_err(|e| self.classify(e))?;
                state.reroutes.push(Reroute {
                    at: current.clone(),
                    target: target.clone(),
                });
            }
            None => debug!("{} has no outgoing edges, keeping the current route", current),
        }
        Ok(())
    }

    fn current_edge<C: TrafficControl>(&self, control: &mut C) -> Result<EdgeId, TickError> {
        let lane = control
            .vehicle_lane(&self.settings.vehicle_id)
            .map_err(|e| self.classify(e))?;
        control.lane_edge(&lane).map_err(|e| self.classify(e))
    }

    fn classify(&self, error: TraciError) -> TickError {
        if error.is_command_failure() {
            TickError::VehicleRejected {
                vehicle: self.settings.vehicle_id.clone(),
                source: error,
            }
        } else {
            TickError::Simulator(error)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use veer_core::edge::{LaneId, NextEdges};
    use veer_traci::constants::{CMD_GET_VEHICLE_VARIABLE, CMD_SET_VEHICLE_VARIABLE};

    use crate::routing::policy::RandomPolicy;

    use super::*;

    /// What every scripted simulation saw, shared across launches.
    #[derive(Default, Debug)]
    pub(crate) struct ControlLog {
        pub(crate) launches: u32,
        pub(crate) closes: u32,
        pub(crate) targets: Vec<EdgeId>,
        pub(crate) routes: Vec<Vec<EdgeId>>,
    }

    /// One lane per tick, starting with the spawn tick. `None` means the vehicle
    /// is unknown to the simulation at that tick.
    pub(crate) struct ScriptedControl {
        lanes: Vec<Option<&'static str>>,
        tick: usize,
        log: Rc<RefCell<ControlLog>>,
        broken_step: Option<usize>,
        refuse_targets: bool,
    }

    impl TrafficControl for ScriptedControl {
        fn add_route(&mut self, _route_id: &str, edges: &[EdgeId]) -> Result<(), TraciError> {
            self.log.borrow_mut().routes.push(edges.to_vec());
            Ok(())
        }

        fn add_vehicle(&mut self, _vehicle_id: &str, _route_id: &str) -> Result<(), TraciError> {
            Ok(())
        }

        fn simulation_step(&mut self) -> Result<(), TraciError> {
            if self.broken_step == Some(self.tick + 1) {
                return Err(TraciError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "simulator crashed",
                )));
            }
            self.tick += 1;
            Ok(())
        }

        fn vehicle_lane(&mut self, vehicle_id: &str) -> Result<LaneId, TraciError> {
            let lane = self.tick.checked_sub(1).and_then(|idx| self.lanes.get(idx));
            match lane.copied().flatten() {
                Some(lane) => Ok(LaneId::new(lane)),
                None => Err(TraciError::CommandFailed {
                    command: CMD_GET_VEHICLE_VARIABLE,
                    message: format!("Vehicle '{}' is not known", vehicle_id),
                }),
            }
        }

        fn lane_edge(&mut self, lane: &LaneId) -> Result<EdgeId, TraciError> {
            let edge = lane
                .as_str()
                .rsplit_once('_')
                .map_or(lane.as_str(), |(edge, _)| edge);
            Ok(EdgeId::from(edge))
        }

        fn change_target(&mut self, vehicle_id: &str, edge: &EdgeId) -> Result<(), TraciError> {
            if self.refuse_targets {
                return Err(TraciError::CommandFailed {
                    command: CMD_SET_VEHICLE_VARIABLE,
                    message: format!("Route replacement failed for {}", vehicle_id),
                });
            }
            self.log.borrow_mut().targets.push(edge.clone());
            Ok(())
        }

        fn min_expected_vehicles(&mut self) -> Result<i32, TraciError> {
            Ok(if self.tick < self.lanes.len() { 1 } else { 0 })
        }

        fn close(self) -> Result<(), TraciError> {
            self.log.borrow_mut().closes += 1;
            Ok(())
        }
    }

    pub(crate) struct ScriptedLauncher {
        pub(crate) scripts: VecDeque<Vec<Option<&'static str>>>,
        pub(crate) log: Rc<RefCell<ControlLog>>,
        pub(crate) broken_step: Option<usize>,
        pub(crate) refuse_targets: bool,
    }

    impl ScriptedLauncher {
        pub(crate) fn new(scripts: Vec<Vec<Option<&'static str>>>) -> Self {
            Self {
                scripts: scripts.into(),
                log: Rc::new(RefCell::new(ControlLog::default())),
                broken_step: None,
                refuse_targets: false,
            }
        }
    }

    impl Launch for ScriptedLauncher {
        type Control = ScriptedControl;

        fn launch(&mut self) -> Result<ScriptedControl, TraciError> {
            self.log.borrow_mut().launches += 1;
            let lanes = self
                .scripts
                .pop_front()
                .ok_or_else(|| TraciError::Launch("no script left".to_string()))?;
            Ok(ScriptedControl {
                lanes,
                tick: 0,
                log: Rc::clone(&self.log),
                broken_step: self.broken_step,
                refuse_targets: self.refuse_targets,
            })
        }
    }

    /// `E0..E9` where only `E0 -> E3 -> E8 -> E9` is connected.
    pub(crate) fn chain_adjacency() -> Adjacency {
        let links = [("E0", "E3"), ("E3", "E8"), ("E8", "E9")];
        (0..10)
            .map(|idx| {
                let edge = EdgeId::from(format!("E{}", idx));
                let next: NextEdges = links
                    .iter()
                    .filter(|(from, _)| edge == *from)
                    .map(|(_, to)| EdgeId::from(*to))
                    .collect();
                (edge, next)
            })
            .collect()
    }

    pub(crate) fn chain_script() -> Vec<Option<&'static str>> {
        vec![
            Some("E0_0"),
            Some("E0_0"),
            Some(":J1_0_0"),
            Some("E3_0"),
            Some("E3_0"),
            Some(":J2_0_0"),
            Some("E8_0"),
            Some("E8_0"),
            Some("E9_0"),
        ]
    }

    #[test]
    fn chain_episode_arrives_after_two_reroutes() {
        let settings = EpisodeSettings::default();
        let adjacency = chain_adjacency();
        let mut launcher = ScriptedLauncher::new(vec![chain_script()]);
        let mut runner = EpisodeRunner::new(&settings, &adjacency, RandomPolicy::seeded(5));

        let report = runner.run(&mut launcher, 0).expect("episode runs");
        assert_eq!(report.outcome, EpisodeOutcome::Arrived { steps: Step(8) });
        assert_eq!(report.start, Some(EdgeId::from("E0")));
        assert_eq!(
            report.reroutes,
            vec![
                Reroute {
                    at: EdgeId::from("E3"),
                    target: EdgeId::from("E8"),
                },
                Reroute {
                    at: EdgeId::from("E8"),
                    target: EdgeId::from("E9"),
                },
            ]
        );

        assert_eq!(report.trail(), "E0 -> E3[E8] -> E8[E9]");

        let log = launcher.log.borrow();
        assert_eq!(log.targets, vec![EdgeId::from("E8"), EdgeId::from("E9")]);
        assert_eq!(log.routes, vec![settings.default_route.clone()]);
        assert_eq!(log.closes, 1);
    }

    #[test]
    fn repeated_edge_never_reroutes() {
        let settings = EpisodeSettings::default();
        let adjacency = chain_adjacency();
        let script = vec![Some("E0_0"), Some("E0_0"), Some("E0_0"), Some("E0_0")];
        let mut launcher = ScriptedLauncher::new(vec![script]);
        let mut runner = EpisodeRunner::new(&settings, &adjacency, RandomPolicy::seeded(5));

        let report = runner.run(&mut launcher, 0).expect("episode runs");
        assert!(report.reroutes.is_empty());
        assert!(!report.outcome.is_arrived());
        assert!(launcher.log.borrow().targets.is_empty());
    }

    #[test]
    fn dead_end_is_left_alone() {
        let settings = EpisodeSettings {
            success_edge: EdgeId::from("E4"),
            ..EpisodeSettings::default()
        };
        let adjacency = chain_adjacency();
        let script = vec![Some("E1_0"), Some("E2_0"), Some("E4_0")];
        let mut launcher = ScriptedLauncher::new(vec![script]);
        let mut runner = EpisodeRunner::new(&settings, &adjacency, RandomPolicy::seeded(5));

        let report = runner.run(&mut launcher, 0).expect("episode runs");
        assert_eq!(report.outcome, EpisodeOutcome::Arrived { steps: Step(2) });
        assert!(report.reroutes.is_empty());
    }

    #[test]
    fn vanished_vehicle_ends_episode_without_result() {
        let settings = EpisodeSettings::default();
        let adjacency = chain_adjacency();
        let script = vec![Some("E0_0"), Some("E3_0"), None];
        let mut launcher = ScriptedLauncher::new(vec![script]);
        let mut runner = EpisodeRunner::new(&settings, &adjacency, RandomPolicy::seeded(5));

        let report = runner.run(&mut launcher, 0).expect("lost vehicle is not fatal");
        assert!(matches!(
            report.outcome,
            EpisodeOutcome::Lost { steps: Step(2), .. }
        ));
        assert_eq!(launcher.log.borrow().closes, 1);
    }

    #[test]
    fn refused_reroute_ends_episode_without_result() {
        let settings = EpisodeSettings::default();
        let adjacency = chain_adjacency();
        let mut launcher = ScriptedLauncher::new(vec![chain_script(), chain_script()]);
        launcher.refuse_targets = true;
        let mut runner = EpisodeRunner::new(&settings, &adjacency, RandomPolicy::seeded(5));

        let report = runner.run(&mut launcher, 0).expect("refusal is not fatal");
        match &report.outcome {
            EpisodeOutcome::Lost { steps, reason } => {
                assert_eq!(*steps, Step(3));
                assert!(reason.contains("Route replacement failed"));
            }
            other => panic!("expected a lost episode, got {:?}", other),
        }
        assert!(report.reroutes.is_empty());
        assert_eq!(launcher.log.borrow().closes, 1);

        launcher.refuse_targets = false;
        let next = runner.run(&mut launcher, 1).expect("next episode runs");
        assert!(next.outcome.is_arrived());
    }

    #[test]
    fn simulator_failure_is_returned() {
        let settings = EpisodeSettings::default();
        let adjacency = chain_adjacency();
        let mut launcher = ScriptedLauncher::new(vec![chain_script()]);
        launcher.broken_step = Some(3);
        let mut runner = EpisodeRunner::new(&settings, &adjacency, RandomPolicy::seeded(5));

        let error = runner.run(&mut launcher, 0).expect_err("crash surfaces");
        assert!(matches!(error, TraciError::Io(_)));
        assert_eq!(launcher.log.borrow().closes, 1);
    }

    #[test]
    fn step_limit_ends_episode() {
        let settings = EpisodeSettings {
            max_steps: Some(3),
            ..EpisodeSettings::default()
        };
        let adjacency = chain_adjacency();
        let mut launcher = ScriptedLauncher::new(vec![chain_script()]);
        let mut runner = EpisodeRunner::new(&settings, &adjacency, RandomPolicy::seeded(5));

        let report = runner.run(&mut launcher, 0).expect("episode runs");
        assert!(matches!(
            report.outcome,
            EpisodeOutcome::Lost { steps: Step(3), .. }
        ));
    }
}
