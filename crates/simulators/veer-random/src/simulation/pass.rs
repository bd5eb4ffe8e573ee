use anyhow::{Context, Result};
use log::{debug, info, warn};

use veer_core::edge::EdgeId;
use veer_core::episode::{EpisodeOutcome, EpisodeRecord, TravelTimes};
use veer_net::detector::{DetectorSettings, DetectorWriter};
use veer_net::network::{Adjacency, SumoNet};
use veer_output::plot::{plot_path, TravelTimePlot};
use veer_traci::control::Launch;

use crate::routing::episode::EpisodeRunner;
use crate::routing::policy::RandomPolicy;
use crate::simulation::config::{BaseConfig, ScenarioSettings};

/// The network as it stands for one pass.
pub struct PreparedNetwork {
    pub edges: Vec<EdgeId>,
    pub adjacency: Adjacency,
    pub detectors: Vec<String>,
}

/// Writes the detector file for the current network and loads its graph.
pub fn prepare_network(
    scenario: &ScenarioSettings,
    detector_settings: &DetectorSettings,
) -> Result<PreparedNetwork> {
    let sumo_net = SumoNet::from_file(&scenario.net_file)
        .with_context(|| format!("failed to load {}", scenario.net_file.display()))?;
    let edges = sumo_net.edges().to_vec();
    let detectors = DetectorWriter::new(detector_settings)
        .write_file(&edges, &scenario.det_file)
        .with_context(|| format!("failed to write {}", scenario.det_file.display()))?;
    let adjacency = sumo_net.adjacency();
    Ok(PreparedNetwork {
        edges,
        adjacency,
        detectors,
    })
}

/// Everything one pass of episodes depends on.
pub struct PassContext<'a> {
    pub label: &'static str,
    pub config: &'a BaseConfig,
    pub seed: u64,
    pub episodes: u32,
    pub plot: bool,
}

pub fn run_pass<L: Launch>(
    context: &PassContext,
    network: &PreparedNetwork,
    launcher: &mut L,
) -> Result<TravelTimes> {
    info!(
        "Starting {} pass: {} episodes on {} edges, seed {}",
        context.label,
        context.episodes,
        network.edges.len(),
        context.seed
    );
    let episode_settings = &context.config.episode;
    let plotter = TravelTimePlot::new(context.config.output.plot);
    let plot_file = plot_path(
        &context.config.output.result_prefix,
        context.episodes,
        context.seed,
    );
    let policy = RandomPolicy::seeded(context.seed);
    let mut runner = EpisodeRunner::new(episode_settings, &network.adjacency, policy);

    let mut travel_times = TravelTimes::new();
    let mut lost = 0;
    for episode in 0..context.episodes {
        let report = runner
            .run(launcher, episode)
            .with_context(|| format!("episode {} of the {} pass failed", episode, context.label))?;
        debug!("Episode {} trail: {}", episode, report.trail());
        match report.outcome {
            EpisodeOutcome::Arrived { steps } => {
                travel_times.push(
                    EpisodeRecord::builder()
                        .seed(context.seed)
                        .episode(episode)
                        .steps(steps)
                        .build(),
                );
                if context.plot {
                    if let Err(e) = plotter.save(&travel_times, &plot_file) {
                        warn!("Failed to plot travel times: {}", e);
                    }
                }
            }
            EpisodeOutcome::Lost { .. } => lost += 1,
        }
    }

    match travel_times.mean_steps() {
        Some(mean) => info!(
            "{} pass finished: {} arrived, {} lost, mean travel time {:.1} steps",
            context.label,
            travel_times.len(),
            lost,
            mean
        ),
        None => warn!("{} pass finished without a single arrival", context.label),
    }
    Ok(travel_times)
}
