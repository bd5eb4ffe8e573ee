use anyhow::Result;
use log::info;

use veer_core::episode::TravelTimes;
use veer_traci::launcher::SumoLauncher;

use crate::scenario::demand::DemandGenerator;
use crate::scenario::editor::edit_network;
use crate::scenario::seed::pick_seed;
use crate::simulation::config::{BaseConfig, RunOptions};
use crate::simulation::pass::{prepare_network, run_pass, PassContext};

/// Results of both passes of an experiment.
pub struct ExperimentResults {
    pub seed: u64,
    pub initial: TravelTimes,
    pub edited: TravelTimes,
}

/// Random routing on the scenario network, then again on the network as
/// modified in the editor, both with the same seed.
pub struct Experiment {
    config: BaseConfig,
    options: RunOptions,
}

impl Experiment {
    pub fn new(config: BaseConfig, options: RunOptions) -> Self {
        Self { config, options }
    }

    pub fn run(&self) -> Result<ExperimentResults> {
        let scenario = &self.config.scenario;
        let network = prepare_network(scenario, &self.config.detectors)?;
        info!("Placed {} detectors", network.detectors.len());
        DemandGenerator::new(&self.config.demand, scenario).generate()?;

        let output = &self.config.output;
        let seed = pick_seed(
            &mut rand::thread_rng(),
            &output.model_prefix,
            self.options.episodes,
            output.seed_limit,
            output.seed_attempts,
        )?;
        info!("Using seed {}", seed);

        let mut launcher = SumoLauncher::new(&self.config.simulator, &scenario.sumocfg, self.options.gui);
        info!("Simulator binary: {}", launcher.binary().display());

        let initial = run_pass(&self.pass_context("initial", seed), &network, &mut launcher)?;

        if self.options.edit && self.config.editor.enabled {
            edit_network(&self.config.editor, &scenario.net_file)?;
        } else {
            info!("Skipping network editing");
        }

        let network = prepare_network(scenario, &self.config.detectors)?;
        DemandGenerator::new(&self.config.demand, scenario).generate()?;
        let edited = run_pass(&self.pass_context("edited", seed), &network, &mut launcher)?;

        Ok(ExperimentResults {
            seed,
            initial,
            edited,
        })
    }

    fn pass_context(&self, label: &'static str, seed: u64) -> PassContext<'_> {
        PassContext {
            label,
            config: &self.config,
            seed,
            episodes: self.options.episodes,
            plot: self.options.plot,
        }
    }
}
