use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use veer_output::logger::initiate_logger;

use crate::simulation::config::{BaseConfig, BaseConfigReader, RunOptions};
use crate::simulation::experiment::Experiment;

pub(crate) mod routing;
pub(crate) mod scenario;
pub(crate) mod simulation;

#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
struct CliArgs {
    #[arg(short = 'c', long, value_name = "CONFIG_FILE")]
    config: Option<String>,
    /// Episodes per pass; 0 runs 300.
    #[arg(short = 'N', long = "num-episode", visible_alias = "num_episode", value_name = "EPISODES")]
    num_episode: Option<u32>,
    /// Run the command line simulator instead of sumo-gui.
    #[arg(long)]
    nogui: bool,
    /// Do not save travel time plots.
    #[arg(long)]
    noplot: bool,
    /// Skip the interactive network editing between the passes.
    #[arg(long)]
    no_edit: bool,
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    let start = std::time::Instant::now();

    let config: BaseConfig = match &args.config {
        Some(config_file) => BaseConfigReader::new(config_file)
            .parse()
            .with_context(|| format!("failed to load {}", config_file))?,
        None => BaseConfig::default(),
    };
    let log_file = initiate_logger(Path::new("."), &config.log_settings)?;
    info!("Logging to {}", log_file.display());

    let options = RunOptions {
        episodes: RunOptions::resolve_episodes(args.num_episode, config.episode.episodes),
        gui: !args.nogui,
        plot: !args.noplot,
        edit: !args.no_edit,
    };
    let results = Experiment::new(config, options).run()?;
    info!(
        "Seed {}: {} arrivals before editing, {} after",
        results.seed,
        results.initial.len(),
        results.edited.len()
    );

    let elapsed = start.elapsed();
    info!("Simulation finished in {} ms.", elapsed.as_millis());
    Ok(())
}
