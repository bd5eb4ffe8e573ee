use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use veer_core::edge::EdgeId;
use veer_net::detector::DetectorSettings;
use veer_output::logger::LogSettings;
use veer_output::plot::PlotSettings;
use veer_traci::launcher::SimulatorSettings;

use crate::scenario::demand::DemandSettings;
use crate::scenario::editor::EditorSettings;

/// Used when the episode count resolves to zero.
pub const FALLBACK_EPISODES: u32 = 300;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid toml file given: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct BaseConfig {
    pub log_settings: LogSettings,
    pub scenario: ScenarioSettings,
    pub simulator: SimulatorSettings,
    pub episode: EpisodeSettings,
    pub detectors: DetectorSettings,
    pub demand: DemandSettings,
    pub editor: EditorSettings,
    pub output: OutputSettings,
}

/// Input and generated files of one scenario.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ScenarioSettings {
    pub net_file: PathBuf,
    pub det_file: PathBuf,
    pub sumocfg: PathBuf,
    pub trip_file: PathBuf,
    pub route_file: PathBuf,
    pub additional_file: PathBuf,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            net_file: PathBuf::from("./Net/dqnm.net.xml"),
            det_file: PathBuf::from("./Add/random.det.xml"),
            sumocfg: PathBuf::from("./random.sumocfg"),
            trip_file: PathBuf::from("./Rou/random.trip.xml"),
            route_file: PathBuf::from("./Rou/random.rou.xml"),
            additional_file: PathBuf::from("./Add/dqn.add.xml"),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EpisodeSettings {
    pub episodes: u32,
    pub vehicle_id: String,
    pub route_id: String,
    pub default_route: Vec<EdgeId>,
    pub success_edge: EdgeId,
    /// Ends an episode without a result after this many ticks. Unbounded if unset.
    pub max_steps: Option<u64>,
}

impl Default for EpisodeSettings {
    fn default() -> Self {
        Self {
            episodes: 30,
            vehicle_id: "veh0".to_string(),
            route_id: "rou1".to_string(),
            default_route: ["E0", "E3", "E8", "E9"]
                .into_iter()
                .map(EdgeId::from)
                .collect(),
            success_edge: EdgeId::from("E9"),
            max_steps: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct OutputSettings {
    pub result_prefix: String,
    pub model_prefix: String,
    /// Seeds are drawn from `0..seed_limit`.
    pub seed_limit: u64,
    pub seed_attempts: u32,
    pub plot: PlotSettings,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            result_prefix: "./Result/random".to_string(),
            model_prefix: "./Model/random".to_string(),
            seed_limit: 1000,
            seed_attempts: 100,
            plot: PlotSettings::default(),
        }
    }
}

/// What the command line decided for this run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub episodes: u32,
    pub gui: bool,
    pub plot: bool,
    pub edit: bool,
}

impl RunOptions {
    pub fn resolve_episodes(requested: Option<u32>, configured: u32) -> u32 {
        match requested.unwrap_or(configured) {
            0 => FALLBACK_EPISODES,
            episodes => episodes,
        }
    }
}

pub struct BaseConfigReader {
    file_path: PathBuf,
}

impl BaseConfigReader {
    pub fn new(file_name: &str) -> Self {
        let file_path = PathBuf::from(file_name);
        Self { file_path }
    }

    pub fn parse(&self) -> Result<BaseConfig, ConfigError> {
        let parsing_result =
            std::fs::read_to_string(&self.file_path).map_err(|source| ConfigError::Read {
                path: self.file_path.clone(),
                source,
            })?;
        parse_config(&parsing_result)
    }
}

pub fn parse_config(input_toml: &str) -> Result<BaseConfig, ConfigError> {
    let config: BaseConfig = toml::from_str(input_toml)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("").expect("empty config is valid");
        assert_eq!(config.episode.episodes, 30);
        assert_eq!(config.episode.success_edge, EdgeId::from("E9"));
        assert_eq!(config.episode.default_route.len(), 4);
        assert_eq!(config.detectors.position, -10);
        assert_eq!(config.simulator.cli_binary, "sumo");
        assert_eq!(config.output.seed_limit, 1000);
    }

    #[test]
    fn sections_override_defaults() {
        let config = parse_config(
            r#"
            [scenario]
            net_file = "nets/grid.net.xml"

            [episode]
            episodes = 5
            default_route = ["A0", "A1"]
            success_edge = "A1"
            max_steps = 900

            [detectors]
            frequency = 60
            "#,
        )
        .expect("valid config");
        assert_eq!(config.scenario.net_file, PathBuf::from("nets/grid.net.xml"));
        assert_eq!(config.scenario.sumocfg, PathBuf::from("./random.sumocfg"));
        assert_eq!(config.episode.episodes, 5);
        assert_eq!(config.episode.max_steps, Some(900));
        assert_eq!(config.episode.vehicle_id, "veh0");
        assert_eq!(config.detectors.frequency, 60);
        assert_eq!(config.detectors.position, -10);
    }

    #[test]
    fn sample_scenario_parses() {
        let config = parse_config(include_str!("../../scenarios/random.toml"))
            .expect("sample scenario is valid");
        assert_eq!(config.log_settings.log_file_name, "veer.log");
        assert_eq!(config.demand.period, 1.5);
        assert_eq!(config.editor.binary, "netedit");
        assert_eq!(config.output.plot.width, 640);
        assert_eq!(config.episode.default_route.last(), Some(&EdgeId::from("E9")));
    }

    #[test]
    fn zero_episodes_fall_back() {
        assert_eq!(RunOptions::resolve_episodes(None, 30), 30);
        assert_eq!(RunOptions::resolve_episodes(Some(12), 30), 12);
        assert_eq!(RunOptions::resolve_episodes(Some(0), 30), FALLBACK_EPISODES);
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!(matches!(
            parse_config("[episode]\nepisodes = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
