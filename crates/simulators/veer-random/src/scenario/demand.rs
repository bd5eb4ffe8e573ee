use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;

use crate::simulation::config::ScenarioSettings;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DemandSettings {
    pub enabled: bool,
    pub python: String,
    /// Trip generator script; `$SUMO_HOME/tools/randomTrips.py` when unset.
    pub script: Option<PathBuf>,
    pub begin: f64,
    pub end: f64,
    pub period: f64,
    pub trip_attributes: String,
    pub randomize: bool,
    pub extra_args: Vec<String>,
}

impl Default for DemandSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            python: "python".to_string(),
            script: None,
            begin: 0.0,
            end: 3600.0,
            period: 1.5,
            trip_attributes: "type='type1'".to_string(),
            randomize: true,
            extra_args: Vec::new(),
        }
    }
}

/// Background traffic produced by SUMO's `randomTrips.py`.
pub struct DemandGenerator<'a> {
    settings: &'a DemandSettings,
    scenario: &'a ScenarioSettings,
}

impl<'a> DemandGenerator<'a> {
    pub fn new(settings: &'a DemandSettings, scenario: &'a ScenarioSettings) -> Self {
        Self { settings, scenario }
    }

    fn script(&self) -> PathBuf {
        match &self.settings.script {
            Some(script) => script.clone(),
            None => std::env::var_os("SUMO_HOME")
                .map(PathBuf::from)
                .unwrap_or_default()
                .join("tools")
                .join("randomTrips.py"),
        }
    }

    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.settings.python);
        command
            .arg(self.script())
            .arg("-n")
            .arg(&self.scenario.net_file)
            .arg("-o")
            .arg(&self.scenario.trip_file)
            .arg("-r")
            .arg(&self.scenario.route_file)
            .arg("-b")
            .arg(self.settings.begin.to_string())
            .arg("-e")
            .arg(self.settings.end.to_string())
            .arg("-p")
            .arg(self.settings.period.to_string())
            .arg("--additional-file")
            .arg(&self.scenario.additional_file)
            .arg("--trip-attributes")
            .arg(&self.settings.trip_attributes);
        if self.settings.randomize {
            command.arg("--random");
        }
        command.args(&self.settings.extra_args);
        command
    }

    /// Blocks until the generator finishes. Only a failure to start it is an error.
    pub fn generate(&self) -> Result<()> {
        if !self.settings.enabled {
            info!("Demand generation is disabled, keeping existing trips");
            return Ok(());
        }
        let mut command = self.command();
        info!(
            "Generating demand into {}",
            self.scenario.route_file.display()
        );
        let status = command
            .status()
            .with_context(|| format!("failed to run {}", self.settings.python))?;
        if !status.success() {
            warn!("Demand generator exited with {}", status);
        }
        Ok(())
    }
}
