use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EditorSettings {
    pub enabled: bool,
    pub binary: String,
    /// Opens the scenario network directly instead of an empty editor.
    pub open_network: bool,
    pub extra_args: Vec<String>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: "netedit".to_string(),
            open_network: true,
            extra_args: Vec::new(),
        }
    }
}

pub fn editor_command(settings: &EditorSettings, net_file: &Path) -> Command {
    let mut command = Command::new(&settings.binary);
    if settings.open_network {
        command.arg("-s").arg(net_file);
    }
    command.args(&settings.extra_args);
    command
}

/// Hands the network to the interactive editor and waits until it is closed.
/// Changes are picked up by reading the network file again afterwards.
pub fn edit_network(settings: &EditorSettings, net_file: &Path) -> Result<()> {
    info!("Waiting for {} to finish editing {}", settings.binary, net_file.display());
    let status = editor_command(settings, net_file)
        .status()
        .with_context(|| format!("failed to run {}", settings.binary))?;
    if !status.success() {
        warn!("{} exited with {}", settings.binary, status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_opens_the_network() {
        let command = editor_command(&EditorSettings::default(), Path::new("Net/dqnm.net.xml"));
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, vec!["-s", "Net/dqnm.net.xml"]);
    }

    #[test]
    fn missing_editor_is_an_error() {
        let settings = EditorSettings {
            binary: "/nonexistent/netedit".to_string(),
            ..EditorSettings::default()
        };
        assert!(edit_network(&settings, Path::new("net.xml")).is_err());
    }
}
