use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use serde::Deserialize;

use veer_core::edge::{EdgeId, LaneId};

use crate::client::TraciClient;
use crate::control::{Launch, TrafficControl};
use crate::error::TraciError;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SimulatorSettings {
    pub cli_binary: String,
    pub gui_binary: String,
    pub tripinfo_output: String,
    pub host: String,
    /// Fixed TraCI port; a free port is picked for every launch when unset.
    pub port: Option<u16>,
    pub connect_attempts: u32,
    pub connect_delay_ms: u64,
    pub extra_args: Vec<String>,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            cli_binary: "sumo".to_string(),
            gui_binary: "sumo-gui".to_string(),
            tripinfo_output: "tripinfo.xml".to_string(),
            host: "127.0.0.1".to_string(),
            port: None,
            connect_attempts: 50,
            connect_delay_ms: 100,
            extra_args: Vec::new(),
        }
    }
}

/// Finds a SUMO executable, preferring `$SUMO_HOME/bin` over the `PATH`.
pub fn resolve_binary(name: &str) -> PathBuf {
    match std::env::var_os("SUMO_HOME") {
        Some(sumo_home) => {
            let mut candidate = PathBuf::from(sumo_home).join("bin").join(name);
            if cfg!(windows) {
                candidate.set_extension("exe");
            }
            if candidate.exists() {
                return candidate;
            }
            debug!("{} not found, falling back to PATH", candidate.display());
        }
        None => warn!("SUMO_HOME is not set, looking up {} on the PATH", name),
    }
    PathBuf::from(name)
}

/// Spawns one SUMO process per episode and connects to it over TraCI.
pub struct SumoLauncher {
    settings: SimulatorSettings,
    binary: PathBuf,
    sumocfg: PathBuf,
}

impl SumoLauncher {
    pub fn new(settings: &SimulatorSettings, sumocfg: &Path, gui: bool) -> Self {
        let binary_name = if gui {
            &settings.gui_binary
        } else {
            &settings.cli_binary
        };
        Self {
            settings: settings.clone(),
            binary: resolve_binary(binary_name),
            sumocfg: sumocfg.to_path_buf(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn pick_port(&self) -> Result<u16, TraciError> {
        match self.settings.port {
            Some(port) => Ok(port),
            None => {
                let listener = TcpListener::bind((self.settings.host.as_str(), 0))?;
                Ok(listener.local_addr()?.port())
            }
        }
    }

    fn command(&self, port: u16) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg("-c")
            .arg(&self.sumocfg)
            .arg("--tripinfo-output")
            .arg(&self.settings.tripinfo_output)
            .arg("--remote-port")
            .arg(port.to_string())
            .args(&self.settings.extra_args)
            .stdin(Stdio::null());
        command
    }

    fn connect(&self, port: u16, child: &mut Child) -> Result<TcpStream, TraciError> {
        let delay = Duration::from_millis(self.settings.connect_delay_ms);
        let mut last_error = None;
        for attempt in 0..self.settings.connect_attempts.max(1) {
            if let Some(status) = child.try_wait()? {
                warn!(
                    "{} exited with {} before listening on port {}",
                    self.binary.display(),
                    status,
                    port
                );
                return Err(TraciError::Launch(format!(
                    "{} exited with {} before accepting connections on port {}",
                    self.binary.display(),
                    status,
                    port
                )));
            }
            match TcpStream::connect((self.settings.host.as_str(), port)) {
                Ok(stream) => {
                    debug!("Connected to port {} after {} attempts", port, attempt + 1);
                    return Ok(stream);
                }
                Err(e) => last_error = Some(e),
            }
            thread::sleep(delay);
        }
        Err(TraciError::Launch(format!(
            "could not connect to port {}: {}",
            port,
            last_error.map_or_else(|| "no attempt made".to_string(), |e| e.to_string())
        )))
    }
}

impl Launch for SumoLauncher {
    type Control = SumoSession;

    fn launch(&mut self) -> Result<SumoSession, TraciError> {
        let port = self.pick_port()?;
        let mut child = self.command(port).spawn().map_err(|e| {
            TraciError::Launch(format!("failed to start {}: {}", self.binary.display(), e))
        })?;

        let stream = match self.connect(port, &mut child) {
            Ok(stream) => stream,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };
        stream.set_nodelay(true)?;

        let mut session = SumoSession {
            client: TraciClient::new(stream),
            child: Some(child),
        };
        let (api_version, sumo_version) = session.client.version()?;
        info!("Connected to {} (TraCI API {})", sumo_version, api_version);
        Ok(session)
    }
}

/// A running SUMO process together with its TraCI connection. The process is
/// killed if the session is dropped without being closed.
pub struct SumoSession {
    client: TraciClient<TcpStream>,
    child: Option<Child>,
}

impl TrafficControl for SumoSession {
    fn add_route(&mut self, route_id: &str, edges: &[EdgeId]) -> Result<(), TraciError> {
        self.client.add_route(route_id, edges)
    }

    fn add_vehicle(&mut self, vehicle_id: &str, route_id: &str) -> Result<(), TraciError> {
        self.client.add_vehicle(vehicle_id, route_id)
    }

    fn simulation_step(&mut self) -> Result<(), TraciError> {
        self.client.simulation_step()
    }

    fn vehicle_lane(&mut self, vehicle_id: &str) -> Result<LaneId, TraciError> {
        self.client.vehicle_lane(vehicle_id)
    }

    fn lane_edge(&mut self, lane: &LaneId) -> Result<EdgeId, TraciError> {
        self.client.lane_edge(lane)
    }

    fn change_target(&mut self, vehicle_id: &str, edge: &EdgeId) -> Result<(), TraciError> {
        self.client.change_target(vehicle_id, edge)
    }

    fn min_expected_vehicles(&mut self) -> Result<i32, TraciError> {
        self.client.min_expected_vehicles()
    }

    fn close(mut self) -> Result<(), TraciError> {
        let closed = TraciClient::close(&mut self.client);
        if let Some(mut child) = self.child.take() {
            if closed.is_err() {
                let _ = child.kill();
            }
            let status = child.wait()?;
            debug!("Simulator exited with {}", status);
        }
        closed
    }
}

impl Drop for SumoSession {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            warn!("Simulator session dropped without closing, killing the process");
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn early_exit_names_the_port() {
        let settings = SimulatorSettings {
            cli_binary: "true".to_string(),
            port: Some(47913),
            connect_attempts: 100,
            connect_delay_ms: 20,
            ..SimulatorSettings::default()
        };
        let mut launcher = SumoLauncher::new(&settings, Path::new("random.sumocfg"), false);
        match launcher.launch() {
            Err(TraciError::Launch(message)) => {
                assert!(message.contains("exited"), "{}", message);
                assert!(message.contains("47913"), "{}", message);
            }
            Err(other) => panic!("expected a launch error, got {}", other),
            Ok(_) => panic!("a process that exits at once cannot be connected to"),
        }
    }

    #[test]
    fn fixed_port_is_used_as_is() {
        let settings = SimulatorSettings {
            port: Some(8813),
            ..SimulatorSettings::default()
        };
        let launcher = SumoLauncher::new(&settings, Path::new("random.sumocfg"), false);
        assert_eq!(launcher.pick_port().expect("fixed port"), 8813);
        let command = launcher.command(8813);
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(
            args,
            vec![
                "-c",
                "random.sumocfg",
                "--tripinfo-output",
                "tripinfo.xml",
                "--remote-port",
                "8813"
            ]
        );
    }
}
