use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Error while preparing the log directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error while configuring the logger: {0}")]
    Config(#[from] log4rs::config::runtime::ConfigErrors),
    #[error("Error while initializing logger with config: {0}")]
    Init(#[from] log::SetLoggerError),
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LogSettings {
    pub log_path: String,
    pub log_level: String,
    pub log_file_name: String,
    pub log_overwrite: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            log_path: "Result".to_string(),
            log_level: "info".to_string(),
            log_file_name: "veer.log".to_string(),
            log_overwrite: false,
        }
    }
}

pub fn setup_logging(log_level: &str, log_file_path: PathBuf) -> Result<Config, LoggerError> {
    let log_level = get_logging_level(log_level);
    let log_file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y.%m.%d %H:%M:%S)} | {({l}):5.5} | {({f}:{L}):>40.40} - {m}{n}",
        )))
        .build(log_file_path)?;
    let console = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{({l}):5.5} {m}{n}")))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(log_file)))
        .appender(Appender::builder().build("console", Box::new(console)))
        .build(
            Root::builder()
                .appender("file")
                .appender("console")
                .build(log_level),
        )?;
    Ok(config)
}

pub fn get_logging_level(log_level: &str) -> LevelFilter {
    match log_level {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

/// Picks the log file inside `<base>/<log_path>/logs`. An existing file is removed
/// when overwriting is enabled, otherwise a timestamped name is used instead.
pub fn log_file_path(base_path: &Path, log_settings: &LogSettings) -> Result<PathBuf, LoggerError> {
    let log_path = base_path.join(&log_settings.log_path).join("logs");
    if !log_path.exists() {
        fs::create_dir_all(&log_path)?;
    }

    let log_file_path = log_path.join(&log_settings.log_file_name);
    if !log_file_path.exists() {
        return Ok(log_file_path);
    }
    if log_settings.log_overwrite {
        fs::remove_file(&log_file_path)?;
        return Ok(log_file_path);
    }

    let stamp = Utc::now().format("_%d%m%Y_%H%M%S").to_string();
    let stem = log_settings
        .log_file_name
        .split('.')
        .next()
        .unwrap_or("veer");
    Ok(log_path.join(format!("{}{}.log", stem, stamp)))
}

pub fn initiate_logger(base_path: &Path, log_settings: &LogSettings) -> Result<PathBuf, LoggerError> {
    let log_file_path = log_file_path(base_path, log_settings)?;
    let logger_config = setup_logging(&log_settings.log_level, log_file_path.clone())?;
    log4rs::init_config(logger_config)?;
    Ok(log_file_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_levels_fall_back_to_info() {
        assert_eq!(get_logging_level("debug"), LevelFilter::Debug);
        assert_eq!(get_logging_level("verbose"), LevelFilter::Info);
    }

    #[test]
    fn existing_log_file_gets_a_timestamp() {
        let base = std::env::temp_dir().join(format!("veer-log-{}", std::process::id()));
        let settings = LogSettings {
            log_path: "out".to_string(),
            ..LogSettings::default()
        };
        let first = log_file_path(&base, &settings).expect("log directory");
        fs::write(&first, "previous run").expect("seed log file");
        let second = log_file_path(&base, &settings).expect("log directory");
        let _ = fs::remove_dir_all(&base);
        assert_ne!(first, second);
        assert!(second
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("veer_")));
    }
}
