use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraciError {
    #[error("Connection to the simulator failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unexpected TraCI data: {0}")]
    Protocol(String),
    #[error("Command 0x{command:02x} failed: {message}")]
    CommandFailed { command: u8, message: String },
    #[error("Command 0x{command:02x} is not implemented by the simulator: {message}")]
    NotImplemented { command: u8, message: String },
    #[error("Failed to launch the simulator: {0}")]
    Launch(String),
}

impl TraciError {
    /// The simulator understood the request but refused it, e.g. because the
    /// referenced object does not exist (any more).
    pub fn is_command_failure(&self) -> bool {
        matches!(self, TraciError::CommandFailed { .. })
    }
}
