//! Error types for the standalone runner.

use chatsim_server::ServerError;

/// Errors that end the runner.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// The simulated instance failed to start.
    #[error("server error: {0}")]
    Server(#[from] ServerError),

    /// Waiting for the interrupt signal failed.
    #[error("signal error: {0}")]
    Signal(#[from] std::io::Error),
}
