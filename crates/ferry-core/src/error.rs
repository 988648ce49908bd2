use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing credentials: JPM_USER and JPM_PASSWORD must both be set")]
    MissingCredentials,

    #[error("Remote-access client not found at: {}", .0.display())]
    MissingDependency(PathBuf),

    #[error("Invalid portal URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Timed out after {}s waiting for a session file in {}", .timeout.as_secs(), .directory.display())]
    AcquisitionTimeout {
        directory: PathBuf,
        timeout: Duration,
    },

    #[error("Failed to launch remote-access client: {0}")]
    Launch(String),

    #[error("Invalid artifact pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
