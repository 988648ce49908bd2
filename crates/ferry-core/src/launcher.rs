use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Hands a session file to the remote-access client
pub trait ClientLauncher: Send + Sync {
    /// Start the client for `artifact` and return without waiting on it
    fn launch(&self, artifact: &Path) -> Result<()>;
}

/// Spawns the client binary as a detached process with the session file as its only argument
#[derive(Debug, Clone)]
pub struct DetachedLauncher {
    client_path: PathBuf,
}

impl DetachedLauncher {
    pub fn new(client_path: impl Into<PathBuf>) -> Self {
        Self {
            client_path: client_path.into(),
        }
    }

    fn command(&self, artifact: &Path) -> Command {
        let mut command = Command::new(&self.client_path);
        command
            .arg(artifact)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // Own process group so the client outlives a Ctrl+C aimed at us
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        command
    }
}

impl ClientLauncher for DetachedLauncher {
    fn launch(&self, artifact: &Path) -> Result<()> {
        tracing::info!(
            "Starting {} with session file {}",
            self.client_path.display(),
            artifact.display()
        );

        let child = self.command(artifact).spawn().map_err(|e| {
            Error::Launch(format!("{}: {}", self.client_path.display(), e))
        })?;

        tracing::debug!("Remote-access client running as pid {}", child.id());
        Ok(())
    }
}
