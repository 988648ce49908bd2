use crate::{AutomationClient, AutomationSession, Result, SequenceReport, StepSequencer};
use ferry_core::artifacts::{DEFAULT_ACQUISITION_TIMEOUT, DEFAULT_POLL_INTERVAL};
use ferry_core::{ArtifactDirectory, Passcode, WorkspaceConfig};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::time::Duration;

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub artifact: PathBuf,
    pub report: SequenceReport,
}

/// Owns one automation session from open to close
pub struct SessionDriver {
    client: Box<dyn AutomationClient>,
    sequencer: StepSequencer,
    acquisition_timeout: Duration,
    poll_interval: Duration,
}

impl SessionDriver {
    pub fn new(client: Box<dyn AutomationClient>, sequencer: StepSequencer) -> Self {
        Self {
            client,
            sequencer,
            acquisition_timeout: DEFAULT_ACQUISITION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_acquisition_timeout(mut self, timeout: Duration) -> Self {
        self.acquisition_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Log in, open the workspace and wait for its session file.
    ///
    /// The session is closed before this returns on every path, including a
    /// panic inside the sequence, which is resumed after the close.
    pub async fn run(&self, config: &WorkspaceConfig, passcode: &Passcode) -> Result<Provisioned> {
        let mut session = self.client.open().await?;

        let outcome = AssertUnwindSafe(self.drive(session.as_mut(), config, passcode))
            .catch_unwind()
            .await;

        match session.close().await {
            Ok(()) => tracing::info!("Browser closed"),
            Err(e) => tracing::warn!("Browser did not close cleanly: {}", e),
        }

        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn drive(
        &self,
        session: &mut dyn AutomationSession,
        config: &WorkspaceConfig,
        passcode: &Passcode,
    ) -> Result<Provisioned> {
        session.navigate(config.portal_url()).await?;

        let report = self.sequencer.run(session, config, passcode).await?;
        tracing::info!("Workspace launch requested");

        let artifact = ArtifactDirectory::new(config.download_dir())
            .with_poll_interval(self.poll_interval)
            .await_artifact(self.acquisition_timeout)
            .await?;

        Ok(Provisioned { artifact, report })
    }
}
