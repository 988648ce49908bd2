use anyhow::{Context, Result};
use ferry_browser::{Provisioned, SessionDriver};
use ferry_core::{ArtifactDirectory, ClientLauncher, Passcode, WorkspaceConfig};

/// Validate, clear stale session files, sign in, then start the client.
///
/// Every failure comes back unchanged apart from context; turning it into an
/// exit status is left to the caller.
pub async fn run(
    config: &WorkspaceConfig,
    passcode: &Passcode,
    driver: &SessionDriver,
    launcher: &dyn ClientLauncher,
) -> Result<Provisioned> {
    tracing::info!("Starting workspace automation...");

    config.validate().context("Configuration invalid")?;
    tracing::info!("Signing in to {} as {}", config.portal_url(), config.username());

    let downloads = ArtifactDirectory::new(config.download_dir());
    let removed = downloads
        .clean()
        .with_context(|| format!("Failed to clear {}", config.download_dir().display()))?;
    if removed > 0 {
        tracing::debug!("Cleared {} stale session file(s)", removed);
    }

    let provisioned = driver
        .run(config, passcode)
        .await
        .context("Workspace automation failed")?;

    launcher
        .launch(&provisioned.artifact)
        .context("Could not start the remote-access client")?;

    tracing::info!("Workspace automation completed successfully");
    Ok(provisioned)
}
