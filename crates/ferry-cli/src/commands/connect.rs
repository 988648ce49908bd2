use crate::orchestrator;
use anyhow::Result;
use ferry_browser::{
    BrowserOptions, ChromeClient, SelectorMap, SessionDriver, StepSequencer, StepTimeouts,
};
use ferry_core::{DetachedLauncher, Passcode, WorkspaceConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Everything the `ferry` command line resolves to
#[derive(Debug)]
pub struct ConnectOptions {
    pub config: WorkspaceConfig,
    pub passcode: Passcode,
    pub workspace: String,
    pub chrome_path: Option<PathBuf>,
    pub profile: Option<String>,
    pub headless: bool,
    pub timeouts: StepTimeouts,
    pub download_timeout: Duration,
}

pub fn execute(options: ConnectOptions) -> Result<PathBuf> {
    let ConnectOptions {
        config,
        passcode,
        workspace,
        chrome_path,
        profile,
        headless,
        timeouts,
        download_timeout,
    } = options;

    let client = ChromeClient::new(BrowserOptions {
        chrome_path,
        profile,
        headless,
        download_dir: config.download_dir().to_path_buf(),
    });
    let sequencer = StepSequencer::new(SelectorMap::for_workspace(&workspace), timeouts);
    let driver = SessionDriver::new(Box::new(client), sequencer)
        .with_acquisition_timeout(download_timeout);
    let launcher = DetachedLauncher::new(config.client_path());

    // One session, one step at a time
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let provisioned = runtime.block_on(orchestrator::run(&config, &passcode, &driver, &launcher))?;

    for step in provisioned.report.skipped() {
        println!("⏭️  Portal did not ask to {}", step);
    }
    println!("📄 Session file: {}", provisioned.artifact.display());
    println!("🚀 Started {}", config.client_path().display());

    Ok(provisioned.artifact)
}
