use clap::Parser;
use ferry_browser::{StepTimeouts, DEFAULT_WORKSPACE};
use ferry_cli::commands::connect::{self, ConnectOptions};
use ferry_core::config::{default_download_dir, DEFAULT_CLIENT_PATH, DEFAULT_PORTAL_URL};
use ferry_core::{Passcode, WorkspaceConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "ferry")]
#[command(author, version)]
#[command(
    about = "Sign in to the workspace portal and launch the remote-access client",
    long_about = "Ferry logs in to the workspace portal with your credentials and one-time passcode, \
                  opens the configured application tile, waits for the downloaded .ica session file \
                  and hands it to the Citrix client."
)]
struct Cli {
    /// One-time passcode from your token
    #[arg(value_name = "PASSCODE")]
    passcode: String,

    /// Portal username
    #[arg(long, env = "JPM_USER")]
    user: Option<String>,

    /// Portal password
    #[arg(long, env = "JPM_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Portal URL
    #[arg(long, default_value = DEFAULT_PORTAL_URL)]
    url: String,

    /// Directory the browser downloads session files into [default: your Downloads folder]
    #[arg(long, value_name = "DIR")]
    download_dir: Option<PathBuf>,

    /// Remote-access client launched with the session file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CLIENT_PATH)]
    client_path: PathBuf,

    /// Name of the application tile to open
    #[arg(long, default_value = DEFAULT_WORKSPACE)]
    workspace: String,

    /// Path to the Chrome binary
    #[arg(long, value_name = "PATH")]
    chrome_path: Option<PathBuf>,

    /// Reuse a named browser profile under ~/.ferry/profiles instead of a temporary one
    #[arg(long, value_name = "NAME")]
    profile: Option<String>,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,

    /// Seconds to wait for each required page element
    #[arg(long, value_name = "SECS", default_value_t = 20)]
    step_timeout: u64,

    /// Seconds to wait for optional first-run prompts
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    optional_step_timeout: u64,

    /// Seconds to wait for the session file to download
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    download_timeout: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_options(self) -> ConnectOptions {
        let config = WorkspaceConfig::new(
            self.user.unwrap_or_default(),
            self.password.unwrap_or_default(),
        )
        .with_portal_url(self.url)
        .with_download_dir(self.download_dir.unwrap_or_else(default_download_dir))
        .with_client_path(self.client_path);

        ConnectOptions {
            config,
            passcode: Passcode::new(self.passcode),
            workspace: self.workspace,
            chrome_path: self.chrome_path,
            profile: self.profile,
            headless: self.headless,
            timeouts: StepTimeouts {
                mandatory: Duration::from_secs(self.step_timeout),
                best_effort: Duration::from_secs(self.optional_step_timeout),
            },
            download_timeout: Duration::from_secs(self.download_timeout),
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not failures
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(cli.verbose);

    match connect::execute(cli.into_options()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("ferry=debug,ferry_cli=debug,ferry_core=debug,ferry_browser=debug")
    } else {
        EnvFilter::new("ferry=info,ferry_cli=info,ferry_core=info,ferry_browser=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
