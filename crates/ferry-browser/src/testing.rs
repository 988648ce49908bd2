//! In-memory automation client for exercising the login sequence without a browser.
//!
//! ```rust,ignore
//! let client = ScriptedClient::new()
//!     .with_absent(selectors.locator(Step::InstallHandler).clone())
//!     .with_download_on(selectors.locator(Step::OpenApplication).clone(), dir.join("session.ica"));
//!
//! let driver = SessionDriver::new(Box::new(client.clone()), sequencer);
//! driver.run(&config, &passcode).await?;
//!
//! assert_eq!(client.closed_count(), 1);
//! ```

use crate::{Action, AutomationClient, AutomationSession, Error, Locator, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// One `perform` call seen by a scripted session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAction {
    pub locator: Locator,
    /// Text for typing actions, `None` for clicks
    pub typed: Option<String>,
    pub timeout: Duration,
}

#[derive(Default)]
struct Script {
    absent: HashSet<Locator>,
    failures: HashMap<Locator, String>,
    panics: HashSet<Locator>,
    downloads: HashMap<Locator, PathBuf>,
    navigation_failure: Option<String>,
    open_failure: Option<String>,
    actions: Vec<RecordedAction>,
    navigations: Vec<String>,
    opened: usize,
    closed: usize,
}

/// Automation client whose page behaviour is configured up front.
///
/// Clones share state, so a test can keep one handle for assertions and give
/// another to the code under test.
#[derive(Clone, Default)]
pub struct ScriptedClient {
    script: Arc<Mutex<Script>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// `locator` never becomes interactable
    pub fn with_absent(self, locator: Locator) -> Self {
        self.lock().absent.insert(locator);
        self
    }

    /// Acting on `locator` fails with a browser error
    pub fn with_failure(self, locator: Locator, message: &str) -> Self {
        self.lock().failures.insert(locator, message.to_string());
        self
    }

    /// Acting on `locator` panics
    pub fn with_panic_on(self, locator: Locator) -> Self {
        self.lock().panics.insert(locator);
        self
    }

    /// Acting on `locator` writes a session file at `path`, as the portal's download would
    pub fn with_download_on(self, locator: Locator, path: PathBuf) -> Self {
        self.lock().downloads.insert(locator, path);
        self
    }

    pub fn with_navigation_failure(self, message: &str) -> Self {
        self.lock().navigation_failure = Some(message.to_string());
        self
    }

    pub fn with_open_failure(self, message: &str) -> Self {
        self.lock().open_failure = Some(message.to_string());
        self
    }

    pub fn actions(&self) -> Vec<RecordedAction> {
        self.lock().actions.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    pub fn opened_count(&self) -> usize {
        self.lock().opened
    }

    pub fn closed_count(&self) -> usize {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        // A panicking scripted step poisons the lock; the state is still usable
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl AutomationClient for ScriptedClient {
    async fn open(&self) -> Result<Box<dyn AutomationSession>> {
        let mut script = self.lock();
        if let Some(message) = &script.open_failure {
            return Err(Error::Browser(message.clone()));
        }
        script.opened += 1;

        Ok(Box::new(ScriptedSession {
            client: self.clone(),
        }))
    }
}

struct ScriptedSession {
    client: ScriptedClient,
}

#[async_trait]
impl AutomationSession for ScriptedSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let mut script = self.client.lock();
        if let Some(message) = &script.navigation_failure {
            return Err(Error::Navigation(format!("{}: {}", url, message)));
        }
        script.navigations.push(url.to_string());
        Ok(())
    }

    async fn perform(&mut self, locator: &Locator, action: Action<'_>, timeout: Duration) -> Result<()> {
        let (should_panic, download) = {
            let mut script = self.client.lock();
            script.actions.push(RecordedAction {
                locator: locator.clone(),
                typed: match action {
                    Action::Type(text) => Some(text.to_string()),
                    Action::Click => None,
                },
                timeout,
            });

            if script.absent.contains(locator) {
                return Err(Error::ElementNotFound {
                    locator: locator.clone(),
                    timeout,
                });
            }
            if let Some(message) = script.failures.get(locator) {
                return Err(Error::Browser(message.clone()));
            }
            (script.panics.contains(locator), script.downloads.get(locator).cloned())
        };

        if should_panic {
            panic!("scripted panic on {}", locator);
        }
        if let Some(path) = download {
            std::fs::write(path, "[WFClient]\nVersion=2\n")?;
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.client.lock().closed += 1;
        Ok(())
    }
}
