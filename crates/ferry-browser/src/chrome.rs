use crate::{Action, AutomationClient, AutomationSession, ChromeFinder, Error, Locator, ProfileManager, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Delay between element lookups while waiting for the page
const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How the browser for a run is launched
#[derive(Debug, Clone, Default)]
pub struct BrowserOptions {
    pub chrome_path: Option<PathBuf>,
    /// Named persistent profile; a throwaway one is used when unset
    pub profile: Option<String>,
    pub headless: bool,
    /// Where the browser saves downloads
    pub download_dir: PathBuf,
}

/// Opens Chrome sessions over the DevTools protocol
pub struct ChromeClient {
    options: BrowserOptions,
}

impl ChromeClient {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }

    fn profile(&self) -> Result<ProfileManager> {
        match &self.options.profile {
            Some(name) => ProfileManager::named(name),
            None => ProfileManager::temporary(),
        }
    }

    fn browser_config(&self, chrome: PathBuf, profile: &ProfileManager) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome)
            .user_data_dir(profile.path())
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        if !self.options.headless {
            builder = builder.with_head();
        }

        builder.build().map_err(Error::Browser)
    }
}

#[async_trait]
impl AutomationClient for ChromeClient {
    async fn open(&self) -> Result<Box<dyn AutomationSession>> {
        let chrome = ChromeFinder::new(self.options.chrome_path.clone()).find()?;
        let profile = self.profile()?;
        tracing::info!(
            "Launching Chrome at {} (profile: {})",
            chrome.display(),
            profile.path().display()
        );

        let config = self.browser_config(chrome, &profile)?;
        let (mut browser, mut handler) = Browser::launch(config).await?;

        // The handler must be polled for any CDP command to complete
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error (continuing): {}", e);
                }
            }
        });

        let prepared = async {
            let downloads = SetDownloadBehaviorParams::builder()
                .behavior(SetDownloadBehaviorBehavior::Allow)
                .download_path(self.options.download_dir.to_string_lossy())
                .build()
                .map_err(Error::Browser)?;
            browser.execute(downloads).await?;
            Ok::<_, Error>(browser.new_page("about:blank").await?)
        }
        .await;

        match prepared {
            Ok(page) => Ok(Box::new(ChromeSession {
                browser,
                page,
                handler_task,
                _profile: profile,
            })),
            Err(e) => {
                if let Err(close_err) = shutdown(&mut browser, handler_task).await {
                    tracing::debug!("Closing Chrome after failed setup: {}", close_err);
                }
                Err(e)
            }
        }
    }
}

struct ChromeSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    // Dropped after the browser has exited
    _profile: ProfileManager,
}

/// Whether a lookup error only means the element is not on the page yet.
///
/// The browser answered (missing node, no layout box yet); anything on the
/// transport side means the session itself is broken.
fn is_not_found(err: &CdpError) -> bool {
    matches!(
        err,
        CdpError::NotFound | CdpError::Chrome(_) | CdpError::ChromeMessage(_)
    )
}

async fn locate(page: &Page, locator: &Locator) -> Result<Option<Element>> {
    let found = match locator {
        Locator::XPath(expr) => page.find_xpath(expr.as_str()).await,
        Locator::Css(selector) => page.find_element(selector.as_str()).await,
    };
    match found {
        Ok(element) => Ok(Some(element)),
        Err(e) if is_not_found(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Poll until the element exists and has a clickable point
async fn interactable(page: &Page, locator: &Locator) -> Result<Element> {
    loop {
        if let Some(element) = locate(page, locator).await? {
            match element.clickable_point().await {
                Ok(_) => return Ok(element),
                Err(e) if is_not_found(&e) => {}
                Err(e) => return Err(e.into()),
            }
        }
        tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
    }
}

async fn shutdown(browser: &mut Browser, handler_task: JoinHandle<()>) -> Result<()> {
    let closed = browser.close().await;
    if let Err(e) = browser.wait().await {
        tracing::debug!("Waiting for Chrome to exit failed: {}", e);
    }
    handler_task.abort();

    closed?;
    Ok(())
}

#[async_trait]
impl AutomationSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| Error::Navigation(format!("{}: {}", url, e)))?;
        tracing::info!("Browser opened and navigated to {}", url);
        Ok(())
    }

    async fn perform(&mut self, locator: &Locator, action: Action<'_>, timeout: Duration) -> Result<()> {
        let element = tokio::time::timeout(timeout, interactable(&self.page, locator))
            .await
            .map_err(|_| Error::ElementNotFound {
                locator: locator.clone(),
                timeout,
            })??;

        tracing::debug!("{:?} on {}", action, locator);
        match action {
            Action::Click => {
                element.click().await?;
            }
            Action::Type(text) => {
                element.focus().await?;
                element.type_str(text).await?;
            }
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let ChromeSession {
            mut browser,
            page,
            handler_task,
            _profile,
        } = *self;
        drop(page);

        shutdown(&mut browser, handler_task).await
    }
}
