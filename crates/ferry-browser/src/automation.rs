//! The capability the login sequence is written against.
//!
//! [`ChromeClient`](crate::ChromeClient) drives a real browser over CDP;
//! [`testing::ScriptedClient`](crate::testing::ScriptedClient) plays one back
//! from memory.

use crate::Result;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// How an element is found on the page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    XPath(String),
    Css(String),
}

impl Locator {
    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::XPath(expr.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::XPath(expr) => write!(f, "xpath={}", expr),
            Locator::Css(selector) => write!(f, "css={}", selector),
        }
    }
}

/// What to do with an element once it is interactable
#[derive(Clone, Copy)]
pub enum Action<'a> {
    Click,
    Type(&'a str),
}

// Typed text is usually a credential, so only its length is shown
impl fmt::Debug for Action<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Click => f.write_str("Click"),
            Action::Type(text) => write!(f, "Type({} chars)", text.chars().count()),
        }
    }
}

/// Opens automation sessions
#[async_trait]
pub trait AutomationClient: Send + Sync {
    /// Start a fresh browser context
    async fn open(&self) -> Result<Box<dyn AutomationSession>>;
}

/// A live browser context, owned by whoever opened it
#[async_trait]
pub trait AutomationSession: Send {
    /// Load `url` in the session's page
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Wait up to `timeout` for `locator` to become interactable, then act on it.
    ///
    /// Fails with [`Error::ElementNotFound`](crate::Error::ElementNotFound)
    /// when the wait runs out.
    async fn perform(&mut self, locator: &Locator, action: Action<'_>, timeout: Duration)
        -> Result<()>;

    /// Shut the context down
    async fn close(self: Box<Self>) -> Result<()>;
}
