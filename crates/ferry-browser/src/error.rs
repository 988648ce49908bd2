use crate::Locator;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Element {locator} not interactable within {}s", .timeout.as_secs_f32())]
    ElementNotFound { locator: Locator, timeout: Duration },

    #[error("Step '{step}' failed: {source}")]
    MandatoryStep {
        step: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("CDP error: {0}")]
    Cdp(String),

    #[error(transparent)]
    Core(#[from] ferry_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Cdp(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
