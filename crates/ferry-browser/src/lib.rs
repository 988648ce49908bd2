mod automation;
mod chrome;
mod chrome_finder;
mod driver;
mod error;
mod profile;
mod selectors;
mod sequencer;
pub mod testing;

pub use automation::{Action, AutomationClient, AutomationSession, Locator};
pub use chrome::{BrowserOptions, ChromeClient};
pub use chrome_finder::ChromeFinder;
pub use driver::{Provisioned, SessionDriver};
pub use error::{Error, Result};
pub use profile::ProfileManager;
pub use selectors::{SelectorMap, DEFAULT_WORKSPACE};
pub use sequencer::{
    Requirement, SequenceReport, SequenceState, Step, StepOutcome, StepSequencer, StepTimeouts,
};
