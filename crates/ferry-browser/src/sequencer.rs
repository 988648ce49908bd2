//! The portal login sequence.
//!
//! Steps run in a fixed order. Mandatory steps must find their element or the
//! whole sequence is abandoned; best-effort steps model first-run prompts
//! (protocol handler install, disclaimer) that are simply gone on later runs,
//! so a missing element there is recorded as [`StepOutcome::Skipped`].

use crate::{Action, AutomationSession, Error, Result, SelectorMap};
use ferry_core::{Passcode, WorkspaceConfig};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    EnterUsername,
    EnterPassword,
    EnterPasscode,
    SubmitLogin,
    InstallHandler,
    DetectHandler,
    AcceptDisclaimer,
    SelectWorkspace,
    OpenApplication,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Mandatory,
    BestEffort,
}

/// Progress through the portal, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SequenceState {
    Start,
    LoggedIn,
    HandlersConfigured,
    WorkspaceSelected,
    WorkspaceOpened,
}

impl Step {
    pub const ALL: [Step; 9] = [
        Step::EnterUsername,
        Step::EnterPassword,
        Step::EnterPasscode,
        Step::SubmitLogin,
        Step::InstallHandler,
        Step::DetectHandler,
        Step::AcceptDisclaimer,
        Step::SelectWorkspace,
        Step::OpenApplication,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Step::EnterUsername => "enter username",
            Step::EnterPassword => "enter password",
            Step::EnterPasscode => "enter passcode",
            Step::SubmitLogin => "submit login",
            Step::InstallHandler => "install handler",
            Step::DetectHandler => "detect handler",
            Step::AcceptDisclaimer => "accept disclaimer",
            Step::SelectWorkspace => "select workspace tile",
            Step::OpenApplication => "open application",
        }
    }

    pub fn requirement(&self) -> Requirement {
        match self {
            Step::InstallHandler | Step::DetectHandler | Step::AcceptDisclaimer => {
                Requirement::BestEffort
            }
            _ => Requirement::Mandatory,
        }
    }

    /// State reached once this step is done, if it closes a phase
    pub fn completes(&self) -> Option<SequenceState> {
        match self {
            Step::SubmitLogin => Some(SequenceState::LoggedIn),
            Step::AcceptDisclaimer => Some(SequenceState::HandlersConfigured),
            Step::SelectWorkspace => Some(SequenceState::WorkspaceSelected),
            Step::OpenApplication => Some(SequenceState::WorkspaceOpened),
            _ => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How long each kind of step waits for its element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTimeouts {
    pub mandatory: Duration,
    pub best_effort: Duration,
}

impl StepTimeouts {
    pub fn for_step(&self, step: Step) -> Duration {
        match step.requirement() {
            Requirement::Mandatory => self.mandatory,
            Requirement::BestEffort => self.best_effort,
        }
    }
}

impl Default for StepTimeouts {
    fn default() -> Self {
        Self {
            mandatory: Duration::from_secs(20),
            best_effort: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Performed,
    Skipped,
}

/// What happened on a completed sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceReport {
    pub outcomes: Vec<(Step, StepOutcome)>,
    pub state: SequenceState,
}

impl SequenceReport {
    pub fn skipped(&self) -> impl Iterator<Item = Step> + '_ {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == StepOutcome::Skipped)
            .map(|(step, _)| *step)
    }
}

/// Drives an [`AutomationSession`] through the login sequence
#[derive(Debug, Clone)]
pub struct StepSequencer {
    selectors: SelectorMap,
    timeouts: StepTimeouts,
}

impl StepSequencer {
    pub fn new(selectors: SelectorMap, timeouts: StepTimeouts) -> Self {
        Self {
            selectors,
            timeouts,
        }
    }

    pub async fn run(
        &self,
        session: &mut dyn AutomationSession,
        config: &WorkspaceConfig,
        passcode: &Passcode,
    ) -> Result<SequenceReport> {
        tracing::info!("Starting login sequence...");
        let mut state = SequenceState::Start;
        let mut outcomes = Vec::with_capacity(Step::ALL.len());

        for step in Step::ALL {
            let action = match step {
                Step::EnterUsername => Action::Type(config.username()),
                Step::EnterPassword => Action::Type(config.secret()),
                Step::EnterPasscode => Action::Type(passcode.expose()),
                _ => Action::Click,
            };

            let outcome = self.run_step(session, step, action).await?;
            outcomes.push((step, outcome));

            if let Some(next) = step.completes() {
                tracing::info!("{:?} -> {:?}", state, next);
                state = next;
            }
        }

        Ok(SequenceReport { outcomes, state })
    }

    async fn run_step(
        &self,
        session: &mut dyn AutomationSession,
        step: Step,
        action: Action<'_>,
    ) -> Result<StepOutcome> {
        let locator = self.selectors.locator(step);
        let timeout = self.timeouts.for_step(step);
        tracing::debug!("Step '{}': waiting up to {:?} for {}", step, timeout, locator);

        match (session.perform(locator, action, timeout).await, step.requirement()) {
            (Ok(()), _) => Ok(StepOutcome::Performed),
            (Err(Error::ElementNotFound { .. }), Requirement::BestEffort) => {
                tracing::debug!("Step '{}' not offered by the portal, skipping", step);
                Ok(StepOutcome::Skipped)
            }
            (Err(e), Requirement::Mandatory) => Err(Error::MandatoryStep {
                step: step.name(),
                source: Box::new(e),
            }),
            (Err(e), Requirement::BestEffort) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordedAction, ScriptedClient};
    use crate::AutomationClient;

    fn fixture() -> (WorkspaceConfig, Passcode, SelectorMap, StepSequencer) {
        let config = WorkspaceConfig::new("alice", "hunter2");
        let selectors = SelectorMap::default();
        let sequencer = StepSequencer::new(selectors.clone(), StepTimeouts::default());
        (config, Passcode::new("123456"), selectors, sequencer)
    }

    #[test]
    fn test_step_classification() {
        let best_effort: Vec<_> = Step::ALL
            .into_iter()
            .filter(|s| s.requirement() == Requirement::BestEffort)
            .collect();

        assert_eq!(
            best_effort,
            vec![Step::InstallHandler, Step::DetectHandler, Step::AcceptDisclaimer]
        );
    }

    #[test]
    fn test_timeouts_follow_requirement() {
        let timeouts = StepTimeouts::default();

        assert_eq!(timeouts.for_step(Step::SubmitLogin), Duration::from_secs(20));
        assert_eq!(timeouts.for_step(Step::DetectHandler), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_all_steps_performed_in_order() {
        let (config, passcode, selectors, sequencer) = fixture();
        let client = ScriptedClient::new();
        let mut session = client.open().await.unwrap();

        let report = sequencer.run(session.as_mut(), &config, &passcode).await.unwrap();

        assert_eq!(report.state, SequenceState::WorkspaceOpened);
        assert_eq!(report.skipped().count(), 0);

        let actions = client.actions();
        let locators: Vec<_> = actions.iter().map(|a| a.locator.clone()).collect();
        let expected: Vec<_> = Step::ALL.iter().map(|s| selectors.locator(*s).clone()).collect();
        assert_eq!(locators, expected);
    }

    #[tokio::test]
    async fn test_credentials_typed_into_their_fields() {
        let (config, passcode, selectors, sequencer) = fixture();
        let client = ScriptedClient::new();
        let mut session = client.open().await.unwrap();

        sequencer.run(session.as_mut(), &config, &passcode).await.unwrap();

        let typed: Vec<_> = client
            .actions()
            .into_iter()
            .filter_map(|a| a.typed.map(|text| (a.locator, text)))
            .collect();
        assert_eq!(
            typed,
            vec![
                (selectors.locator(Step::EnterUsername).clone(), "alice".to_string()),
                (selectors.locator(Step::EnterPassword).clone(), "hunter2".to_string()),
                (selectors.locator(Step::EnterPasscode).clone(), "123456".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_absent_best_effort_steps_are_skipped() {
        let (config, passcode, selectors, sequencer) = fixture();
        let client = ScriptedClient::new()
            .with_absent(selectors.locator(Step::InstallHandler).clone())
            .with_absent(selectors.locator(Step::DetectHandler).clone())
            .with_absent(selectors.locator(Step::AcceptDisclaimer).clone());
        let mut session = client.open().await.unwrap();

        let report = sequencer.run(session.as_mut(), &config, &passcode).await.unwrap();

        assert_eq!(report.state, SequenceState::WorkspaceOpened);
        assert_eq!(
            report.skipped().collect::<Vec<_>>(),
            vec![Step::InstallHandler, Step::DetectHandler, Step::AcceptDisclaimer]
        );
        let last = client.actions().pop().unwrap();
        assert_eq!(last.locator, *selectors.locator(Step::OpenApplication));
    }

    #[tokio::test]
    async fn test_best_effort_steps_use_short_timeout() {
        let (config, passcode, selectors, sequencer) = fixture();
        let client = ScriptedClient::new();
        let mut session = client.open().await.unwrap();

        sequencer.run(session.as_mut(), &config, &passcode).await.unwrap();

        let install: Vec<RecordedAction> = client
            .actions()
            .into_iter()
            .filter(|a| a.locator == *selectors.locator(Step::InstallHandler))
            .collect();
        assert_eq!(install[0].timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_absent_mandatory_step_aborts() {
        let (config, passcode, selectors, sequencer) = fixture();
        let client = ScriptedClient::new().with_absent(selectors.locator(Step::SelectWorkspace).clone());
        let mut session = client.open().await.unwrap();

        let err = sequencer
            .run(session.as_mut(), &config, &passcode)
            .await
            .unwrap_err();

        match err {
            Error::MandatoryStep { step, source } => {
                assert_eq!(step, "select workspace tile");
                assert!(matches!(*source, Error::ElementNotFound { .. }));
            }
            other => panic!("expected MandatoryStep, got {:?}", other),
        }
        // Nothing after the failed step is attempted
        assert!(
            client
                .actions()
                .iter()
                .all(|a| a.locator != *selectors.locator(Step::OpenApplication))
        );
    }

    #[tokio::test]
    async fn test_unexpected_best_effort_error_propagates() {
        let (config, passcode, selectors, sequencer) = fixture();
        let client = ScriptedClient::new()
            .with_failure(selectors.locator(Step::AcceptDisclaimer).clone(), "target crashed");
        let mut session = client.open().await.unwrap();

        let err = sequencer
            .run(session.as_mut(), &config, &passcode)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Browser(ref message) if message == "target crashed"));
    }
}
