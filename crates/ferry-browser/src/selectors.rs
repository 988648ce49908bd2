use crate::{Locator, Step};

/// Workspace tile opened when none is configured
pub const DEFAULT_WORKSPACE: &str = "CDC2";

/// Where each step of the login sequence finds its element on the portal
#[derive(Debug, Clone)]
pub struct SelectorMap {
    login: Locator,
    password: Locator,
    passcode: Locator,
    submit: Locator,
    install_handler: Locator,
    detect_handler: Locator,
    disclaimer: Locator,
    workspace: Locator,
    open: Locator,
}

impl SelectorMap {
    /// The portal's locators, with the store tile matched by `workspace` name
    pub fn for_workspace(workspace: &str) -> Self {
        Self {
            login: Locator::xpath(r#"//*[@id="login"]"#),
            password: Locator::xpath(r#"(//input[@type="password"])[1]"#),
            passcode: Locator::xpath(r#"(//input[@type="password"])[2]"#),
            submit: Locator::xpath(r#"//*[@id="loginBtn"]"#),
            install_handler: Locator::xpath(r#"//*[@id="protocolhandler-welcome-installButton"]"#),
            detect_handler: Locator::xpath(r#"//*[@id="protocolhandler-detect-alreadyInstalledLink"]"#),
            disclaimer: Locator::xpath(r#"//*[@id="jpmcAcceptDisclaimerBtn"]"#),
            workspace: Locator::xpath(format!(
                r#"//*[@class="storeapp-name" and contains(text(),{})]"#,
                xpath_literal(workspace)
            )),
            open: Locator::xpath(
                r#"//*[@class="theme-highlight-color appDetails-actions-text" and contains(text(),"Open")]"#,
            ),
        }
    }

    pub fn locator(&self, step: Step) -> &Locator {
        match step {
            Step::EnterUsername => &self.login,
            Step::EnterPassword => &self.password,
            Step::EnterPasscode => &self.passcode,
            Step::SubmitLogin => &self.submit,
            Step::InstallHandler => &self.install_handler,
            Step::DetectHandler => &self.detect_handler,
            Step::AcceptDisclaimer => &self.disclaimer,
            Step::SelectWorkspace => &self.workspace,
            Step::OpenApplication => &self.open,
        }
    }
}

impl Default for SelectorMap {
    fn default() -> Self {
        Self::for_workspace(DEFAULT_WORKSPACE)
    }
}

/// Quote `value` as an XPath 1.0 string literal
fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        format!("\"{}\"", value)
    } else if !value.contains('\'') {
        format!("'{}'", value)
    } else {
        let parts: Vec<String> = value
            .split('"')
            .map(|part| format!("\"{}\"", part))
            .collect();
        format!("concat({})", parts.join(r#", '"', "#))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_workspace_tile() {
        let selectors = SelectorMap::default();

        assert_eq!(
            selectors.locator(Step::SelectWorkspace),
            &Locator::xpath(r#"//*[@class="storeapp-name" and contains(text(),"CDC2")]"#)
        );
    }

    #[test]
    fn test_passcode_is_second_password_field() {
        let selectors = SelectorMap::default();

        assert_eq!(
            selectors.locator(Step::EnterPasscode),
            &Locator::xpath(r#"(//input[@type="password"])[2]"#)
        );
    }

    #[test]
    fn test_every_step_has_distinct_locator() {
        let selectors = SelectorMap::default();
        let mut seen = std::collections::HashSet::new();

        for step in Step::ALL {
            assert!(seen.insert(selectors.locator(step).clone()), "duplicate for {}", step);
        }
    }

    #[test]
    fn test_xpath_literal_quoting() {
        assert_eq!(xpath_literal("CDC2"), r#""CDC2""#);
        assert_eq!(xpath_literal(r#"say "hi""#), r#"'say "hi"'"#);
        assert_eq!(
            xpath_literal(r#"it's "x""#),
            r#"concat("it's ", '"', "x", '"', "")"#
        );
    }
}
