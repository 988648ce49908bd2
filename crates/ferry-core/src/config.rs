use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Portal the login sequence is driven against
pub const DEFAULT_PORTAL_URL: &str = "http://myworkspace.jpmchase.com";

/// Citrix Workspace launcher shipped with the Linux ICA client
pub const DEFAULT_CLIENT_PATH: &str = "/opt/Citrix/ICAClient/wfica.sh";

/// Settings for one provisioning run.
///
/// Built once at startup and handed around by reference; nothing below the
/// CLI reads the process environment.
#[derive(Clone)]
pub struct WorkspaceConfig {
    username: String,
    secret: String,
    portal_url: String,
    download_dir: PathBuf,
    client_path: PathBuf,
}

impl WorkspaceConfig {
    /// Create a config with the default portal, download directory and client path
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
            portal_url: DEFAULT_PORTAL_URL.to_string(),
            download_dir: default_download_dir(),
            client_path: PathBuf::from(DEFAULT_CLIENT_PATH),
        }
    }

    pub fn with_portal_url(mut self, url: impl Into<String>) -> Self {
        self.portal_url = url.into();
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn with_client_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.client_path = path.into();
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn portal_url(&self) -> &str {
        &self.portal_url
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn client_path(&self) -> &Path {
        &self.client_path
    }

    /// Check credentials, portal URL and the client binary before anything is opened
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() || self.secret.is_empty() {
            return Err(Error::MissingCredentials);
        }

        Url::parse(&self.portal_url).map_err(|e| Error::InvalidUrl {
            url: self.portal_url.clone(),
            reason: e.to_string(),
        })?;

        if !self.client_path.exists() {
            return Err(Error::MissingDependency(self.client_path.clone()));
        }

        tracing::debug!(
            "Configuration valid for user {} (client: {})",
            self.username,
            self.client_path.display()
        );
        Ok(())
    }
}

impl fmt::Debug for WorkspaceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkspaceConfig")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .field("portal_url", &self.portal_url)
            .field("download_dir", &self.download_dir)
            .field("client_path", &self.client_path)
            .finish()
    }
}

/// One-time code typed into the second password field.
///
/// Lives for a single run and is never written anywhere.
#[derive(Clone)]
pub struct Passcode(String);

impl Passcode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Passcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passcode(<redacted>)")
    }
}

/// The user's download directory, or `~/Downloads` when the platform has none
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("Downloads"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_client() -> (tempfile::NamedTempFile, WorkspaceConfig) {
        let client = tempfile::NamedTempFile::new().unwrap();
        let config = WorkspaceConfig::new("alice", "hunter2").with_client_path(client.path());
        (client, config)
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        let (_client, config) = config_with_client();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_username() {
        let client = tempfile::NamedTempFile::new().unwrap();
        let config = WorkspaceConfig::new("", "hunter2").with_client_path(client.path());

        assert!(matches!(config.validate(), Err(Error::MissingCredentials)));
    }

    #[test]
    fn test_validate_rejects_empty_secret() {
        let client = tempfile::NamedTempFile::new().unwrap();
        let config = WorkspaceConfig::new("alice", "").with_client_path(client.path());

        assert!(matches!(config.validate(), Err(Error::MissingCredentials)));
    }

    #[test]
    fn test_credentials_checked_before_client_path() {
        let config = WorkspaceConfig::new("", "").with_client_path("/nonexistent/wfica.sh");

        assert!(matches!(config.validate(), Err(Error::MissingCredentials)));
    }

    #[test]
    fn test_validate_rejects_missing_client() {
        let config = WorkspaceConfig::new("alice", "hunter2").with_client_path("/nonexistent/wfica.sh");

        match config.validate() {
            Err(Error::MissingDependency(path)) => {
                assert_eq!(path, PathBuf::from("/nonexistent/wfica.sh"));
            }
            other => panic!("expected MissingDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_malformed_url() {
        let (_client, config) = config_with_client();
        let config = config.with_portal_url("not a url");

        assert!(matches!(config.validate(), Err(Error::InvalidUrl { .. })));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = WorkspaceConfig::new("alice", "hunter2");
        let rendered = format!("{:?}", config);

        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_passcode_debug_is_redacted() {
        let passcode = Passcode::new("123456");

        assert_eq!(passcode.expose(), "123456");
        assert!(!format!("{:?}", passcode).contains("123456"));
    }

    #[test]
    fn test_defaults() {
        let config = WorkspaceConfig::new("alice", "hunter2");

        assert_eq!(config.portal_url(), DEFAULT_PORTAL_URL);
        assert_eq!(config.client_path(), Path::new(DEFAULT_CLIENT_PATH));
    }
}
