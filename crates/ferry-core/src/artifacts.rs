use crate::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

/// Extension of the session descriptor the portal hands out
pub const ARTIFACT_EXTENSION: &str = "ica";

/// How often the download directory is re-scanned
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How long to wait for the portal's download to show up
pub const DEFAULT_ACQUISITION_TIMEOUT: Duration = Duration::from_secs(60);

/// A directory the portal downloads session files into
#[derive(Debug, Clone)]
pub struct ArtifactDirectory {
    path: PathBuf,
    extension: String,
    poll_interval: Duration,
}

impl ArtifactDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            extension: ARTIFACT_EXTENSION.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove every session file left over from earlier runs.
    ///
    /// Files that vanish between listing and removal are ignored. Returns the
    /// number of files removed.
    pub fn clean(&self) -> Result<usize> {
        let mut removed = 0;

        for file in self.matching_files()? {
            match std::fs::remove_file(&file) {
                Ok(()) => {
                    tracing::info!("Removed stale session file: {}", file.display());
                    removed += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!("Session file already gone: {}", file.display());
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }

        Ok(removed)
    }

    /// Look once for a session file, returning the first in lexicographic order
    pub fn find(&self) -> Result<Option<PathBuf>> {
        Ok(self.matching_files()?.into_iter().next())
    }

    /// Poll until a session file appears or `timeout` elapses.
    ///
    /// A timeout too large to represent as a deadline waits indefinitely.
    pub async fn await_artifact(&self, timeout: Duration) -> Result<PathBuf> {
        tracing::info!("Waiting for session file in {}...", self.path.display());
        let deadline = Instant::now().checked_add(timeout);

        loop {
            if let Some(file) = self.find()? {
                tracing::info!("Found session file: {}", file.display());
                return Ok(file);
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(self.timeout_error(timeout));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn timeout_error(&self, timeout: Duration) -> Error {
        Error::AcquisitionTimeout {
            directory: self.path.clone(),
            timeout,
        }
    }

    /// Regular files with the artifact extension, sorted by glob
    fn matching_files(&self) -> Result<Vec<PathBuf>> {
        let pattern = format!(
            "{}/*.{}",
            glob::Pattern::escape(&self.path.to_string_lossy()),
            self.extension
        );

        let files = glob::glob(&pattern)?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "[ApplicationServers]\n").unwrap();
        path
    }

    fn fast(dir: &Path) -> ArtifactDirectory {
        ArtifactDirectory::new(dir).with_poll_interval(Duration::from_millis(20))
    }

    #[test]
    fn test_clean_empty_directory() {
        let temp = tempfile::tempdir().unwrap();
        let artifacts = fast(temp.path());

        assert_eq!(artifacts.clean().unwrap(), 0);
        assert!(artifacts.find().unwrap().is_none());
    }

    #[test]
    fn test_clean_removes_single_file() {
        let temp = tempfile::tempdir().unwrap();
        let stale = touch(temp.path(), "launch.ica");
        let artifacts = fast(temp.path());

        assert_eq!(artifacts.clean().unwrap(), 1);
        assert!(!stale.exists());
    }

    #[test]
    fn test_clean_removes_many_and_keeps_others() {
        let temp = tempfile::tempdir().unwrap();
        for i in 0..5 {
            touch(temp.path(), &format!("session-{}.ica", i));
        }
        let unrelated = touch(temp.path(), "report.pdf");
        let partial = touch(temp.path(), "launch.ica.crdownload");
        let artifacts = fast(temp.path());

        assert_eq!(artifacts.clean().unwrap(), 5);
        assert!(artifacts.find().unwrap().is_none());
        assert!(unrelated.exists());
        assert!(partial.exists());
    }

    #[test]
    fn test_find_ignores_directories() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("folder.ica")).unwrap();

        assert!(fast(temp.path()).find().unwrap().is_none());
    }

    #[test]
    fn test_find_is_lexicographic() {
        let temp = tempfile::tempdir().unwrap();
        touch(temp.path(), "b.ica");
        let first = touch(temp.path(), "a.ica");

        assert_eq!(fast(temp.path()).find().unwrap(), Some(first));
    }

    #[test]
    fn test_directory_with_glob_characters() {
        let temp = tempfile::tempdir().unwrap();
        let odd = temp.path().join("dl [1]");
        fs::create_dir(&odd).unwrap();
        let file = touch(&odd, "session.ica");

        assert_eq!(fast(&odd).find().unwrap(), Some(file));
    }

    #[tokio::test]
    async fn test_await_returns_existing_file() {
        let temp = tempfile::tempdir().unwrap();
        let file = touch(temp.path(), "session.ica");

        let found = fast(temp.path())
            .await_artifact(Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(found, file);
    }

    #[tokio::test]
    async fn test_await_sees_late_file() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().to_path_buf();

        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            touch(&dir, "session.ica")
        });

        let found = fast(temp.path())
            .await_artifact(Duration::from_secs(5))
            .await
            .unwrap();
        let written = writer.join().unwrap();
        assert_eq!(found, written);
    }

    #[tokio::test]
    async fn test_await_times_out() {
        let temp = tempfile::tempdir().unwrap();
        let artifacts = fast(temp.path());

        let started = std::time::Instant::now();
        let result = artifacts.await_artifact(Duration::from_millis(200)).await;

        assert!(started.elapsed() >= Duration::from_millis(200));
        match result {
            Err(Error::AcquisitionTimeout { directory, timeout }) => {
                assert_eq!(directory, temp.path());
                assert_eq!(timeout, Duration::from_millis(200));
            }
            other => panic!("expected AcquisitionTimeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_await_with_unbounded_timeout() {
        let temp = tempfile::tempdir().unwrap();
        let file = touch(temp.path(), "s.ica");

        let found = fast(temp.path())
            .await_artifact(Duration::from_secs(u64::MAX))
            .await
            .unwrap();
        assert_eq!(found, file);
    }
}
