use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Browser user-data directory for one run.
///
/// A named profile keeps the portal's "protocol handler installed" and
/// disclaimer choices between runs; a temporary one is removed on drop.
pub struct ProfileManager {
    path: PathBuf,
    is_temporary: bool,
}

impl ProfileManager {
    pub fn temporary() -> Result<Self> {
        let path = tempfile::Builder::new()
            .prefix("ferry-profile-")
            .tempdir()?
            .keep();

        Ok(Self {
            path,
            is_temporary: true,
        })
    }

    pub fn persistent(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(&path)?;
        }

        Ok(Self {
            path,
            is_temporary: false,
        })
    }

    /// Open `~/.ferry/profiles/<name>`
    pub fn named(name: &str) -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Browser("Could not determine home directory".to_string()))?;
        Self::persistent(home.join(".ferry").join("profiles").join(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.is_temporary
    }
}

impl Drop for ProfileManager {
    fn drop(&mut self) {
        if self.is_temporary && self.path.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                tracing::warn!("Failed to remove profile {}: {}", self.path.display(), e);
            }
        }
    }
}
