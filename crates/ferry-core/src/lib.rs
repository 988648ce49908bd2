pub mod artifacts;
pub mod config;
pub mod error;
pub mod launcher;

pub use artifacts::{ArtifactDirectory, ARTIFACT_EXTENSION};
pub use config::{Passcode, WorkspaceConfig};
pub use error::{Error, Result};
pub use launcher::{ClientLauncher, DetachedLauncher};
