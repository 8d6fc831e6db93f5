use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LauncherError, LauncherResult};
use crate::update::VersionIdentifier;
use crate::utility::STORE_DIR_NAME;

/// Per-user directory holding downloaded artifacts, one file per version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn in_home() -> LauncherResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| LauncherError::configuration("could not determine the home directory"))?;

        Ok(Self::new(home.join(STORE_DIR_NAME)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Makes sure the store directory exists and returns its path.
    ///
    /// Only the store itself is created; its parent must already exist.
    pub fn ensure_ready(&self) -> LauncherResult<PathBuf> {
        if self.root.is_dir() {
            return Ok(self.root.clone());
        }

        if self.root.exists() {
            return Err(LauncherError::configuration(format!(
                "root path is not a directory: {}",
                self.root.display()
            )));
        }

        fs::create_dir(&self.root).map_err(|e| {
            LauncherError::configuration_caused(
                format!("could not create root directory {}", self.root.display()),
                e,
            )
        })?;

        info!("Created {} directory.", self.root.display());
        Ok(self.root.clone())
    }

    /// Where the artifact for `version` lives, whether or not it exists yet.
    pub fn artifact_path(&self, version: &VersionIdentifier) -> PathBuf {
        self.root.join(version.as_str())
    }
}
