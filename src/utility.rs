use serde_derive::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{LauncherError, LauncherResult};
use crate::process::default_runtime;
use crate::store::LocalStore;

pub const DOWNLOAD_SOURCE_DIRECTORY: &str = "https://isibboi.de/AgentSim/";
pub const VERSION_FILE: &str = "current_version";
pub const STORE_DIR_NAME: &str = ".agentsim";
pub const STORE_DIR_ENV: &str = "AGENTSIM_HOME";

pub const CONNECT_TIMEOUT_MS: u64 = 3000;
pub const READ_TIMEOUT_MS: u64 = 3000;

/// Options chosen by whoever triggers a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchParameters {
    include_snapshots: bool,
}

impl LaunchParameters {
    pub fn new(include_snapshots: bool) -> Self {
        Self { include_snapshots }
    }

    /// Whether snapshot builds are eligible. Not consulted when fetching yet.
    pub fn include_snapshots(&self) -> bool {
        self.include_snapshots
    }
}

impl Default for LaunchParameters {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Launcher settings, read from an optional TOML file.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Directory serving `current_version` and the artifacts.
    pub base_url: String,
    /// Replaces `~/.agentsim` when set.
    pub store_dir: Option<PathBuf>,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    /// Command prefix used to run the artifact. Empty runs it directly.
    pub runtime: Vec<String>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            base_url: DOWNLOAD_SOURCE_DIRECTORY.to_string(),
            store_dir: None,
            connect_timeout_ms: CONNECT_TIMEOUT_MS,
            read_timeout_ms: READ_TIMEOUT_MS,
            runtime: default_runtime(),
        }
    }
}

impl LauncherConfig {
    pub fn load(path: &Path) -> LauncherResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            LauncherError::configuration_caused(
                format!("could not read config file {}", path.display()),
                e,
            )
        })?;

        Self::from_toml(&contents)
    }

    pub fn from_toml(raw: &str) -> LauncherResult<Self> {
        toml::from_str(raw)
            .map_err(|e| LauncherError::configuration_caused("config file is malformed", e))
    }

    pub fn as_toml(&self) -> LauncherResult<String> {
        toml::to_string(self)
            .map_err(|e| LauncherError::configuration_caused("could not serialize config", e))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// The local store this configuration points at.
    ///
    /// `store_dir` wins, then `AGENTSIM_HOME`, then `~/.agentsim`.
    pub fn store(&self) -> LauncherResult<LocalStore> {
        if let Some(dir) = &self.store_dir {
            return Ok(LocalStore::new(dir.clone()));
        }

        if let Some(dir) = std::env::var_os(STORE_DIR_ENV) {
            return Ok(LocalStore::new(PathBuf::from(dir)));
        }

        LocalStore::in_home()
    }
}
