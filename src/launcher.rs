//! The update-and-launch workflow.
//!
//! ```text
//! Start -> DirectoryReady -> VersionResolved -> ArtifactReady -> Launched -> Done
//!    \___________\_______________\_________________\______________\__> Failed
//! ```
//!
//! Steps run strictly in order on one task. The first failure ends the run;
//! nothing is retried and no older cached artifact is used instead.

use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::error::LauncherResult;
use crate::process::ProcessLauncher;
use crate::progress::ProgressModel;
use crate::update::{ArtifactFetcher, VersionResolver};
use crate::utility::{LaunchParameters, LauncherConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    Start,
    DirectoryReady,
    VersionResolved,
    ArtifactReady,
    Launched,
    Done,
    Failed,
}

/// Result of one run: the launched artifact, or why the run stopped.
pub type LaunchOutcome = LauncherResult<PathBuf>;

/// Owns one launch request from start to finish.
#[derive(Debug)]
pub struct Launcher {
    config: LauncherConfig,
    parameters: LaunchParameters,
    progress: Arc<ProgressModel>,
    state: LaunchState,
}

impl Launcher {
    pub fn new(config: LauncherConfig, parameters: LaunchParameters) -> Self {
        Self {
            config,
            parameters,
            progress: Arc::new(ProgressModel::new()),
            state: LaunchState::Start,
        }
    }

    pub fn progress(&self) -> Arc<ProgressModel> {
        Arc::clone(&self.progress)
    }

    pub fn state(&self) -> LaunchState {
        self.state
    }

    /// Runs the workflow on a background task.
    ///
    /// The receiver yields exactly one outcome. Callers must not start another
    /// run until it has arrived.
    pub fn spawn(mut self) -> oneshot::Receiver<LaunchOutcome> {
        let (sender, receiver) = oneshot::channel();

        tokio::spawn(async move {
            let outcome = self.run().await;
            // The trigger may have gone away; the outcome is already logged.
            let _ = sender.send(outcome);
        });

        receiver
    }

    /// Runs every step in order and logs the consolidated failure, if any.
    pub async fn run(&mut self) -> LaunchOutcome {
        info!("Launching...");

        match self.steps().await {
            Ok(artifact) => {
                self.state = LaunchState::Done;
                Ok(artifact)
            }
            Err(e) => {
                error!("Could not launch AgentSim! {}", e.chain());
                self.state = LaunchState::Failed;
                Err(e)
            }
        }
    }

    async fn steps(&mut self) -> LaunchOutcome {
        info!("Snapshots included: {}", self.parameters.include_snapshots());

        // Store and process steps are single metadata/spawn syscalls; only the
        // network and artifact writes go through tokio.
        let store = self.config.store()?;
        store.ensure_ready()?;
        self.state = LaunchState::DirectoryReady;

        let version = VersionResolver::new(&self.config)?
            .resolve_latest_version()
            .await?;
        self.state = LaunchState::VersionResolved;

        let artifact = ArtifactFetcher::new(&self.config, store, self.progress())?
            .ensure_downloaded(&version)
            .await?;
        self.state = LaunchState::ArtifactReady;

        info!("Launching AgentSim...");
        ProcessLauncher::new(self.config.runtime.clone()).launch(&artifact)?;
        self.state = LaunchState::Launched;

        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LauncherError;
    use tempfile::TempDir;

    #[test]
    fn new_launcher_starts_at_zero() {
        let launcher = Launcher::new(LauncherConfig::default(), LaunchParameters::default());

        assert_eq!(launcher.state(), LaunchState::Start);
        assert_eq!(launcher.progress().value(), 0);
    }

    #[tokio::test]
    async fn store_conflict_fails_before_any_request() {
        let home = TempDir::new().unwrap();
        let store_dir = home.path().join(".agentsim");
        std::fs::write(&store_dir, b"file").unwrap();

        let config = LauncherConfig {
            // Nothing listens here; reaching the resolver would be a network error.
            base_url: "http://127.0.0.1:9/".to_string(),
            store_dir: Some(store_dir),
            ..LauncherConfig::default()
        };
        let mut launcher = Launcher::new(config, LaunchParameters::default());

        let err = launcher.run().await.unwrap_err();

        assert!(matches!(err, LauncherError::Configuration { .. }));
        assert_eq!(launcher.state(), LaunchState::Failed);
    }

    #[tokio::test]
    async fn malformed_base_url_fails_safely() {
        let home = TempDir::new().unwrap();
        let config = LauncherConfig {
            base_url: "::not a url::".to_string(),
            store_dir: Some(home.path().join(".agentsim")),
            ..LauncherConfig::default()
        };
        let mut launcher = Launcher::new(config, LaunchParameters::default());

        let err = launcher.run().await.unwrap_err();

        assert!(matches!(err, LauncherError::Network { .. }));
        assert_eq!(launcher.state(), LaunchState::Failed);
        assert!(home.path().join(".agentsim").is_dir());
    }
}
