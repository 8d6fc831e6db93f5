use cfg_if::cfg_if;
use log::{debug, info};
use std::path::Path;
use std::process::{Child, Command};

use crate::error::{LauncherError, LauncherResult};

cfg_if! {
    if #[cfg(windows)] {
        // javaw keeps a console window from popping up next to the game.
        const RUNTIME: &[&str] = &["javaw", "-jar"];
    } else {
        const RUNTIME: &[&str] = &["java", "-jar"];
    }
}

/// The platform's command prefix for running an artifact.
pub fn default_runtime() -> Vec<String> {
    RUNTIME.iter().map(|part| part.to_string()).collect()
}

/// Starts a downloaded artifact as an independent process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessLauncher {
    runtime: Vec<String>,
}

impl ProcessLauncher {
    /// `runtime` is the command prefix; when empty the artifact is executed itself.
    pub fn new(runtime: Vec<String>) -> Self {
        Self { runtime }
    }

    /// Spawns the artifact and returns without waiting for it.
    ///
    /// The returned handle may be dropped; the child keeps running.
    pub fn launch(&self, artifact: &Path) -> LauncherResult<Child> {
        let artifact = artifact
            .canonicalize()
            .map_err(|e| LauncherError::launch_caused("could not resolve artifact path", e))?;

        let mut command = match self.runtime.split_first() {
            Some((program, args)) => {
                let mut command = Command::new(program);
                command.args(args).arg(&artifact);
                command
            }
            None => Command::new(&artifact),
        };

        debug!("Executing: {command:?}");

        let child = command
            .spawn()
            .map_err(|e| LauncherError::launch_caused("could not launch AgentSim", e))?;

        info!("AgentSim was successfully launched (pid {}).", child.id());
        Ok(child)
    }
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        Self::new(default_runtime())
    }
}
