//! Keeps the local copy of AgentSim current and starts it.
//!
//! [`Launcher`] checks the download server for the latest version, downloads
//! it into `~/.agentsim` when it is not cached yet, reports progress through
//! [`ProgressModel`], and finally starts the artifact.

pub mod error;
pub mod launcher;
pub mod process;
pub mod progress;
pub mod store;
pub mod update;
pub mod utility;

pub use error::{LauncherError, LauncherResult};
pub use launcher::{LaunchOutcome, LaunchState, Launcher};
pub use progress::{ObserverId, ProgressModel, ProgressObserver};
pub use store::LocalStore;
pub use update::{ArtifactFetcher, VersionIdentifier, VersionResolver};
pub use utility::{LaunchParameters, LauncherConfig};
