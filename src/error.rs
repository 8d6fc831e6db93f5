use thiserror::Error;

/// Boxed lower-level cause carried by [`LauncherError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type LauncherResult<T> = Result<T, LauncherError>;

/// Failures of the update-and-launch workflow.
///
/// Each variant names the step that failed; the underlying cause, if any,
/// is kept as the error source so the full chain can be logged.
#[derive(Debug, Error)]
pub enum LauncherError {
    /// The local store or the launcher configuration is unusable.
    #[error("configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
    /// The latest version could not be resolved.
    #[error("network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
    /// The artifact could not be downloaded and saved.
    #[error("download error: {message}")]
    Download {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
    /// The artifact could not be started.
    #[error("launch error: {message}")]
    Launch {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl LauncherError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into(), source: None }
    }

    pub fn configuration_caused(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Configuration { message: message.into(), source: Some(source.into()) }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into(), source: None }
    }

    pub fn network_caused(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Network { message: message.into(), source: Some(source.into()) }
    }

    pub fn download(message: impl Into<String>) -> Self {
        Self::Download { message: message.into(), source: None }
    }

    pub fn download_caused(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Download { message: message.into(), source: Some(source.into()) }
    }

    pub fn launch_caused(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Launch { message: message.into(), source: Some(source.into()) }
    }

    /// Renders the error followed by every cause, `a: b: c`.
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            rendered.push_str(": ");
            rendered.push_str(&err.to_string());
            cause = err.source();
        }
        rendered
    }
}
