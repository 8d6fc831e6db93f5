use log::{debug, info};
use reqwest::header::USER_AGENT;
use reqwest::{Client, Response, Url};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::{BoxError, LauncherError, LauncherResult};
use crate::progress::ProgressModel;
use crate::store::LocalStore;
use crate::utility::{LauncherConfig, VERSION_FILE};

/// Bytes written to disk per step; progress is recomputed after each one.
pub const CHUNK_SIZE: usize = 4096;

const BINARY_NAME: &str = env!("CARGO_PKG_NAME");

/// Name of the latest artifact, as published in `current_version`.
///
/// Doubles as the artifact's file name in the local store, so anything that
/// would escape the store directory is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionIdentifier(String);

impl VersionIdentifier {
    pub fn parse(raw: &str) -> LauncherResult<Self> {
        let raw = raw.trim();

        if raw.is_empty() {
            return Err(LauncherError::network("version file is empty"));
        }

        if raw == "." || raw == ".." || raw.contains(['/', '\\']) {
            return Err(LauncherError::network(format!("version file is malformed: {raw:?}")));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn http_client(config: &LauncherConfig) -> Result<Client, reqwest::Error> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(USER_AGENT, reqwest::header::HeaderValue::from_static(BINARY_NAME));

    Client::builder()
        .connect_timeout(config.connect_timeout())
        .default_headers(headers)
        .build()
}

/// `base_url` with `name` appended as one literal path segment.
fn endpoint(base_url: &str, name: &str) -> Result<Url, BoxError> {
    let mut url = Url::parse(base_url)?;
    url.path_segments_mut()
        .map_err(|()| "base URL cannot carry a path")?
        .pop_if_empty()
        .push(name);

    Ok(url)
}

/// Bounds a single request step (headers, body, or one chunk) by `limit`.
async fn with_timeout<T, F>(limit: Duration, request: F) -> Result<T, BoxError>
where
    F: Future<Output = Result<T, reqwest::Error>>,
{
    match tokio::time::timeout(limit, request).await {
        Ok(result) => Ok(result?),
        Err(elapsed) => Err(elapsed.into()),
    }
}

/// Reads the identifier of the latest version from the download server.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    client: Client,
    base_url: String,
    read_timeout: Duration,
}

impl VersionResolver {
    pub fn new(config: &LauncherConfig) -> LauncherResult<Self> {
        let client = http_client(config)
            .map_err(|e| LauncherError::network_caused("could not build HTTP client", e))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            read_timeout: config.read_timeout(),
        })
    }

    /// Single attempt; only the first line of the body counts.
    pub async fn resolve_latest_version(&self) -> LauncherResult<VersionIdentifier> {
        let url = endpoint(&self.base_url, VERSION_FILE)
            .map_err(|e| LauncherError::network_caused("version file URL is malformed", e))?;
        debug!("Fetching version from {url}");

        let response = with_timeout(self.read_timeout, self.client.get(url).send())
            .await
            .and_then(|response| Ok(response.error_for_status()?))
            .map_err(|e| LauncherError::network_caused("could not retrieve version", e))?;

        let body = with_timeout(self.read_timeout, response.text())
            .await
            .map_err(|e| LauncherError::network_caused("could not read version", e))?;

        let version = VersionIdentifier::parse(body.lines().next().unwrap_or_default())?;
        info!("Latest version is {version}");
        Ok(version)
    }
}

/// Downloads an artifact into the local store unless it is already there.
#[derive(Debug, Clone)]
pub struct ArtifactFetcher {
    client: Client,
    base_url: String,
    read_timeout: Duration,
    store: LocalStore,
    progress: Arc<ProgressModel>,
}

impl ArtifactFetcher {
    pub fn new(
        config: &LauncherConfig,
        store: LocalStore,
        progress: Arc<ProgressModel>,
    ) -> LauncherResult<Self> {
        let client = http_client(config)
            .map_err(|e| LauncherError::download_caused("could not build HTTP client", e))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            read_timeout: config.read_timeout(),
            store,
            progress,
        })
    }

    /// Returns the local path of `version`, downloading it first if needed.
    ///
    /// A cached artifact is returned as is, without touching the network or
    /// the progress model. A failed transfer leaves the partial file behind.
    pub async fn ensure_downloaded(&self, version: &VersionIdentifier) -> LauncherResult<PathBuf> {
        let target = self.store.artifact_path(version);

        let cached = tokio::fs::try_exists(&target)
            .await
            .map_err(|e| LauncherError::download_caused("could not inspect local store", e))?;
        if cached {
            info!("Current version already exists.");
            return Ok(target);
        }

        let url = endpoint(&self.base_url, version.as_str())
            .map_err(|e| LauncherError::download_caused("artifact URL is malformed", e))?;
        debug!("Downloading {url} to {}", target.display());

        let mut response = self.open(url).await?;

        // A missing or zero length would leave nothing to compute progress against.
        let content_length = match response.content_length() {
            Some(length) if length > 0 => length,
            _ => return Err(LauncherError::download("server did not report a content length")),
        };

        let mut file = File::create(&target)
            .await
            .map_err(|e| LauncherError::download_caused("could not create artifact file", e))?;

        self.progress.begin();

        let mut pending = Vec::with_capacity(CHUNK_SIZE);
        let mut written = 0u64;

        while let Some(bytes) = with_timeout(self.read_timeout, response.chunk())
            .await
            .map_err(|e| LauncherError::download_caused("could not read artifact", e))?
        {
            let mut rest = &bytes[..];
            while !rest.is_empty() {
                let take = (CHUNK_SIZE - pending.len()).min(rest.len());
                pending.extend_from_slice(&rest[..take]);
                rest = &rest[take..];

                if pending.len() == CHUNK_SIZE {
                    self.write_chunk(&mut file, &pending, &mut written, content_length).await?;
                    pending.clear();
                }
            }
        }

        if !pending.is_empty() {
            self.write_chunk(&mut file, &pending, &mut written, content_length).await?;
        }

        file.flush()
            .await
            .map_err(|e| LauncherError::download_caused("could not write artifact", e))?;

        self.progress.complete();
        info!("Downloaded current version ({written} bytes).");
        Ok(target)
    }

    async fn open(&self, url: Url) -> LauncherResult<Response> {
        with_timeout(self.read_timeout, self.client.get(url).send())
            .await
            .and_then(|response| Ok(response.error_for_status()?))
            .map_err(|e| LauncherError::download_caused("could not download artifact", e))
    }

    async fn write_chunk(
        &self,
        file: &mut File,
        chunk: &[u8],
        written: &mut u64,
        total: u64,
    ) -> LauncherResult<()> {
        file.write_all(chunk)
            .await
            .map_err(|e| LauncherError::download_caused("could not write artifact", e))?;

        *written += chunk.len() as u64;
        self.progress.advance(*written, total);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_treats_base_as_directory() {
        let with_slash = endpoint("https://isibboi.de/AgentSim/", "current_version").unwrap();
        let without_slash = endpoint("https://isibboi.de/AgentSim", "current_version").unwrap();

        assert_eq!(with_slash.as_str(), "https://isibboi.de/AgentSim/current_version");
        assert_eq!(without_slash, with_slash);
    }

    #[test]
    fn name_stays_a_single_segment_under_the_base() {
        let scheme_like = endpoint("https://isibboi.de/AgentSim/", "build:42.jar").unwrap();
        let with_hash = endpoint("https://isibboi.de/AgentSim/", "v1#2.jar").unwrap();
        let with_query = endpoint("http://127.0.0.1:8080", "v1?x.jar").unwrap();

        assert_eq!(scheme_like.as_str(), "https://isibboi.de/AgentSim/build:42.jar");
        assert_eq!(with_hash.as_str(), "https://isibboi.de/AgentSim/v1%232.jar");
        assert_eq!(with_hash.fragment(), None);
        assert_eq!(with_query.as_str(), "http://127.0.0.1:8080/v1%3Fx.jar");
        assert_eq!(with_query.query(), None);
    }

    #[test]
    fn base_without_path_gets_the_name_at_the_root() {
        let url = endpoint("http://127.0.0.1:8080", "current_version").unwrap();

        assert_eq!(url.as_str(), "http://127.0.0.1:8080/current_version");
    }

    #[test]
    fn base_that_cannot_hold_a_path_is_an_error() {
        assert!(endpoint("mailto:builds@isibboi.de", "v1.jar").is_err());
    }

    #[test]
    fn malformed_base_url_is_an_error() {
        assert!(endpoint("not a url", "current_version").is_err());
    }

    #[test]
    fn version_is_trimmed() {
        let version = VersionIdentifier::parse(" v2.3.jar \r").unwrap();

        assert_eq!(version.as_str(), "v2.3.jar");
        assert_eq!(version.to_string(), "v2.3.jar");
    }

    #[test]
    fn empty_version_is_rejected() {
        let err = VersionIdentifier::parse("  ").unwrap_err();

        assert!(matches!(err, LauncherError::Network { .. }));
    }

    #[test]
    fn versions_escaping_the_store_are_rejected() {
        for raw in ["..", ".", "../evil.jar", "nested/v1.jar", "c:\\v1.jar"] {
            assert!(VersionIdentifier::parse(raw).is_err(), "{raw} should be rejected");
        }
    }
}
