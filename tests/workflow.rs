use std::fs;

use agentsim_launcher::{LaunchParameters, LaunchState, Launcher, LauncherConfig, LauncherError};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCRIPT: &str = "exit 0\n";

fn config_for(server: &MockServer, home: &TempDir) -> LauncherConfig {
    LauncherConfig {
        base_url: server.uri(),
        store_dir: Some(home.path().join(".agentsim")),
        runtime: vec!["sh".to_string()],
        ..LauncherConfig::default()
    }
}

async fn publish(server: &MockServer, version: &str, artifact_requests: u64) {
    Mock::given(method("GET"))
        .and(path("/current_version"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("{version}\n")))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/{version}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(SCRIPT))
        .expect(artifact_requests)
        .mount(server)
        .await;
}

#[cfg(unix)]
#[tokio::test]
async fn fresh_install_downloads_and_launches() {
    let server = MockServer::start().await;
    publish(&server, "v2.3.sh", 1).await;
    let home = TempDir::new().unwrap();

    let mut launcher = Launcher::new(config_for(&server, &home), LaunchParameters::new(false));
    let artifact = launcher.run().await.unwrap();

    assert_eq!(launcher.state(), LaunchState::Done);
    assert_eq!(launcher.progress().value(), 100);
    assert_eq!(artifact, home.path().join(".agentsim").join("v2.3.sh"));
    assert_eq!(fs::read_to_string(&artifact).unwrap(), SCRIPT);
}

#[cfg(unix)]
#[tokio::test]
async fn second_run_reuses_the_cached_artifact() {
    let server = MockServer::start().await;
    publish(&server, "v2.3.sh", 1).await;
    let home = TempDir::new().unwrap();

    let first = Launcher::new(config_for(&server, &home), LaunchParameters::default())
        .spawn()
        .await
        .unwrap()
        .unwrap();

    let mut second = Launcher::new(config_for(&server, &home), LaunchParameters::default());
    let again = second.run().await.unwrap();

    assert_eq!(first, again);
    assert_eq!(second.state(), LaunchState::Done);
    // Nothing was downloaded, so the second model never moved.
    assert_eq!(second.progress().value(), 0);
}

#[tokio::test]
async fn failed_download_reports_one_error_through_the_channel() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/current_version"))
        .respond_with(ResponseTemplate::new(200).set_body_string("v2.4.jar"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2.4.jar"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();

    let outcome = Launcher::new(config_for(&server, &home), LaunchParameters::default())
        .spawn()
        .await
        .unwrap();

    assert!(matches!(outcome, Err(LauncherError::Download { .. })));
    assert!(home.path().join(".agentsim").is_dir());
}

#[tokio::test]
async fn unreachable_server_stops_after_the_store_is_ready() {
    let home = TempDir::new().unwrap();
    let config = LauncherConfig {
        // Port 9 (discard) is not expected to be listening.
        base_url: "http://127.0.0.1:9/".to_string(),
        store_dir: Some(home.path().join(".agentsim")),
        ..LauncherConfig::default()
    };

    let mut launcher = Launcher::new(config, LaunchParameters::default());
    let err = launcher.run().await.unwrap_err();

    assert!(matches!(err, LauncherError::Network { .. }));
    assert_eq!(launcher.state(), LaunchState::Failed);
    assert!(home.path().join(".agentsim").is_dir());
    assert_eq!(fs::read_dir(home.path().join(".agentsim")).unwrap().count(), 0);
}
