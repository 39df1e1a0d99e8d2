#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

/// Image asset served by [`live_mirror`]; one of the default probe assets.
#[allow(dead_code)]
pub const LIVE_ASSET: &str = "/assets/images/logo.webp";

/// Create a `mirrorhop` command isolated inside `root`.
///
/// Config comes from `<root>/config.toml` (created empty if absent) and the
/// query store writes under `<root>/data`.
#[allow(dead_code)]
pub fn mirrorhop_cmd(root: &Path) -> Command {
    let config = root.join("config.toml");
    if !config.exists() {
        std::fs::write(&config, "").expect("failed to write empty config");
    }

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mirrorhop"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env("MIRRORHOP_CONFIG", &config);
    cmd.env("MIRRORHOP_DATA_DIR", data_dir(root));
    cmd.env_remove("MIRRORHOP_TIMEOUT_MS");
    cmd.env("NO_COLOR", "1");
    cmd
}

#[allow(dead_code)]
pub fn data_dir(root: &Path) -> PathBuf {
    root.join("data")
}

#[allow(dead_code)]
pub fn write_config(root: &Path, content: &str) -> PathBuf {
    let path = root.join("config.toml");
    std::fs::write(&path, content).expect("failed to write config");
    path
}

/// A mirror that still serves the real deployment's image asset.
#[allow(dead_code)]
pub async fn live_mirror() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIVE_ASSET))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/webp")
                .set_body_bytes(vec![0u8; 16]),
        )
        .mount(&server)
        .await;
    server
}

/// A host that answers 404 for everything.
#[allow(dead_code)]
pub async fn dead_mirror() -> MockServer {
    MockServer::start().await
}

/// A parking page: 200 with HTML for every path.
#[allow(dead_code)]
pub async fn parked_mirror() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string("<html><body>This domain is for sale</body></html>"),
        )
        .mount(&server)
        .await;
    server
}

#[allow(dead_code)]
pub fn funnel_url(server: &MockServer) -> String {
    format!("{}/funnel/index.html", server.uri())
}
