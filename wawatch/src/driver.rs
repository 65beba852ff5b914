//! chromedriver bootstrap: executable discovery, process spawn, and the
//! WebDriver handshake. Plumbing around the external browser collaborator,
//! kept apart from the detection core.

use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use tokio::process::{Child, Command};
use tracing::{debug, info};
use which::which;

use crate::errors::WatchError;

const CHROMEDRIVER_FALLBACKS: [&str; 3] = [
    "/usr/bin/chromedriver",
    "/usr/local/bin/chromedriver",
    "/opt/homebrew/bin/chromedriver",
];

const BROWSER_CANDIDATES: [&str; 5] = [
    "/usr/bin/google-chrome",
    "/usr/bin/chromium-browser",
    "/usr/bin/chromium",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

/// Locate a chromedriver executable: `$PATH` first, then the usual install
/// locations.
pub fn find_chromedriver() -> Result<PathBuf, WatchError> {
    if let Ok(path) = which("chromedriver") {
        debug!(path = %path.display(), "found chromedriver on PATH");
        return Ok(path);
    }
    for candidate in CHROMEDRIVER_FALLBACKS {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Ok(path);
        }
    }
    Err(WatchError::Startup(
        "chromedriver not found; install it (e.g. `apt install chromium-chromedriver` \
         or `brew install chromedriver`) or put it on PATH"
            .to_string(),
    ))
}

/// Locate a Chrome/Chromium binary to hand to the driver. `None` lets
/// chromedriver pick its default.
pub fn find_browser_binary() -> Option<PathBuf> {
    BROWSER_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

/// A chromedriver process owned for the life of the monitoring run.
pub struct ChromeDriver {
    child: Child,
    port: u16,
}

impl ChromeDriver {
    /// Locate chromedriver and spawn it on an ephemeral port.
    pub async fn spawn() -> Result<Self, WatchError> {
        let path = find_chromedriver()?;
        Self::spawn_at(&path).await
    }

    pub async fn spawn_at(path: &Path) -> Result<Self, WatchError> {
        let port = free_port()?;
        info!(driver = %path.display(), port, "starting chromedriver");
        let child = Command::new(path)
            .arg(format!("--port={port}"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| WatchError::Startup(format!("failed to start chromedriver: {err}")))?;
        Ok(Self { child, port })
    }

    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    /// Open a WebDriver session against this driver, retrying briefly while
    /// the driver finishes binding its port.
    pub async fn connect(&self) -> Result<Client, WatchError> {
        let capabilities = chrome_capabilities();
        let url = self.url();
        let mut last_err = None;
        for _ in 0..20 {
            match ClientBuilder::native()
                .capabilities(capabilities.clone())
                .connect(&url)
                .await
            {
                Ok(client) => return Ok(client),
                Err(err) => {
                    last_err = Some(err);
                    tokio::time::sleep(Duration::from_millis(250)).await;
                }
            }
        }
        Err(WatchError::Startup(format!(
            "could not open a WebDriver session at {url}: {}",
            last_err.map(|err| err.to_string()).unwrap_or_default()
        )))
    }

    /// Stop the driver process.
    pub async fn shutdown(mut self) -> Result<(), WatchError> {
        self.child.kill().await?;
        Ok(())
    }
}

fn free_port() -> Result<u16, WatchError> {
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .map_err(|err| WatchError::Startup(format!("no free local port: {err}")))?;
    let port = listener
        .local_addr()
        .map_err(|err| WatchError::Startup(format!("no free local port: {err}")))?
        .port();
    Ok(port)
}

/// Chrome options matching what the monitored page needs: keep rendering
/// active while the window is backgrounded, and survive container
/// environments.
fn chrome_capabilities() -> serde_json::Map<String, serde_json::Value> {
    let mut options = json!({
        "args": [
            "--start-maximized",
            "--disable-background-timer-throttling",
            "--disable-backgrounding-occluded-windows",
            "--disable-renderer-backgrounding",
            "--no-sandbox",
            "--disable-dev-shm-usage",
        ],
    });
    if let Some(binary) = find_browser_binary() {
        info!(browser = %binary.display(), "using browser binary");
        options["binary"] = json!(binary);
    }

    let mut capabilities = serde_json::Map::new();
    capabilities.insert("goog:chromeOptions".to_string(), options);
    capabilities
}
