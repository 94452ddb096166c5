//! Closed browser-engine enumeration and the per-engine capability
//! interface used by acquisition.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::browser::{BrowserHandle, WsTransport, launch_server};

/// Browser engine family driven by the bootstrap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
	/// Chromium-based browser (Chrome, Edge). Attaches CDP-style.
	#[default]
	Chromium,
	/// Mozilla Firefox.
	Firefox,
	/// WebKit (Safari-like).
	Webkit,
}

impl EngineKind {
	/// Lenient mapping from a config string; unrecognized or unset
	/// values select the default engine.
	pub fn from_config(raw: &str) -> Self {
		match raw.trim().to_ascii_lowercase().as_str() {
			"firefox" => EngineKind::Firefox,
			"webkit" => EngineKind::Webkit,
			_ => EngineKind::Chromium,
		}
	}

	pub fn driver(self) -> &'static dyn EngineDriver {
		match self {
			EngineKind::Chromium => &ChromiumDriver,
			EngineKind::Firefox => &FirefoxDriver,
			EngineKind::Webkit => &WebkitDriver,
		}
	}
}

impl std::fmt::Display for EngineKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			EngineKind::Chromium => write!(f, "chromium"),
			EngineKind::Firefox => write!(f, "firefox"),
			EngineKind::Webkit => write!(f, "webkit"),
		}
	}
}

/// Viewport device scale factor applied to every launched browser.
pub const DEVICE_SCALE_FACTOR: u32 = 1;

/// Fully resolved inputs for a local browser server launch.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
	pub executable: PathBuf,
	pub headless: bool,
	pub viewport_width: u32,
	pub viewport_height: u32,
	/// Delay applied to each control-protocol command.
	pub pacing: Duration,
}

/// Capability interface binding each engine variant to its own launch
/// and attach implementation.
#[async_trait]
pub trait EngineDriver: Send + Sync {
	fn kind(&self) -> EngineKind;

	/// Candidate executables checked in order when no override applies.
	/// Absolute entries are probed on disk, bare names on `PATH`.
	fn executable_candidates(&self) -> &[&'static str];

	/// Command-line arguments for launching a browser server exposing a
	/// debugging endpoint on `port`.
	fn launch_args(&self, spec: &LaunchSpec, port: u16) -> Vec<String>;

	/// Launches a browser server and resolves its reusable endpoint.
	async fn launch(&self, spec: &LaunchSpec) -> anyhow::Result<(BrowserHandle, String)> {
		launch_server(self, spec).await
	}

	/// Attaches to a live control-protocol endpoint.
	async fn attach(&self, endpoint: &str, pacing: Duration) -> anyhow::Result<BrowserHandle> {
		let transport = WsTransport::connect(endpoint, pacing).await?;
		Ok(BrowserHandle::Attached { transport })
	}
}

/// Resolves the engine's bundled/installed default executable.
pub fn default_executable(driver: &dyn EngineDriver) -> Option<PathBuf> {
	for candidate in driver.executable_candidates() {
		let path = Path::new(candidate);
		if path.is_absolute() {
			if path.exists() {
				return Some(path.to_path_buf());
			}
		} else if let Ok(found) = which::which(candidate) {
			return Some(found);
		}
	}
	None
}

pub struct ChromiumDriver;

#[async_trait]
impl EngineDriver for ChromiumDriver {
	fn kind(&self) -> EngineKind {
		EngineKind::Chromium
	}

	fn executable_candidates(&self) -> &[&'static str] {
		if cfg!(target_os = "macos") {
			&[
				"/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
				"/Applications/Chromium.app/Contents/MacOS/Chromium",
			]
		} else if cfg!(target_os = "windows") {
			&["chrome.exe", "msedge.exe", "chromium.exe"]
		} else {
			&[
				"google-chrome-stable",
				"google-chrome",
				"chromium-browser",
				"chromium",
				"/usr/bin/google-chrome",
				"/usr/bin/chromium",
				"/snap/bin/chromium",
			]
		}
	}

	fn launch_args(&self, spec: &LaunchSpec, port: u16) -> Vec<String> {
		// --enable-automation is never passed, which keeps the
		// automation banner off the launched browser.
		let mut args = vec![
			format!("--remote-debugging-port={port}"),
			"--no-first-run".to_string(),
			"--no-default-browser-check".to_string(),
			format!("--window-size={},{}", spec.viewport_width, spec.viewport_height),
			format!("--force-device-scale-factor={DEVICE_SCALE_FACTOR}"),
		];
		if spec.headless {
			args.push("--headless=new".to_string());
		}
		args
	}

	/// CDP-style attach: accepts the endpoint URL directly and verifies
	/// the session with a protocol round trip.
	async fn attach(&self, endpoint: &str, pacing: Duration) -> anyhow::Result<BrowserHandle> {
		let mut transport = WsTransport::connect(endpoint, pacing).await?;
		transport.send_command("Browser.getVersion", serde_json::json!({})).await?;
		Ok(BrowserHandle::Attached { transport })
	}
}

pub struct FirefoxDriver;

#[async_trait]
impl EngineDriver for FirefoxDriver {
	fn kind(&self) -> EngineKind {
		EngineKind::Firefox
	}

	fn executable_candidates(&self) -> &[&'static str] {
		if cfg!(target_os = "macos") {
			&["/Applications/Firefox.app/Contents/MacOS/firefox"]
		} else if cfg!(target_os = "windows") {
			&["firefox.exe"]
		} else {
			&["firefox", "/usr/bin/firefox", "/snap/bin/firefox"]
		}
	}

	fn launch_args(&self, spec: &LaunchSpec, port: u16) -> Vec<String> {
		let mut args = vec![
			format!("--remote-debugging-port={port}"),
			"--width".to_string(),
			spec.viewport_width.to_string(),
			"--height".to_string(),
			spec.viewport_height.to_string(),
		];
		if spec.headless {
			args.push("--headless".to_string());
		}
		args
	}
}

/// WebKit launches assume a build exposing a DevTools-compatible
/// debug port (e.g. a Playwright-built MiniBrowser); remote attach has
/// no such requirement.
pub struct WebkitDriver;

#[async_trait]
impl EngineDriver for WebkitDriver {
	fn kind(&self) -> EngineKind {
		EngineKind::Webkit
	}

	fn executable_candidates(&self) -> &[&'static str] {
		if cfg!(target_os = "macos") {
			&["Playwright.app/Contents/MacOS/Playwright", "MiniBrowser"]
		} else {
			&["MiniBrowser", "webkit"]
		}
	}

	fn launch_args(&self, spec: &LaunchSpec, port: u16) -> Vec<String> {
		let mut args = vec![format!("--remote-debugging-port={port}")];
		if spec.headless {
			args.push("--headless".to_string());
		}
		args
	}
}
