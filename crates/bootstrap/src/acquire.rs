//! Browser acquisition: the one irreversible decision of the
//! bootstrap.
//!
//! The presence of a remote attach URL deterministically selects the
//! strategy; there is no retry and no fallback between the two.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use crate::browser::BrowserHandle;
use crate::config::Config;
use crate::engine::{EngineDriver, EngineKind, LaunchSpec, default_executable};
use crate::error::{BootstrapError, Result};
use crate::run_log::{RunLog, Severity};

/// Timeout for the single remote discovery GET.
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Mutually exclusive acquisition strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionStrategy {
	/// Attach to an already-running browser via its discovery URL.
	RemoteAttach,
	/// Launch a new browser server process.
	LocalLaunch,
}

/// Resolves the strategy from the configured attach URL.
pub fn select_strategy(config: &Config) -> AcquisitionStrategy {
	if config.attach_url.is_empty() {
		AcquisitionStrategy::LocalLaunch
	} else {
		AcquisitionStrategy::RemoteAttach
	}
}

/// Result of a successful acquisition: the owned handle plus the
/// endpoint string that is distributed to worker processes.
#[derive(Debug)]
pub struct Acquired {
	pub handle: BrowserHandle,
	pub endpoint: String,
}

/// Obtains the run's single browser automation handle and endpoint.
pub async fn acquire(config: &Config, log: &mut RunLog) -> Result<Acquired> {
	let engine = config.engine();
	match select_strategy(config) {
		AcquisitionStrategy::RemoteAttach => attach_remote(config, engine, log).await,
		AcquisitionStrategy::LocalLaunch => launch_local(config, engine, log).await,
	}
}

/// `/json/version` response subset from the browser's discovery
/// endpoint.
#[derive(Debug, Deserialize)]
pub struct DebuggerVersionInfo {
	#[serde(rename = "webSocketDebuggerUrl")]
	pub web_socket_debugger_url: String,
	#[serde(rename = "Browser")]
	pub browser: Option<String>,
}

/// Resolves the control-protocol endpoint from `<base_url>/json/version`.
pub(crate) async fn fetch_debugger_endpoint(base_url: &str, timeout: Duration) -> anyhow::Result<DebuggerVersionInfo> {
	let client = reqwest::Client::builder()
		.timeout(timeout)
		.build()
		.context("failed to create HTTP client")?;
	let url = format!("{}/json/version", base_url.trim_end_matches('/'));

	let response = client.get(&url).send().await.with_context(|| format!("GET {url} failed"))?;
	if !response.status().is_success() {
		anyhow::bail!("GET {url} returned status {}", response.status());
	}
	response
		.json()
		.await
		.with_context(|| format!("failed to parse discovery response from {url}"))
}

async fn attach_remote(config: &Config, engine: EngineKind, log: &mut RunLog) -> Result<Acquired> {
	log.log(
		Severity::Info,
		format!("attaching to remote {engine} browser at {}", config.attach_url),
		false,
	);

	let attempt = async {
		let info = fetch_debugger_endpoint(&config.attach_url, DISCOVERY_TIMEOUT).await?;
		if let Some(browser) = &info.browser {
			debug!(target = "bootstrap", %browser, "discovered remote browser");
		}
		let endpoint = info.web_socket_debugger_url;
		let handle = engine.driver().attach(&endpoint, config.pacing()).await?;
		Ok::<_, anyhow::Error>(Acquired { handle, endpoint })
	};

	attempt.await.map_err(|source| BootstrapError::Connection {
		url: config.attach_url.clone(),
		source,
	})
}

async fn launch_local(config: &Config, engine: EngineKind, log: &mut RunLog) -> Result<Acquired> {
	let driver = engine.driver();
	let executable = resolve_executable(config, driver, log).map_err(|source| BootstrapError::Launch {
		engine,
		path: PathBuf::from(&config.executable_path),
		source,
	})?;

	log.log(
		Severity::Info,
		format!("launching {engine} browser server from {}", executable.display()),
		false,
	);

	let spec = LaunchSpec {
		executable: executable.clone(),
		headless: config.headless,
		viewport_width: config.viewport_width,
		viewport_height: config.viewport_height,
		pacing: config.pacing(),
	};

	match driver.launch(&spec).await {
		Ok((handle, endpoint)) => Ok(Acquired { handle, endpoint }),
		Err(source) => Err(BootstrapError::Launch {
			engine,
			path: executable,
			source,
		}),
	}
}

/// Resolves the executable for a local launch.
///
/// A configured override that cannot be confirmed on disk (absent, or
/// any filesystem error while probing) records a persisted warning and
/// falls back to the engine default instead of failing the launch.
fn resolve_executable(config: &Config, driver: &dyn EngineDriver, log: &mut RunLog) -> anyhow::Result<PathBuf> {
	if !config.executable_path.is_empty() {
		let override_path = Path::new(&config.executable_path);
		if matches!(override_path.try_exists(), Ok(true)) {
			return Ok(override_path.to_path_buf());
		}
		log.log(
			Severity::Warning,
			format!("browser executable not found at path {}", config.executable_path),
			true,
		);
	}

	default_executable(driver)
		.ok_or_else(|| anyhow::anyhow!("no {} executable found on this system", driver.kind()))
}
