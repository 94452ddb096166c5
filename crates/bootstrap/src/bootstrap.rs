//! Bootstrap orchestration: acquire, probe, publish.

use std::path::PathBuf;

use crate::acquire;
use crate::browser::BrowserHandle;
use crate::config::Config;
use crate::descriptor::SessionDescriptor;
use crate::error::Result;
use crate::run_log::{RunLog, Severity};
use crate::version;

/// Everything the bootstrap hands to its caller: the owned browser
/// handle for a later teardown step, and the published descriptor.
///
/// The handle is threaded explicitly through this context rather than
/// stashed in process-global state.
#[derive(Debug)]
pub struct BootstrapContext {
	pub handle: BrowserHandle,
	pub descriptor: SessionDescriptor,
	pub descriptor_path: PathBuf,
}

impl BootstrapContext {
	/// Closes the browser handle. Worker processes reconnecting via the
	/// published endpoint lose their session once this runs.
	pub async fn teardown(self) -> anyhow::Result<()> {
		self.handle.close().await
	}
}

/// Runs the bootstrap once: acquires the browser, probes the build
/// version, publishes the session descriptor.
///
/// A descriptor is written if and only if acquisition succeeded; any
/// error here leaves a prior run's descriptor untouched.
pub async fn run(config: &Config, log: &mut RunLog) -> Result<BootstrapContext> {
	let acquired = acquire::acquire(config, log).await?;
	let detected = version::probe(log);

	let descriptor = SessionDescriptor::assemble(config, &acquired.endpoint, detected.as_ref());
	let descriptor_path = descriptor.publish(&config.output_dir)?;
	log.log(
		Severity::Info,
		format!("session descriptor written to {}", descriptor_path.display()),
		true,
	);

	Ok(BootstrapContext {
		handle: acquired.handle,
		descriptor,
		descriptor_path,
	})
}
