//! Best-effort detection of the application build version from the
//! bootstrap's bundled metadata artifact.

use std::path::{Path, PathBuf};

use semver::Version;
use serde::Deserialize;
use tracing::error;

use crate::run_log::{RunLog, Severity};

/// Metadata artifact expected next to the bootstrap executable.
pub const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildMetadata {
	#[serde(default)]
	app_version: Option<String>,
}

/// Probes the build-time application version. Never fails the caller:
/// every degraded outcome is `None`.
pub fn probe(log: &mut RunLog) -> Option<Version> {
	let path = default_metadata_path()?;
	probe_at(&path, log)
}

fn default_metadata_path() -> Option<PathBuf> {
	let exe = std::env::current_exe().ok()?;
	Some(exe.parent()?.join(METADATA_FILE))
}

/// Probe against an explicit artifact path.
///
/// A missing, unreadable, or malformed artifact is reported to the
/// console only; a present-but-invalid version string additionally
/// records a persisted error entry for visibility.
pub fn probe_at(path: &Path, log: &mut RunLog) -> Option<Version> {
	let metadata = match read_metadata(path) {
		Ok(metadata) => metadata,
		Err(err) => {
			error!(target = "bootstrap", path = %path.display(), error = %err, "cannot read build metadata");
			return None;
		}
	};

	match metadata.app_version.as_deref().map(Version::parse) {
		Some(Ok(version)) => {
			log.log(
				Severity::Info,
				format!("bootstrap built for application version {version}"),
				false,
			);
			Some(version)
		}
		_ => {
			log.log(Severity::Error, "failed to detect build-time application version", true);
			None
		}
	}
}

fn read_metadata(path: &Path) -> anyhow::Result<BuildMetadata> {
	let content = std::fs::read_to_string(path)?;
	Ok(serde_json::from_str(&content)?)
}
