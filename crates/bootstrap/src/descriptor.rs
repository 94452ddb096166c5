//! Session descriptor assembly and publication.
//!
//! The published descriptor is the sole contract between the bootstrap
//! and the worker processes: everything a worker needs to reuse the
//! browser session is in this one record.

use std::fs;
use std::path::{Path, PathBuf};

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::engine::EngineKind;
use crate::error::Result;

/// File name of the descriptor artifact inside the run output dir.
pub const DESCRIPTOR_FILE: &str = "session-info.json";

/// Placeholder written when no valid build version was detected.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Immutable snapshot consumed by worker processes. Written exactly
/// once per bootstrap run, after acquisition has succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescriptor {
	pub run_id: String,
	pub engine_kind: EngineKind,
	pub attach_url: String,
	pub output_dir: PathBuf,
	pub reference_dir: PathBuf,
	pub base_url: String,
	pub access_token: String,
	pub generate_workspace: bool,
	pub skip_visual_regression: bool,
	pub skip_html_regression: bool,
	pub discard_duplicate_captures: bool,
	pub connection_endpoint: String,
	pub detected_version: String,
	pub image_diff_threshold: f64,
}

impl SessionDescriptor {
	/// Merges config pass-through fields with the acquisition result
	/// and detected version.
	pub fn assemble(config: &Config, endpoint: &str, version: Option<&Version>) -> Self {
		Self {
			run_id: config.run_id.clone(),
			engine_kind: config.engine(),
			attach_url: config.attach_url.clone(),
			output_dir: config.output_dir.clone(),
			reference_dir: config.reference_dir.clone(),
			base_url: config.base_url.clone(),
			access_token: config.access_token.clone(),
			generate_workspace: config.generate_workspace,
			skip_visual_regression: config.skip_visual_regression,
			skip_html_regression: config.skip_html_regression,
			discard_duplicate_captures: config.discard_duplicate_captures,
			connection_endpoint: endpoint.to_string(),
			detected_version: version.map_or_else(|| UNKNOWN_VERSION.to_string(), Version::to_string),
			image_diff_threshold: config.image_diff_threshold,
		}
	}

	/// Descriptor artifact path for a run output directory.
	pub fn path_in(output_dir: &Path) -> PathBuf {
		output_dir.join(DESCRIPTOR_FILE)
	}

	/// Writes the descriptor, replacing any artifact from an earlier
	/// run in one shot (never a partial merge).
	pub fn publish(&self, output_dir: &Path) -> Result<PathBuf> {
		fs::create_dir_all(output_dir)?;
		let path = Self::path_in(output_dir);
		let content = serde_json::to_string_pretty(self)?;
		fs::write(&path, content)?;
		Ok(path)
	}

	pub fn load(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path)?;
		Ok(serde_json::from_str(&content)?)
	}
}

#[cfg(test)]
mod tests {
	use tempfile::tempdir;

	use super::*;

	fn config() -> Config {
		Config {
			engine_kind: "firefox".into(),
			attach_url: "http://localhost:9222".into(),
			run_id: "run-42".into(),
			base_url: "http://localhost:8080".into(),
			access_token: "secret".into(),
			output_dir: PathBuf::from("out"),
			reference_dir: PathBuf::from("ref"),
			generate_workspace: true,
			skip_html_regression: true,
			image_diff_threshold: 0.02,
			..Config::default()
		}
	}

	#[test]
	fn assemble_copies_pass_through_fields() {
		let descriptor = SessionDescriptor::assemble(&config(), "ws://localhost:9222/devtools/browser/x", None);

		assert_eq!(descriptor.run_id, "run-42");
		assert_eq!(descriptor.engine_kind, EngineKind::Firefox);
		assert_eq!(descriptor.attach_url, "http://localhost:9222");
		assert_eq!(descriptor.base_url, "http://localhost:8080");
		assert_eq!(descriptor.access_token, "secret");
		assert!(descriptor.generate_workspace);
		assert!(!descriptor.skip_visual_regression);
		assert!(descriptor.skip_html_regression);
		assert!(descriptor.discard_duplicate_captures);
		assert_eq!(descriptor.connection_endpoint, "ws://localhost:9222/devtools/browser/x");
		assert_eq!(descriptor.detected_version, UNKNOWN_VERSION);
		assert_eq!(descriptor.image_diff_threshold, 0.02);
	}

	#[test]
	fn assemble_records_detected_version() {
		let version = Version::parse("4.2.0").unwrap();
		let descriptor = SessionDescriptor::assemble(&config(), "ws://x", Some(&version));
		assert_eq!(descriptor.detected_version, "4.2.0");
	}

	#[test]
	fn artifact_uses_camel_case_field_names() {
		let descriptor = SessionDescriptor::assemble(&config(), "ws://x", None);
		let json = serde_json::to_string(&descriptor).unwrap();

		for field in [
			"runId",
			"engineKind",
			"attachUrl",
			"outputDir",
			"referenceDir",
			"baseUrl",
			"accessToken",
			"generateWorkspace",
			"skipVisualRegression",
			"skipHtmlRegression",
			"discardDuplicateCaptures",
			"connectionEndpoint",
			"detectedVersion",
			"imageDiffThreshold",
		] {
			assert!(json.contains(field), "missing field {field}");
		}
	}

	#[test]
	fn republication_overwrites_whole_artifact() {
		let dir = tempdir().unwrap();
		let cfg = config();

		let first = SessionDescriptor::assemble(&cfg, "ws://localhost:1/a", None);
		let path = first.publish(dir.path()).unwrap();

		let second = SessionDescriptor::assemble(&cfg, "ws://localhost:2/b", None);
		second.publish(dir.path()).unwrap();

		let loaded = SessionDescriptor::load(&path).unwrap();
		assert_eq!(loaded.connection_endpoint, "ws://localhost:2/b");

		// Identical in every field except the endpoint.
		let mut expected = first.clone();
		expected.connection_endpoint = "ws://localhost:2/b".into();
		assert_eq!(loaded, expected);
	}
}
