use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::engine::EngineKind;
use crate::error::{BootstrapError, Result};

/// Resolved bootstrap configuration.
///
/// Resolution (files, environment, CLI of the surrounding harness) is
/// an external concern; the bootstrap reads the final JSON form once
/// and treats it as immutable for the whole run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
	/// Browser engine family; unrecognized values fall back to chromium.
	pub engine_kind: String,
	/// Remote attach URL. Empty selects local launch.
	pub attach_url: String,
	/// Local executable path override. Empty selects the engine default.
	pub executable_path: String,
	pub headless: bool,
	/// Delay applied to each control-protocol command, in milliseconds.
	pub pacing_delay_ms: u64,
	pub viewport_width: u32,
	pub viewport_height: u32,

	// Pass-through identifiers for the session descriptor.
	pub run_id: String,
	pub base_url: String,
	pub access_token: String,
	pub output_dir: PathBuf,
	pub reference_dir: PathBuf,
	pub generate_workspace: bool,
	pub skip_visual_regression: bool,
	pub skip_html_regression: bool,
	pub discard_duplicate_captures: bool,
	pub image_diff_threshold: f64,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			engine_kind: String::new(),
			attach_url: String::new(),
			executable_path: String::new(),
			headless: true,
			pacing_delay_ms: 0,
			viewport_width: 1024,
			viewport_height: 768,
			run_id: String::new(),
			base_url: String::new(),
			access_token: String::new(),
			output_dir: PathBuf::from("test-output"),
			reference_dir: PathBuf::from("reference-output"),
			generate_workspace: false,
			skip_visual_regression: false,
			skip_html_regression: false,
			discard_duplicate_captures: true,
			image_diff_threshold: 0.0,
		}
	}
}

impl Config {
	pub fn from_file(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path)
			.map_err(|err| BootstrapError::Config(format!("cannot read {}: {err}", path.display())))?;
		serde_json::from_str(&content)
			.map_err(|err| BootstrapError::Config(format!("cannot parse {}: {err}", path.display())))
	}

	/// Resolved engine family for this run.
	pub fn engine(&self) -> EngineKind {
		EngineKind::from_config(&self.engine_kind)
	}

	pub fn pacing(&self) -> Duration {
		Duration::from_millis(self.pacing_delay_ms)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn minimal_config_uses_defaults() {
		let config: Config = serde_json::from_str("{}").unwrap();
		assert!(config.headless);
		assert!(config.attach_url.is_empty());
		assert_eq!(config.viewport_width, 1024);
		assert_eq!(config.viewport_height, 768);
		assert!(config.discard_duplicate_captures);
		assert_eq!(config.engine(), EngineKind::Chromium);
	}

	#[test]
	fn camel_case_fields_are_recognized() {
		let config: Config = serde_json::from_str(
			r#"{
				"engineKind": "firefox",
				"attachUrl": "http://localhost:9222",
				"pacingDelayMs": 50,
				"runId": "run-7",
				"skipVisualRegression": true,
				"imageDiffThreshold": 0.05
			}"#,
		)
		.unwrap();

		assert_eq!(config.engine(), EngineKind::Firefox);
		assert_eq!(config.attach_url, "http://localhost:9222");
		assert_eq!(config.pacing(), Duration::from_millis(50));
		assert_eq!(config.run_id, "run-7");
		assert!(config.skip_visual_regression);
		assert!(!config.skip_html_regression);
		assert_eq!(config.image_diff_threshold, 0.05);
	}

	#[test]
	fn unrecognized_engine_kind_defaults_to_chromium() {
		let config: Config = serde_json::from_str(r#"{"engineKind": "netscape"}"#).unwrap();
		assert_eq!(config.engine(), EngineKind::Chromium);
	}

	#[test]
	fn from_file_reports_missing_and_malformed_files() {
		let dir = tempfile::tempdir().unwrap();

		let err = Config::from_file(&dir.path().join("absent.json")).unwrap_err();
		assert!(err.to_string().contains("cannot read"));

		let bad = dir.path().join("bad.json");
		std::fs::write(&bad, "not json").unwrap();
		let err = Config::from_file(&bad).unwrap_err();
		assert!(err.to_string().contains("cannot parse"));
	}
}
