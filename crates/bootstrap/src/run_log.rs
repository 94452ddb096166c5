//! Append-only diagnostic log with durable flush and the fatal-exit
//! protocol.
//!
//! Entries accumulate in memory in chronological order; the subset
//! flagged for persistence is appended to a JSON-lines artifact on
//! flush. Fatal setup failures must go through [`RunLog::flush_then_terminate`]
//! so diagnostics are on disk and stdio has drained before the process
//! dies.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// File name of the durable log artifact inside the run output dir.
pub const LOG_ARTIFACT_FILE: &str = "bootstrap-logs.jsonl";

/// Grace period between flush and process termination, letting any
/// attached process monitor observe buffered console output.
pub const FATAL_EXIT_GRACE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
	Info,
	Warning,
	Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
	pub severity: Severity,
	pub message: String,
	pub timestamp_ms: u64,
	#[serde(skip_serializing, default)]
	pub persist: bool,
}

/// Path of the log artifact for a given run output directory.
pub fn artifact_path(output_dir: &Path) -> PathBuf {
	output_dir.join(LOG_ARTIFACT_FILE)
}

#[derive(Debug)]
pub struct RunLog {
	entries: Vec<LogEntry>,
	artifact_path: PathBuf,
}

impl RunLog {
	pub fn new(artifact_path: PathBuf) -> Self {
		Self {
			entries: Vec::new(),
			artifact_path,
		}
	}

	/// Appends an entry and mirrors it to the console via `tracing`.
	pub fn log(&mut self, severity: Severity, message: impl Into<String>, persist: bool) {
		let message = message.into();
		match severity {
			Severity::Info => tracing::info!(target = "bootstrap", "{message}"),
			Severity::Warning => tracing::warn!(target = "bootstrap", "{message}"),
			Severity::Error => tracing::error!(target = "bootstrap", "{message}"),
		}
		self.entries.push(LogEntry {
			severity,
			message,
			timestamp_ms: now_ms(),
			persist,
		});
	}

	pub fn entries(&self) -> &[LogEntry] {
		&self.entries
	}

	/// Appends all persist-flagged entries, in append order, to the log
	/// artifact. Pre-existing content is kept.
	pub fn flush(&self) -> Result<()> {
		if let Some(parent) = self.artifact_path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		let mut file = OpenOptions::new().create(true).append(true).open(&self.artifact_path)?;
		for entry in self.entries.iter().filter(|e| e.persist) {
			let line = serde_json::to_string(entry)?;
			writeln!(file, "{line}")?;
		}
		file.sync_all()?;
		Ok(())
	}

	/// Terminal operation for fatal setup failures: flush the durable
	/// log, wait out the grace period, then exit with `code`.
	///
	/// The sequence is mandatory; a flush failure at this point can
	/// only be reported to the console. Does not return.
	pub async fn flush_then_terminate(&self, code: i32) {
		if let Err(err) = self.flush() {
			tracing::error!(target = "bootstrap", error = %err, "failed to flush log artifact");
		}
		tokio::time::sleep(FATAL_EXIT_GRACE).await;
		std::process::exit(code);
	}
}

pub(crate) fn now_ms() -> u64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.unwrap_or_default()
		.as_millis() as u64
}

#[cfg(test)]
mod tests {
	use tempfile::tempdir;

	use super::*;

	#[test]
	fn entries_keep_chronological_order() {
		let dir = tempdir().unwrap();
		let mut log = RunLog::new(artifact_path(dir.path()));
		log.log(Severity::Info, "first", false);
		log.log(Severity::Warning, "second", true);
		log.log(Severity::Error, "third", true);

		let messages: Vec<&str> = log.entries().iter().map(|e| e.message.as_str()).collect();
		assert_eq!(messages, ["first", "second", "third"]);
	}

	#[test]
	fn flush_writes_only_persist_flagged_entries() {
		let dir = tempdir().unwrap();
		let mut log = RunLog::new(artifact_path(dir.path()));
		log.log(Severity::Info, "console only", false);
		log.log(Severity::Error, "kept", true);
		log.flush().unwrap();

		let content = std::fs::read_to_string(artifact_path(dir.path())).unwrap();
		let lines: Vec<&str> = content.lines().collect();
		assert_eq!(lines.len(), 1);

		let entry: LogEntry = serde_json::from_str(lines[0]).unwrap();
		assert_eq!(entry.severity, Severity::Error);
		assert_eq!(entry.message, "kept");
	}

	#[test]
	fn flush_appends_to_existing_artifact() {
		let dir = tempdir().unwrap();
		let path = artifact_path(dir.path());
		std::fs::write(&path, "{\"earlier\":true}\n").unwrap();

		let mut log = RunLog::new(path.clone());
		log.log(Severity::Error, "later run", true);
		log.flush().unwrap();

		let content = std::fs::read_to_string(&path).unwrap();
		let lines: Vec<&str> = content.lines().collect();
		assert_eq!(lines.len(), 2);
		assert!(lines[0].contains("earlier"));
		assert!(lines[1].contains("later run"));
	}

	#[test]
	fn flush_creates_missing_output_dir() {
		let dir = tempdir().unwrap();
		let nested = dir.path().join("out").join("deep");
		let mut log = RunLog::new(artifact_path(&nested));
		log.log(Severity::Error, "entry", true);
		log.flush().unwrap();
		assert!(artifact_path(&nested).exists());
	}

	#[test]
	fn severity_serializes_lowercase() {
		assert_eq!(serde_json::to_string(&Severity::Warning).unwrap(), "\"warning\"");
	}
}
