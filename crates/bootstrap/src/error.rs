use std::path::PathBuf;

use thiserror::Error;

use crate::engine::EngineKind;

pub type Result<T> = std::result::Result<T, BootstrapError>;

#[derive(Debug, Error)]
pub enum BootstrapError {
	/// Remote discovery or attach failed. Always fatal to the bootstrap.
	#[error("remote attach failed against {url}")]
	Connection {
		url: String,
		#[source]
		source: anyhow::Error,
	},

	/// Local browser server failed to start. Always fatal to the bootstrap.
	#[error("local launch failed for engine {} at path {}", .engine, .path.display())]
	Launch {
		engine: EngineKind,
		path: PathBuf,
		#[source]
		source: anyhow::Error,
	},

	#[error("invalid bootstrap config: {0}")]
	Config(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl BootstrapError {
	/// Returns `true` for errors that must go through the
	/// flush-then-wait-then-exit protocol rather than a plain exit.
	pub fn is_fatal_acquisition(&self) -> bool {
		matches!(self, BootstrapError::Connection { .. } | BootstrapError::Launch { .. })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn connection_error_names_the_configured_url() {
		let err = BootstrapError::Connection {
			url: "http://localhost:9222".into(),
			source: anyhow::anyhow!("connection refused"),
		};
		assert_eq!(err.to_string(), "remote attach failed against http://localhost:9222");
		assert!(err.is_fatal_acquisition());
	}

	#[test]
	fn launch_error_names_engine_and_path() {
		let err = BootstrapError::Launch {
			engine: EngineKind::Firefox,
			path: PathBuf::from("/opt/firefox/firefox"),
			source: anyhow::anyhow!("spawn failed"),
		};
		assert_eq!(
			err.to_string(),
			"local launch failed for engine firefox at path /opt/firefox/firefox"
		);
		assert!(err.is_fatal_acquisition());
	}

	#[test]
	fn io_errors_are_not_fatal_acquisition_errors() {
		let err = BootstrapError::Io(std::io::Error::other("disk gone"));
		assert!(!err.is_fatal_acquisition());
	}
}
