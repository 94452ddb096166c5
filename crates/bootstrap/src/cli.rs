use std::path::PathBuf;

use clap::Parser;

/// Bootstrap shell. Config resolution happens upstream; this binary
/// only receives the path to an already-resolved config file.
#[derive(Parser, Debug)]
#[command(name = "harness-bootstrap")]
#[command(about = "Acquire a shared browser session for a distributed test run")]
#[command(version)]
pub struct Cli {
	/// Path to the resolved bootstrap config (JSON).
	#[arg(long, value_name = "FILE")]
	pub config: PathBuf,

	/// Increase verbosity (-v debug, -vv trace)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn cli_definition_is_consistent() {
		Cli::command().debug_assert();
	}

	#[test]
	fn config_path_is_required() {
		let parsed = Cli::try_parse_from(["harness-bootstrap"]);
		assert!(parsed.is_err());

		let parsed = Cli::try_parse_from(["harness-bootstrap", "--config", "run.json", "-vv"]).unwrap();
		assert_eq!(parsed.config, PathBuf::from("run.json"));
		assert_eq!(parsed.verbose, 2);
	}
}
