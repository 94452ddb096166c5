use clap::Parser;
use harness_bootstrap::run_log::{RunLog, Severity, artifact_path};
use harness_bootstrap::{bootstrap, cli::Cli, config::Config, logging};
use tracing::{error, info};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let config = match Config::from_file(&cli.config) {
		Ok(config) => config,
		Err(err) => {
			error!(target = "bootstrap", error = %err, "failed to load config");
			std::process::exit(1);
		}
	};

	let mut log = RunLog::new(artifact_path(&config.output_dir));

	match bootstrap::run(&config, &mut log).await {
		Ok(context) => {
			info!(
				target = "bootstrap",
				endpoint = %context.descriptor.connection_endpoint,
				descriptor = %context.descriptor_path.display(),
				"bootstrap complete"
			);
			// The launched browser server (if any) outlives this
			// process; workers reconnect through the endpoint in the
			// descriptor and teardown happens in a separate step.
		}
		Err(err) if err.is_fatal_acquisition() => {
			log.log(Severity::Error, err.to_string(), true);
			log.flush_then_terminate(1).await;
		}
		Err(err) => {
			error!(target = "bootstrap", error = %err, "bootstrap failed");
			std::process::exit(1);
		}
	}
}
