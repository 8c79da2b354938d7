/*!
 * broom - scheduled file maintenance
 *
 * Thin orchestrator around the engine: parse arguments, load the TOML
 * config, initialize logging, run the maintenance pipeline, raise a
 * desktop popup when the backup gate rejects the destination, and prune
 * old logs on the way out.
 */

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use tracing::{info, warn};

use broom::config::MaintenanceConfig;
use broom::notify::{DesktopNotifier, Notifier};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // logging may not be up yet, or may be pointed at a file
            eprintln!("broom: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let matches = Command::new("broom")
        .version(broom::VERSION)
        .about("Scheduled cleanup of aged files with copy-before-delete backup")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to the TOML configuration file")
                .required(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log at debug level")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(PathBuf::from)
        .context("--config is required")?;

    let mut config = MaintenanceConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if matches.get_flag("verbose") {
        config.verbose = true;
    }

    let log_path = broom::logging::init_logging(&config).context("initializing logging")?;
    if let Some(path) = &log_path {
        info!(path = %path.display(), "logging to file");
    }

    let result = broom::run(&config);

    // prune after the engine completes, whatever its result; pruner
    // failures never change the run's exit status
    if let Some(log_dir) = &config.log_dir {
        if let Err(e) = broom::core::prune::prune_logs(log_dir, config.log_retention_days) {
            warn!(error = %e, "log pruning failed");
        }
    }

    match result {
        Ok(report) => {
            info!(
                processed = report.processed,
                duration_ms = report.duration.as_millis() as u64,
                "done"
            );
            Ok(())
        }
        Err(e) => {
            if e.is_gate() {
                DesktopNotifier.notify(
                    "broom: backup check failed",
                    &format!("{}\nNo files were deleted.", e),
                );
            }
            Err(e).context("maintenance run failed")
        }
    }
}
