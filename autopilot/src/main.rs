use aviatron_autopilot::{Autopilot, Config};
use clap::{Arg, Command};
use commonware_runtime::{tokio, Metrics, Runner};
use std::str::FromStr;
use tracing::{error, info, Level};

fn main() {
    // Parse arguments
    let matches = Command::new("autopilot")
        .about("Play aviatron rounds on a risk preset.")
        .arg(Arg::new("config").long("config").required(true))
        .get_matches();

    // Load from config file
    let config_file = matches.get_one::<String>("config").unwrap();
    let config_file = std::fs::read_to_string(config_file).expect("Could not read config file");
    let config: Config = serde_yaml::from_str(&config_file).expect("Could not parse config file");

    // Initialize runtime
    let cfg = tokio::Config::default()
        .with_worker_threads(config.worker_threads)
        .with_catch_panics(true);
    let executor = tokio::Runner::new(cfg);

    // Start runtime
    executor.start(|context| async move {
        // Setup logging
        let level = Level::from_str(&config.log_level).expect("Invalid log level");
        tokio::telemetry::init(
            context.with_label("telemetry"),
            tokio::telemetry::Logging { level, json: false },
            None, // no metrics
            None, // no dashboard
        );
        info!(
            risk = ?config.risk,
            rounds = config.rounds,
            seed = config.seed,
            "Starting autopilot"
        );

        if let Err(err) = Autopilot::new(context, config).run().await {
            error!(%err, "Autopilot failed");
        }
    });
}
