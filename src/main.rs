//! Welcome - a personalized dashboard printed when a terminal opens
//!
//! Prints a greeting, system facts, the weather and work items from GitHub and
//! Linear. Every module degrades to a short note when its data is unavailable,
//! so the dashboard itself always exits cleanly.

use clap::Parser;
use std::process::ExitCode;

use welcome_dash::app::App;
use welcome_dash::cli::{self, Cli};
use welcome_dash::config::Config;
use welcome_dash::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    let config_path = args.config_path();

    let (config, warnings) = Config::load_with_warnings(&config_path);
    logging::init_logging(&config.cache_dir(), args.verbose);
    for warning in warnings {
        tracing::warn!("{}", warning);
    }

    if let Some(command) = &args.command {
        return match cli::run_command(command, &config, &config_path) {
            Ok(output) => {
                println!("{}", output);
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "command failed");
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let mut app = App::new(config);
    app.prepare_cache();
    let output = app.run().await;
    print!("{}", output);
    ExitCode::SUCCESS
}
