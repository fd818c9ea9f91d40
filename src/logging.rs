//! Log sink setup
//!
//! The dashboard owns stdout, so log lines go to `welcome.log` in the cache
//! directory instead. `RUST_LOG` overrides the default filter.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE_NAME: &str = "welcome.log";

/// Default filter directive for the given verbosity
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "welcome_dash=debug,welcome=debug"
    } else {
        "welcome_dash=warn,welcome=warn"
    }
}

/// Initialize logging into `<log_dir>/welcome.log`.
///
/// Must be called once, before any module runs. When the log file cannot be
/// opened the subscriber writes nowhere rather than cluttering the terminal.
pub fn init_logging(log_dir: &Path, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let file = fs::create_dir_all(log_dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join(LOG_FILE_NAME))
    });

    let builder = fmt().with_env_filter(filter).with_ansi(false).with_target(false);
    match file {
        Ok(file) => {
            let _ = builder.with_writer(Mutex::new(file)).try_init();
        }
        Err(_) => {
            let _ = builder.with_writer(std::io::sink).try_init();
        }
    }
}
