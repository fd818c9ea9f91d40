//! Command-line interface parsing for the welcome dashboard
//!
//! Running `welcome` with no subcommand prints the dashboard. The `config`
//! and `cache` subcommands are small maintenance actions that print a result
//! and exit.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cache::CacheManager;
use crate::config::Config;

/// Error types for the maintenance subcommands
#[derive(Debug, Error)]
pub enum CliError {
    /// `config init` would overwrite an existing file
    #[error("config file already exists at {0} (use --force to overwrite)")]
    ConfigExists(PathBuf),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Welcome dashboard - a quick status page for every new terminal
#[derive(Parser, Debug)]
#[command(name = "welcome")]
#[command(about = "Personalized terminal startup dashboard")]
#[command(version)]
pub struct Cli {
    /// Read configuration from PATH instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log debug detail to the log file in the cache directory
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    /// Manage cached API responses
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the config file location
    Path,
    /// Print the effective configuration (the default)
    Show,
    /// Write a config file populated with the defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// Delete every cache entry
    Clear,
    /// Delete entries older than `cache.prune_after_days`
    Prune,
}

impl Cli {
    /// The config file this invocation uses
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::default_config_path)
    }
}

/// Runs a maintenance subcommand, returning the text to print
///
/// `config` is the configuration already loaded from `config_path`.
pub fn run_command(
    command: &Command,
    config: &Config,
    config_path: &Path,
) -> Result<String, CliError> {
    match command {
        Command::Config { action } => {
            run_config(action.unwrap_or(ConfigAction::Show), config, config_path)
        }
        Command::Cache { action } => Ok(run_cache(*action, config)),
    }
}

fn run_config(
    action: ConfigAction,
    config: &Config,
    config_path: &Path,
) -> Result<String, CliError> {
    match action {
        ConfigAction::Path => Ok(config_path.display().to_string()),
        ConfigAction::Show => {
            let mut shown = config.clone();
            redact(&mut shown);
            Ok(shown.to_toml_string()?)
        }
        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                return Err(CliError::ConfigExists(config_path.to_path_buf()));
            }
            let content = Config::default().to_toml_string()?;
            write_file(config_path, &content)?;
            Ok(format!("Wrote default config to {}", config_path.display()))
        }
    }
}

fn run_cache(action: CacheAction, config: &Config) -> String {
    let cache = CacheManager::with_dir(config.cache_dir());
    match action {
        CacheAction::Clear => {
            let removed = cache.clear();
            format!("Removed {} cache entries from {}", removed, cache.dir().display())
        }
        CacheAction::Prune => match config.cache.prune_after() {
            Some(age) => {
                let removed = cache.prune(age);
                format!("Removed {} stale cache entries", removed)
            }
            None => "Pruning is disabled (cache.prune_after_days = 0)".to_string(),
        },
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), CliError> {
    let to_error = |source| CliError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(to_error)?;
    }
    fs::write(path, content).map_err(to_error)
}

/// Hides credentials so `config show` output is safe to paste
fn redact(config: &mut Config) {
    for secret in [&mut config.github.token, &mut config.linear.api_key] {
        if secret.is_some() {
            *secret = Some("<redacted>".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["welcome"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["welcome", "cache", "clear", "--config", "/tmp/w.toml", "-v"]);
        assert_eq!(
            cli.command,
            Some(Command::Cache {
                action: CacheAction::Clear
            })
        );
        assert_eq!(cli.config_path(), PathBuf::from("/tmp/w.toml"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parse_config_without_action() {
        let cli = Cli::parse_from(["welcome", "config"]);
        assert_eq!(cli.command, Some(Command::Config { action: None }));
    }

    #[test]
    fn test_cli_parse_init_force() {
        let cli = Cli::parse_from(["welcome", "config", "init", "--force"]);
        assert_eq!(
            cli.command,
            Some(Command::Config {
                action: Some(ConfigAction::Init { force: true })
            })
        );
    }

    #[test]
    fn test_cli_rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["welcome", "frobnicate"]).is_err());
    }

    #[test]
    fn test_init_writes_defaults_and_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sub").join("config.toml");

        let config = Config::default();
        let message = run_config(ConfigAction::Init { force: false }, &config, &path).unwrap();
        assert!(message.contains("config.toml"));
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(Config::from_toml_str(&written), Config::default());

        let err = run_config(ConfigAction::Init { force: false }, &config, &path).unwrap_err();
        assert!(matches!(err, CliError::ConfigExists(_)));
        assert!(err.to_string().contains("--force"));

        assert!(run_config(ConfigAction::Init { force: true }, &config, &path).is_ok());
    }

    #[test]
    fn test_show_redacts_credentials() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[github]\ntoken = \"ghp_secret\"\n").unwrap();

        let config = Config::load(&path);
        let shown = run_config(ConfigAction::Show, &config, &path).unwrap();

        assert!(!shown.contains("ghp_secret"));
        assert!(shown.contains("<redacted>"));
    }

    #[test]
    fn test_path_prints_location() {
        let path = PathBuf::from("/etc/welcome/config.toml");
        assert_eq!(
            run_config(ConfigAction::Path, &Config::default(), &path).unwrap(),
            "/etc/welcome/config.toml"
        );
    }

    #[test]
    fn test_run_command_uses_the_given_config() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.cache.directory = Some(temp_dir.path().to_path_buf());
        CacheManager::with_dir(temp_dir.path().to_path_buf()).put("entry", &1);
        let unread_path = temp_dir.path().join("missing.toml");

        let command = Command::Cache {
            action: CacheAction::Clear,
        };
        let output = run_command(&command, &config, &unread_path).unwrap();

        assert!(output.starts_with("Removed 1 cache entries"));
    }

    #[test]
    fn test_cache_clear_and_prune() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.cache.directory = Some(temp_dir.path().to_path_buf());
        let cache = CacheManager::with_dir(temp_dir.path().to_path_buf());
        cache.put("a", &1);
        cache.put("b", &2);

        assert_eq!(run_cache(CacheAction::Prune, &config), "Removed 0 stale cache entries");
        assert!(run_cache(CacheAction::Clear, &config).starts_with("Removed 2 cache entries"));

        config.cache.prune_after_days = 0;
        assert!(run_cache(CacheAction::Prune, &config).contains("disabled"));
    }
}
