//! Dashboard configuration
//!
//! The config is a TOML file (`~/.config/welcome-dash/config.toml` on Linux).
//! Every field has a default. User values are laid over the defaults one at a
//! time and a value that would make the config invalid is dropped with a
//! warning, so a typo in one setting never costs the rest of the file.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Module names in their default display order
pub const DEFAULT_MODULES: &[&str] = &["greeting", "system", "weather", "github", "stalled"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Modules to run, in display order
    pub enabled_modules: Vec<String>,
    pub user: UserConfig,
    pub weather: WeatherConfig,
    pub github: GithubConfig,
    pub linear: LinearConfig,
    pub system: SystemConfig,
    pub cache: CacheConfig,
    pub display: DisplayConfig,
    pub performance: PerformanceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled_modules: DEFAULT_MODULES.iter().map(|m| m.to_string()).collect(),
            user: UserConfig::default(),
            weather: WeatherConfig::default(),
            github: GithubConfig::default(),
            linear: LinearConfig::default(),
            system: SystemConfig::default(),
            cache: CacheConfig::default(),
            display: DisplayConfig::default(),
            performance: PerformanceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Name used by the greeting; `$USER` when unset
    pub name: Option<String>,
    /// Replaces the time-of-day greeting line
    pub greeting: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// City or place name, resolved through the geocoding API
    pub location: Option<String>,
    pub units: Units,
    pub geocoding_url: String,
    pub forecast_url: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            location: None,
            units: Units::Metric,
            geocoding_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Personal access token; `$GITHUB_TOKEN` when unset
    pub token: Option<String>,
    /// Login to query; resolved from the token when unset
    pub username: Option<String>,
    pub api_url: String,
    pub show_review_requests: bool,
    pub show_pull_requests: bool,
    pub show_assigned_issues: bool,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            username: None,
            api_url: "https://api.github.com".to_string(),
            show_review_requests: true,
            show_pull_requests: true,
            show_assigned_issues: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearConfig {
    /// API key; `$LINEAR_API_KEY` when unset
    pub api_key: Option<String>,
    pub api_url: String,
    /// Team keys or names; empty means every team
    pub teams: Vec<String>,
    /// An in-progress issue untouched for this many days counts as stalled
    pub stalled_after_days: u32,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://api.linear.app/graphql".to_string(),
            teams: Vec::new(),
            stalled_after_days: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub show_hostname: bool,
    pub show_os: bool,
    pub show_kernel: bool,
    pub show_uptime: bool,
    pub show_load: bool,
    pub show_memory: bool,
    pub show_shell: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            show_hostname: true,
            show_os: true,
            show_kernel: true,
            show_uptime: true,
            show_load: true,
            show_memory: true,
            show_shell: true,
        }
    }
}

/// Max-age per data category, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Overrides the XDG cache directory
    pub directory: Option<PathBuf>,
    pub weather_secs: u64,
    pub geocode_secs: u64,
    pub github_secs: u64,
    pub github_user_secs: u64,
    pub linear_secs: u64,
    pub linear_teams_secs: u64,
    /// Entries older than this are deleted at startup; 0 keeps everything
    pub prune_after_days: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: None,
            weather_secs: 15 * 60,
            geocode_secs: 30 * 24 * 3600,
            github_secs: 5 * 60,
            github_user_secs: 24 * 3600,
            linear_secs: 10 * 60,
            linear_teams_secs: 24 * 3600,
            prune_after_days: 30,
        }
    }
}

impl CacheConfig {
    pub fn weather(&self) -> Duration {
        Duration::from_secs(self.weather_secs)
    }

    pub fn geocode(&self) -> Duration {
        Duration::from_secs(self.geocode_secs)
    }

    pub fn github(&self) -> Duration {
        Duration::from_secs(self.github_secs)
    }

    pub fn github_user(&self) -> Duration {
        Duration::from_secs(self.github_user_secs)
    }

    pub fn linear(&self) -> Duration {
        Duration::from_secs(self.linear_secs)
    }

    pub fn linear_teams(&self) -> Duration {
        Duration::from_secs(self.linear_teams_secs)
    }

    pub fn prune_after(&self) -> Option<Duration> {
        (self.prune_after_days > 0)
            .then(|| Duration::from_secs(self.prune_after_days.saturating_mul(24 * 3600)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub colors: bool,
    /// Items listed per section in the GitHub and Linear modules
    pub max_items: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            colors: true,
            max_items: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Run module setup and display concurrently
    pub parallel: bool,
    /// Per-module deadline for setup and for display; 0 disables it
    pub max_execution_ms: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            max_execution_ms: 5000,
        }
    }
}

impl PerformanceConfig {
    pub fn max_execution_time(&self) -> Option<Duration> {
        (self.max_execution_ms > 0).then(|| Duration::from_millis(self.max_execution_ms))
    }
}

/// `~/.config/welcome-dash/config.toml` or its platform equivalent
pub fn default_config_path() -> PathBuf {
    ProjectDirs::from("", "", "welcome-dash")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("welcome-dash.toml"))
}

impl Config {
    /// Loads the config at `path`, falling back to defaults on any problem
    ///
    /// Problems are logged as warnings. Credentials missing from the file are
    /// filled from the environment.
    pub fn load(path: &Path) -> Self {
        let (config, warnings) = Self::load_with_warnings(path);
        for warning in warnings {
            tracing::warn!("{}", warning);
        }
        config
    }

    /// Like [`Config::load`], but hands the warnings back instead of logging
    /// them, for callers that set up logging from the loaded config
    pub fn load_with_warnings(path: &Path) -> (Self, Vec<String>) {
        let (mut config, warnings) = match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (Self::default(), Vec::new()),
            Err(e) => (
                Self::default(),
                vec![format!("failed to read config {}: {}, using defaults", path.display(), e)],
            ),
        };
        config.apply_env(|name| std::env::var(name).ok());
        (config, warnings)
    }

    /// Parses a TOML document, keeping every valid value and defaulting the rest
    pub fn from_toml_str(content: &str) -> Self {
        let (config, warnings) = Self::parse(content);
        for warning in warnings {
            tracing::warn!("{}", warning);
        }
        config
    }

    fn parse(content: &str) -> (Self, Vec<String>) {
        let user: toml::Table = match content.parse() {
            Ok(table) => table,
            Err(e) => {
                return (
                    Self::default(),
                    vec![format!("config is not valid TOML ({}), using defaults", e.message())],
                );
            }
        };

        let (config, rejected) = overlay_on_defaults(user);
        let warnings = rejected
            .into_iter()
            .map(|key| format!("invalid value for config key `{}`, using default", key))
            .collect();
        (config, warnings)
    }

    /// Fills absent credentials from environment variables
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if non_empty(&self.github.token).is_none() {
            self.github.token = lookup("GITHUB_TOKEN").filter(|v| !v.trim().is_empty());
        }
        if non_empty(&self.linear.api_key).is_none() {
            self.linear.api_key = lookup("LINEAR_API_KEY").filter(|v| !v.trim().is_empty());
        }
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Cache directory from the config, or the XDG default
    pub fn cache_dir(&self) -> PathBuf {
        self.cache
            .directory
            .clone()
            .unwrap_or_else(crate::cache::default_cache_dir)
    }
}

/// Treats blank strings the same as unset ones
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Lays each user leaf value over the defaults, keeping it only if the result
/// still deserializes. Returns the config and the dotted keys that were dropped.
fn overlay_on_defaults(user: toml::Table) -> (Config, Vec<String>) {
    let defaults = Config::default();
    let mut merged = match toml::Value::try_from(&defaults) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize default config");
            return (defaults, Vec::new());
        }
    };

    let mut leaves = Vec::new();
    collect_leaves(&mut Vec::new(), toml::Value::Table(user), &mut leaves);

    let mut rejected = Vec::new();
    for (path, value) in leaves {
        let mut candidate = merged.clone();
        set_path(&mut candidate, &path, value);
        if candidate.clone().try_into::<Config>().is_ok() {
            merged = candidate;
        } else {
            rejected.push(path.join("."));
        }
    }

    let config = merged.try_into().unwrap_or(defaults);
    (config, rejected)
}

fn collect_leaves(
    prefix: &mut Vec<String>,
    value: toml::Value,
    out: &mut Vec<(Vec<String>, toml::Value)>,
) {
    match value {
        toml::Value::Table(table) => {
            for (key, value) in table {
                prefix.push(key);
                collect_leaves(prefix, value, out);
                prefix.pop();
            }
        }
        leaf => out.push((prefix.clone(), leaf)),
    }
}

fn set_path(root: &mut toml::Value, path: &[String], value: toml::Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut node = root;
    for key in parents {
        let toml::Value::Table(table) = node else {
            return;
        };
        node = table
            .entry(key.clone())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
    }

    if let toml::Value::Table(table) = node {
        table.insert(last.clone(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_enabled_modules_order() {
        let config = Config::default();
        assert_eq!(
            config.enabled_modules,
            vec!["greeting", "system", "weather", "github", "stalled"]
        );
    }

    #[test]
    fn test_empty_document_gives_defaults() {
        assert_eq!(Config::from_toml_str(""), Config::default());
    }

    #[test]
    fn test_invalid_toml_gives_defaults() {
        assert_eq!(Config::from_toml_str("this is = = not toml"), Config::default());
    }

    #[test]
    fn test_valid_values_are_applied() {
        let config = Config::from_toml_str(
            r#"
            enabled_modules = ["weather", "greeting"]

            [user]
            name = "Sam"

            [weather]
            location = "Vancouver"
            units = "imperial"

            [performance]
            parallel = true
            "#,
        );

        assert_eq!(config.enabled_modules, vec!["weather", "greeting"]);
        assert_eq!(config.user.name.as_deref(), Some("Sam"));
        assert_eq!(config.weather.location.as_deref(), Some("Vancouver"));
        assert_eq!(config.weather.units, Units::Imperial);
        assert!(config.performance.parallel);
    }

    #[test]
    fn test_invalid_value_falls_back_without_losing_siblings() {
        let config = Config::from_toml_str(
            r#"
            [weather]
            location = "Oslo"
            units = "kelvin"

            [cache]
            weather_secs = "soon"
            github_secs = 60
            "#,
        );

        assert_eq!(config.weather.location.as_deref(), Some("Oslo"));
        assert_eq!(config.weather.units, Units::Metric);
        assert_eq!(config.cache.weather_secs, CacheConfig::default().weather_secs);
        assert_eq!(config.cache.github_secs, 60);
    }

    #[test]
    fn test_section_replaced_by_scalar_is_rejected() {
        let (config, rejected) = overlay_on_defaults("display = 3".parse().unwrap());

        assert_eq!(config.display, DisplayConfig::default());
        assert_eq!(rejected, vec!["display".to_string()]);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = Config::from_toml_str(
            r#"
            theme = "dark"
            [display]
            max_items = 3
            "#,
        );
        assert_eq!(config.display.max_items, 3);
    }

    #[test]
    fn test_apply_env_fills_missing_credentials_only() {
        let mut config = Config::default();
        config.linear.api_key = Some("from-file".to_string());

        config.apply_env(|name| match name {
            "GITHUB_TOKEN" => Some("gh-env".to_string()),
            "LINEAR_API_KEY" => Some("linear-env".to_string()),
            _ => None,
        });

        assert_eq!(config.github.token.as_deref(), Some("gh-env"));
        assert_eq!(config.linear.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let (config, warnings) = Config::load_with_warnings(&temp_dir.path().join("absent.toml"));
        assert_eq!(config.enabled_modules, Config::default().enabled_modules);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_load_reports_rejected_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[display]\nmax_items = -3\n").unwrap();

        let (config, warnings) = Config::load_with_warnings(&path);

        assert_eq!(config.display.max_items, 5);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("display.max_items"));
    }

    #[test]
    fn test_default_config_roundtrips_through_toml() {
        let text = Config::default().to_toml_string().unwrap();
        assert_eq!(Config::from_toml_str(&text), Config::default());
    }

    #[test]
    fn test_duration_helpers() {
        let mut performance = PerformanceConfig::default();
        assert_eq!(performance.max_execution_time(), Some(Duration::from_millis(5000)));
        performance.max_execution_ms = 0;
        assert_eq!(performance.max_execution_time(), None);

        let mut cache = CacheConfig::default();
        cache.prune_after_days = 0;
        assert_eq!(cache.prune_after(), None);
    }

    #[test]
    fn test_huge_prune_age_saturates() {
        let config = Config::from_toml_str("[cache]\nprune_after_days = 1000000000000000\n");

        assert_eq!(config.cache.prune_after_days, 1_000_000_000_000_000);
        assert_eq!(config.cache.prune_after(), Some(Duration::from_secs(u64::MAX)));
    }

    #[test]
    fn test_non_empty_treats_blank_as_unset() {
        assert_eq!(non_empty(&Some("  ".to_string())), None);
        assert_eq!(non_empty(&Some(" x ".to_string())), Some("x"));
        assert_eq!(non_empty(&None), None);
    }
}
