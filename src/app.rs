//! One dashboard run: config in, welcome text out
//!
//! `App` owns the loaded config and the module registry. `run` drives every
//! enabled module through setup, display and cleanup and returns the text to
//! print.

use reqwest::Client;
use std::time::Duration;

use crate::cache::CacheManager;
use crate::config::Config;
use crate::modules::builtin_modules;
use crate::registry::ModuleRegistry;

/// Applies to every API request, independent of the per-module deadline
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub struct App {
    pub config: Config,
    registry: ModuleRegistry,
}

impl App {
    /// Creates an app with the built-in modules, caching under the config's
    /// cache directory
    pub fn new(config: Config) -> Self {
        let cache = CacheManager::with_dir(config.cache_dir());
        Self::with_parts(config, http_client(), cache)
    }

    /// Creates an app with an explicit HTTP client and cache (for testing)
    pub fn with_parts(config: Config, http: Client, cache: CacheManager) -> Self {
        Self::with_registry(config, ModuleRegistry::with_modules(builtin_modules(http, cache)))
    }

    pub fn with_registry(config: Config, registry: ModuleRegistry) -> Self {
        Self { config, registry }
    }

    /// Prepares the cache directory and drops entries past the configured age
    pub fn prepare_cache(&self) {
        let cache = CacheManager::with_dir(self.config.cache_dir());
        if let Err(e) = cache.ensure_dir() {
            tracing::error!(dir = %cache.dir().display(), error = %e, "failed to create cache directory");
            return;
        }
        if let Some(age) = self.config.cache.prune_after() {
            let removed = cache.prune(age);
            if removed > 0 {
                tracing::debug!(removed, "pruned stale cache entries");
            }
        }
    }

    /// Sets up, renders and cleans up every enabled module
    pub async fn run(&mut self) -> String {
        self.registry.setup_modules(&self.config).await;
        let output = self.registry.display_welcome(&self.config).await;
        self.registry.cleanup_modules(&self.config).await;
        output
    }
}

/// Shared HTTP client; GitHub rejects requests without a user agent
pub fn http_client() -> Client {
    Client::builder()
        .user_agent(concat!("welcome-dash/", env!("CARGO_PKG_VERSION")))
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to build HTTP client, using defaults");
            Client::new()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir, modules: &[&str]) -> Config {
        let mut config = Config::default();
        config.enabled_modules = modules.iter().map(|m| m.to_string()).collect();
        config.cache.directory = Some(dir.path().to_path_buf());
        config.display.colors = false;
        config
    }

    #[tokio::test]
    async fn test_run_greeting_only() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config_in(&temp_dir, &["greeting"]);
        config.user.name = Some("Robin".to_string());
        config.user.greeting = Some("Welcome aboard, {name}!".to_string());

        let mut app = App::new(config);
        let output = app.run().await;

        assert!(output.starts_with("\nWelcome aboard, Robin!\n"));
        assert!(output.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_run_unknown_modules_only() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = App::new(config_in(&temp_dir, &["nope"]));

        assert_eq!(app.run().await, "\n\n");
    }

    #[tokio::test]
    async fn test_unconfigured_remote_modules_make_no_requests() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config_in(&temp_dir, &["weather", "github", "stalled"]);
        config.github.token = None;
        config.linear.api_key = None;
        config.weather.location = None;

        let mut app = App::with_parts(
            config,
            Client::new(),
            CacheManager::with_dir(temp_dir.path().to_path_buf()),
        );
        let output = app.run().await;

        assert!(output.contains("Weather: not configured"));
        assert!(output.contains("GitHub: not configured"));
        assert!(output.contains("Stalled issues: not configured"));
    }

    #[test]
    fn test_prepare_cache_prunes_old_entries() {
        let temp_dir = TempDir::new().unwrap();
        let cache_dir = temp_dir.path().join("cache");
        let mut config = Config::default();
        config.cache.directory = Some(cache_dir.clone());
        config.cache.prune_after_days = 1;

        fs::create_dir_all(&cache_dir).unwrap();
        fs::write(
            cache_dir.join("old.json"),
            r#"{"data": 1, "cached_at": "2000-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        CacheManager::with_dir(cache_dir.clone()).put("fresh", &2);

        App::new(config).prepare_cache();

        assert!(!cache_dir.join("old.json").exists());
        assert!(cache_dir.join("fresh.json").exists());
    }

    #[test]
    fn test_prepare_cache_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let cache_dir = temp_dir.path().join("nested").join("cache");
        let mut config = Config::default();
        config.cache.directory = Some(cache_dir.clone());

        App::new(config).prepare_cache();

        assert!(cache_dir.is_dir());
    }
}
