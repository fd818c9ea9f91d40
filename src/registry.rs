//! Module registry and the welcome orchestration
//!
//! The registry owns every module by name. `enabled_modules` in the config
//! decides which of them run and in what order; output always follows that
//! order, whether modules run one after another or concurrently.

use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::modules::{Module, ModuleError};

#[derive(Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Box<dyn Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the given modules
    pub fn with_modules(modules: impl IntoIterator<Item = Box<dyn Module>>) -> Self {
        let mut registry = Self::new();
        for module in modules {
            registry.register(module);
        }
        registry
    }

    /// Adds a module under its name, replacing any module already registered with it
    pub fn register(&mut self, module: Box<dyn Module>) {
        let name = module.name().to_string();
        if self.modules.insert(name.clone(), module).is_some() {
            tracing::debug!(module = %name, "replaced previously registered module");
        }
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Configured names that have a registered module, first occurrence only
    fn enabled_names(&self, config: &Config) -> Vec<String> {
        let mut seen = HashSet::new();
        config
            .enabled_modules
            .iter()
            .filter(|name| self.modules.contains_key(name.as_str()))
            .filter(|name| seen.insert(*name))
            .cloned()
            .collect()
    }

    /// Enabled modules in configured order; unknown names are dropped silently
    pub fn enabled_modules(&self, config: &Config) -> Vec<&dyn Module> {
        self.enabled_names(config)
            .iter()
            .filter_map(|name| self.modules.get(name))
            .map(|module| module.as_ref())
            .collect()
    }

    fn enabled_modules_mut(&mut self, config: &Config) -> Vec<&mut Box<dyn Module>> {
        let names = self.enabled_names(config);
        let mut by_name: HashMap<&str, &mut Box<dyn Module>> = self
            .modules
            .iter_mut()
            .map(|(name, module)| (name.as_str(), module))
            .collect();
        names
            .iter()
            .filter_map(|name| by_name.remove(name.as_str()))
            .collect()
    }

    /// Runs `setup` on every enabled module
    ///
    /// Failures are logged per module and never stop the others. A module
    /// whose setup failed still takes part in the display pass.
    pub async fn setup_modules(&mut self, config: &Config) {
        let limit = config.performance.max_execution_time();
        let parallel = config.performance.parallel;
        let modules = self.enabled_modules_mut(config);

        if parallel {
            join_all(modules.into_iter().map(|module| async move {
                let name = module.name().to_string();
                let result = run_bounded(limit, module.setup(config)).await;
                log_failure("setup", &name, result);
            }))
            .await;
        } else {
            for module in modules {
                let name = module.name().to_string();
                let result = run_bounded(limit, module.setup(config)).await;
                log_failure("setup", &name, result);
            }
        }
    }

    /// Renders every enabled module and frames the non-empty fragments
    ///
    /// The result is `"\n" + fragments.join("\n") + "\n"`. A module that
    /// fails or times out contributes nothing.
    pub async fn display_welcome(&self, config: &Config) -> String {
        let limit = config.performance.max_execution_time();
        let modules = self.enabled_modules(config);

        let outputs: Vec<Option<String>> = if config.performance.parallel {
            join_all(modules.iter().map(|module| display_one(*module, config, limit))).await
        } else {
            let mut outputs = Vec::with_capacity(modules.len());
            for module in &modules {
                outputs.push(display_one(*module, config, limit).await);
            }
            outputs
        };

        let fragments: Vec<String> = outputs
            .into_iter()
            .flatten()
            .filter(|fragment| !fragment.trim().is_empty())
            .collect();
        format!("\n{}\n", fragments.join("\n"))
    }

    /// Runs `cleanup` on every enabled module, logging failures
    pub async fn cleanup_modules(&mut self, config: &Config) {
        for module in self.enabled_modules_mut(config) {
            let name = module.name().to_string();
            let result = module.cleanup().await;
            log_failure("cleanup", &name, result);
        }
    }
}

async fn display_one(module: &dyn Module, config: &Config, limit: Option<Duration>) -> Option<String> {
    let started = Instant::now();
    let result = run_bounded(limit, module.display(config)).await;
    tracing::debug!(module = module.name(), elapsed_ms = started.elapsed().as_millis() as u64, "display finished");
    log_failure("display", module.name(), result)
}

/// Applies the optional per-module deadline
async fn run_bounded<T>(
    limit: Option<Duration>,
    future: impl Future<Output = Result<T, ModuleError>>,
) -> Result<T, ModuleError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .unwrap_or(Err(ModuleError::Timeout(limit))),
        None => future.await,
    }
}

fn log_failure<T>(phase: &str, module: &str, result: Result<T, ModuleError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!(module, phase, error = %e, "module failed");
            None
        }
    }
}
