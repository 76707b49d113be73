//! Settings loading.
//!
//! Sources, later wins: built-in defaults, optional TOML file,
//! `HOOKLINE__SECTION__KEY` environment variables.

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat, Source};
use serde::Deserialize;

use hookline_core::app::{RetryPolicy, SchedulerConfig};
use hookline_core::impls::DEFAULT_BUFFER;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub store: StoreSettings,
    pub executor: ExecutorSettings,
    pub scheduler: SchedulerSettings,
    pub ids: IdSettings,
}

impl Settings {
    /// A missing file is not an error; defaults and env still apply.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_sources(
            File::from(path).format(FileFormat::Toml).required(false),
            environment(),
        )
    }

    fn from_sources<S>(file: S, env: Environment) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}

/// `HOOKLINE__SCHEDULER__MAX_IN_FLIGHT=64` -> `scheduler.max_in_flight`
fn environment() -> Environment {
    Environment::with_prefix("HOOKLINE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub listen: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Publish buffer capacity.
    pub buffer: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            buffer: DEFAULT_BUFFER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExecutorSettings {
    /// Per-attempt HTTP timeout, `0` disables it.
    pub timeout_secs: u64,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl ExecutorSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub subscribe_retry_delay_ms: u64,
    pub finalize_retries: u32,
    pub finalize_retry_delay_ms: u64,
    pub max_in_flight: Option<usize>,
    pub delivery_backoff: Option<BackoffSettings>,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        let defaults = SchedulerConfig::default();
        Self {
            subscribe_retry_delay_ms: millis(defaults.subscribe_retry_delay),
            finalize_retries: defaults.finalize_retries,
            finalize_retry_delay_ms: millis(defaults.finalize_retry_delay),
            max_in_flight: None,
            delivery_backoff: None,
        }
    }
}

impl SchedulerSettings {
    pub fn to_scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            subscribe_retry_delay: Duration::from_millis(self.subscribe_retry_delay_ms),
            finalize_retries: self.finalize_retries,
            finalize_retry_delay: Duration::from_millis(self.finalize_retry_delay_ms),
            delivery_backoff: self.delivery_backoff.as_ref().map(BackoffSettings::to_policy),
            max_in_flight: self.max_in_flight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackoffSettings {
    pub base_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            multiplier: 2.0,
            max_delay_ms: 60_000,
        }
    }
}

impl BackoffSettings {
    fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(
            Duration::from_millis(self.base_delay_ms),
            self.multiplier,
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IdSettings {
    pub kind: IdKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdKind {
    #[default]
    Sequence,
    Ulid,
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
