// src/scheduler/config.rs

use derive_builder::Builder;
use serde::Deserialize;
use std::time::Duration;

use super::types::FlushError;
use crate::policy::FlushPolicyKind;

const DEFAULT_MAX_BATCH_SIZE: usize = 500;
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(40);
const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(40);

#[derive(Debug, Clone, Builder, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(try_from = "RawConfig")]
pub struct Config {
    /// Number of pending items that triggers an immediate flush
    #[builder(default = "DEFAULT_MAX_BATCH_SIZE")]
    pub(crate) max_batch_size: usize,

    /// Strategy deciding when a partial batch is flushed
    #[builder(default)]
    pub(crate) flush_policy: FlushPolicyKind,

    /// Quiet period after which a partial batch is flushed (debounced-wait)
    #[builder(default = "DEFAULT_IDLE_TIMEOUT")]
    pub(crate) idle_timeout: Duration,

    /// Fixed flush period (fixed-tick)
    #[builder(default = "DEFAULT_TICK_PERIOD")]
    pub(crate) tick_period: Duration,

    /// Bound on buffered items; unbounded when `None`
    #[builder(default)]
    pub(crate) queue_capacity: Option<usize>,
}

impl Config {
    /// Returns the size threshold of a batch
    #[inline]
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    #[inline]
    pub fn flush_policy(&self) -> FlushPolicyKind {
        self.flush_policy
    }

    #[inline]
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    #[inline]
    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    #[inline]
    pub fn queue_capacity(&self) -> Option<usize> {
        self.queue_capacity
    }

    pub fn validate(&self) -> Result<(), FlushError> {
        check(
            self.max_batch_size,
            self.flush_policy,
            self.idle_timeout,
            self.tick_period,
            self.queue_capacity,
        )
        .map_err(FlushError::InvalidConfig)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            flush_policy: FlushPolicyKind::default(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            tick_period: DEFAULT_TICK_PERIOD,
            queue_capacity: None,
        }
    }
}

impl ConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        check(
            self.max_batch_size.unwrap_or(DEFAULT_MAX_BATCH_SIZE),
            self.flush_policy.unwrap_or_default(),
            self.idle_timeout.unwrap_or(DEFAULT_IDLE_TIMEOUT),
            self.tick_period.unwrap_or(DEFAULT_TICK_PERIOD),
            self.queue_capacity.flatten(),
        )
    }
}

fn check(
    max_batch_size: usize,
    flush_policy: FlushPolicyKind,
    idle_timeout: Duration,
    tick_period: Duration,
    queue_capacity: Option<usize>,
) -> Result<(), String> {
    if max_batch_size == 0 {
        return Err("max_batch_size must be positive".to_string());
    }
    if queue_capacity == Some(0) {
        return Err("queue_capacity must be positive when set".to_string());
    }
    match flush_policy {
        FlushPolicyKind::DebouncedWait if idle_timeout.is_zero() => {
            Err("idle_timeout must be positive for debounced-wait".to_string())
        }
        FlushPolicyKind::FixedTick if tick_period.is_zero() => {
            Err("tick_period must be positive for fixed-tick".to_string())
        }
        _ => Ok(()),
    }
}

/// Serialized form of [`Config`]; durations are whole milliseconds.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawConfig {
    #[serde(default = "default_max_batch_size")]
    max_batch_size: usize,

    #[serde(default)]
    flush_policy: FlushPolicyKind,

    #[serde(default = "default_idle_timeout_ms")]
    idle_timeout_ms: u64,

    #[serde(default = "default_tick_period_ms")]
    tick_period_ms: u64,

    #[serde(default)]
    queue_capacity: Option<usize>,
}

fn default_max_batch_size() -> usize {
    DEFAULT_MAX_BATCH_SIZE
}

fn default_idle_timeout_ms() -> u64 {
    DEFAULT_IDLE_TIMEOUT.as_millis() as u64
}

fn default_tick_period_ms() -> u64 {
    DEFAULT_TICK_PERIOD.as_millis() as u64
}

impl TryFrom<RawConfig> for Config {
    type Error = FlushError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let config = ConfigBuilder::default()
            .max_batch_size(raw.max_batch_size)
            .flush_policy(raw.flush_policy)
            .idle_timeout(Duration::from_millis(raw.idle_timeout_ms))
            .tick_period(Duration::from_millis(raw.tick_period_ms))
            .queue_capacity(raw.queue_capacity)
            .build()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ConfigBuilder::default().build().unwrap();

        assert_eq!(config.max_batch_size(), 500);
        assert_eq!(config.flush_policy(), FlushPolicyKind::DebouncedWait);
        assert_eq!(config.idle_timeout(), Duration::from_millis(40));
        assert_eq!(config.tick_period(), Duration::from_millis(40));
        assert_eq!(config.queue_capacity(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_rejects_zero_batch_size() {
        let err = ConfigBuilder::default()
            .max_batch_size(0usize)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_batch_size"));
    }

    #[test]
    fn test_builder_rejects_zero_timer_for_selected_policy() {
        let err = ConfigBuilder::default()
            .flush_policy(FlushPolicyKind::FixedTick)
            .tick_period(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("tick_period"));

        // the idle timeout is irrelevant to fixed-tick
        let config = ConfigBuilder::default()
            .flush_policy(FlushPolicyKind::FixedTick)
            .idle_timeout(Duration::ZERO)
            .build();
        assert!(config.is_ok());
    }

    #[test]
    fn test_builder_rejects_zero_capacity() {
        let err = ConfigBuilder::default()
            .queue_capacity(0usize)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("queue_capacity"));
    }

    #[test]
    fn test_deserialize_recognized_options() {
        let config: Config = serde_json::from_str(
            r#"{
                "maxBatchSize": 64,
                "flushPolicy": "fixed-tick",
                "tickPeriodMs": 250,
                "queueCapacity": 1024
            }"#,
        )
        .unwrap();

        assert_eq!(config.max_batch_size(), 64);
        assert_eq!(config.flush_policy(), FlushPolicyKind::FixedTick);
        assert_eq!(config.tick_period(), Duration::from_millis(250));
        assert_eq!(config.idle_timeout(), Duration::from_millis(40));
        assert_eq!(config.queue_capacity(), Some(1024));
    }

    #[test]
    fn test_deserialize_validates() {
        let result: Result<Config, _> =
            serde_json::from_str(r#"{ "flushPolicy": "debounced-wait", "idleTimeoutMs": 0 }"#);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("idle_timeout"));

        let result: Result<Config, _> = serde_json::from_str(r#"{ "flushPolicy": "eager" }"#);
        assert!(result.is_err());
    }
}
