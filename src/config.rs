/*!
 * Lifecycle Configuration
 *
 * Safety-net and diagnostics policy shared by guards.
 */

use crate::monitoring::{Severity, DEFAULT_EVENT_CAPACITY};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SAFETY_NET_ENV: &str = "LIFEGUARD_SAFETY_NET";
pub const LEAK_SEVERITY_ENV: &str = "LIFEGUARD_LEAK_SEVERITY";
pub const RECORD_USAGE_ENV: &str = "LIFEGUARD_RECORD_USAGE";
pub const EVENT_CAPACITY_ENV: &str = "LIFEGUARD_EVENT_CAPACITY";

/// Configuration loading errors
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    #[diagnostic(
        code(config::invalid_value),
        help("Booleans accept 1/0/true/false; severities accept trace..critical.")
    )]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid configuration JSON: {0}")]
    #[diagnostic(code(config::json))]
    Json(#[from] serde_json::Error),
}

/// Guard lifecycle policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Release leaked guards when they are dropped (default: true)
    ///
    /// When disabled, a leak is still reported but the release primitive is
    /// skipped; only the handle's own drop glue runs.
    pub safety_net: bool,

    /// Severity of leak diagnostics (default: warn)
    pub leak_severity: Severity,

    /// Emit an event for every guarded operation (default: false)
    pub record_usage: bool,

    /// Events buffered by a collector built from this config (default: 1024)
    pub event_capacity: usize,
}

impl LifecycleConfig {
    /// Default policy
    pub fn new() -> Self {
        Self {
            safety_net: true,
            leak_severity: Severity::Warn,
            record_usage: false,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Leaks reported as errors, every operation recorded
    pub fn strict() -> Self {
        Self {
            safety_net: true,
            leak_severity: Severity::Error,
            record_usage: true,
            event_capacity: DEFAULT_EVENT_CAPACITY * 4,
        }
    }

    /// Minimal diagnostics for hot paths
    pub fn quiet() -> Self {
        Self {
            safety_net: true,
            leak_severity: Severity::Info,
            record_usage: false,
            event_capacity: 64,
        }
    }

    /// Start from defaults and apply `LIFEGUARD_*` environment overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new();

        if let Some(value) = read_env(SAFETY_NET_ENV) {
            config.safety_net = parse_bool(SAFETY_NET_ENV, &value)?;
        }
        if let Some(value) = read_env(LEAK_SEVERITY_ENV) {
            config.leak_severity = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: LEAK_SEVERITY_ENV,
                value: value.clone(),
            })?;
        }
        if let Some(value) = read_env(RECORD_USAGE_ENV) {
            config.record_usage = parse_bool(RECORD_USAGE_ENV, &value)?;
        }
        if let Some(value) = read_env(EVENT_CAPACITY_ENV) {
            config.event_capacity = value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: EVENT_CAPACITY_ENV,
                    value,
                })?;
        }

        Ok(config)
    }

    /// Parse from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn read_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}
