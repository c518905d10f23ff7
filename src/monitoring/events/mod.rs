/*!
 * Event System
 * Strongly-typed lifecycle events recorded by the collector
 */

use crate::core::types::GuardId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// Event severity for filtering and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Severity {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Critical = 5,
}

impl Severity {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Trace => "trace",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Severity::Trace),
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

/// Event category for organization and querying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Category {
    Lifecycle,
    Resource,
}

/// Unified event type - all lifecycle diagnostics flow through this
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic timestamp (nanoseconds since first event)
    pub timestamp_ns: u64,
    /// Event severity
    pub severity: Severity,
    /// Event category
    pub category: Category,
    /// Guard the event belongs to, if any
    pub guard_id: Option<GuardId>,
    /// Event payload
    pub payload: Payload,
}

/// Event payload - strongly typed variants for each event type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    GuardAcquired {
        resource: String,
    },
    GuardUsed {
        resource: String,
        operation: String,
    },
    GuardTerminated {
        resource: String,
        lifetime_micros: u64,
    },
    /// Guard reached the safety net without explicit termination
    ResourceLeaked {
        resource: String,
        lifetime_micros: u64,
        released: bool,
    },
    ReleaseFailed {
        resource: String,
        error: String,
    },
    AcquisitionFailed {
        resource: String,
        error: String,
    },
}

impl Payload {
    /// Stable name of the payload variant
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::GuardAcquired { .. } => "guard_acquired",
            Payload::GuardUsed { .. } => "guard_used",
            Payload::GuardTerminated { .. } => "guard_terminated",
            Payload::ResourceLeaked { .. } => "resource_leaked",
            Payload::ReleaseFailed { .. } => "release_failed",
            Payload::AcquisitionFailed { .. } => "acquisition_failed",
        }
    }
}

impl Event {
    /// Create a new event with current timestamp
    #[inline]
    pub fn new(severity: Severity, category: Category, payload: Payload) -> Self {
        Self {
            timestamp_ns: Self::now_ns(),
            severity,
            category,
            guard_id: None,
            payload,
        }
    }

    /// Attach the owning guard
    #[inline]
    pub fn with_guard(mut self, guard_id: GuardId) -> Self {
        self.guard_id = Some(guard_id);
        self
    }

    #[inline]
    fn now_ns() -> u64 {
        static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
        let start = START.get_or_init(Instant::now);
        start.elapsed().as_nanos() as u64
    }

    /// Check if event matches filter criteria
    #[inline]
    pub fn matches(&self, filter: &EventFilter) -> bool {
        if let Some(min_severity) = filter.min_severity {
            if self.severity < min_severity {
                return false;
            }
        }

        if let Some(category) = filter.category {
            if self.category != category {
                return false;
            }
        }

        if let Some(guard_id) = filter.guard_id {
            if self.guard_id != Some(guard_id) {
                return false;
            }
        }

        if let Some(kind) = filter.kind {
            if self.payload.kind() != kind {
                return false;
            }
        }

        true
    }
}

/// Event filter for querying
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub min_severity: Option<Severity>,
    pub category: Option<Category>,
    pub guard_id: Option<GuardId>,
    pub kind: Option<&'static str>,
}

impl EventFilter {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    #[inline]
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    #[inline]
    pub fn guard(mut self, guard_id: GuardId) -> Self {
        self.guard_id = Some(guard_id);
        self
    }

    #[inline]
    pub fn kind(mut self, kind: &'static str) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Only leak diagnostics
    #[inline]
    pub fn leaks() -> Self {
        Self::new().kind("resource_leaked")
    }
}
