/*!
 * Resource Lifecycle Guards
 *
 * Explicit acquire / use / terminate over exclusively owned resources.
 *
 * ## Design Principles
 *
 * 1. **Explicit Termination**: `terminate()` is the release path callers rely on
 * 2. **Strict Liveness**: any use after termination is an `InvalidState` error
 * 3. **Idempotent Release**: the release primitive runs at most once
 * 4. **Safety Net**: `Drop` releases leaked guards and reports the leak
 * 5. **Enforced Chaining**: layered resources always release their base
 *
 * ## Guard Types
 *
 * - **LifecycleGuard**: Single resource with liveness flag and safety net
 * - **Chained**: Resource layered on a base, released layer-first
 * - **SharedGuard**: Reference-counted guard with last-holder release
 * - **GuardScope**: Cleanup scope terminating guards LIFO on every exit path
 *
 * ## Example
 *
 * ```ignore
 * let guard = LifecycleGuard::<FileResource>::acquire(&config, None)?;
 * let mut scope = GuardScope::new();
 * scope.defer(&guard);
 *
 * guard.try_with("write", |file| file.write_all(b"hello"))?;
 * // Terminated when `scope` goes out of scope, even on early return
 * ```
 */

mod chained;
mod lifecycle;
mod scope;
mod shared;
mod traits;

pub use chained::{Chained, ChainedConfig};
pub use lifecycle::LifecycleGuard;
pub use scope::GuardScope;
pub use shared::SharedGuard;
pub use traits::{Acquire, Guard, GuardDrop, GuardRef, Layer, Observable, Resource};

use crate::core::types::GuardId;
use miette::Diagnostic;
use std::any::Any;

/// Result type for guard operations
pub type GuardResult<T> = Result<T, GuardError>;

/// Errors that can occur during guard operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
pub enum GuardError {
    #[error("Failed to acquire {resource}: {reason}")]
    #[diagnostic(
        code(guard::acquisition),
        help("No guard was created and partially acquired state was released.")
    )]
    Acquisition {
        resource: &'static str,
        reason: String,
    },

    #[error("Invalid state: {resource} already terminated (attempted '{operation}')")]
    #[diagnostic(
        code(guard::invalid_state),
        help("The resource was released by terminate(). Acquire a new guard.")
    )]
    InvalidState {
        resource: &'static str,
        operation: String,
    },

    #[error("Re-entrant use of {resource} (attempted '{operation}' inside a guarded operation)")]
    #[diagnostic(
        code(guard::reentrant),
        help("Use the resource handed to the enclosing closure instead of the guard.")
    )]
    Reentrant {
        resource: &'static str,
        operation: String,
    },

    #[error("Failed to release {resource}: {reason}")]
    #[diagnostic(code(guard::release))]
    Release {
        resource: &'static str,
        reason: String,
    },

    #[error("Operation failed: {0}")]
    #[diagnostic(code(guard::operation_failed))]
    OperationFailed(String),
}

impl GuardError {
    /// Build an acquisition error from any displayable cause
    pub fn acquisition(resource: &'static str, reason: impl ToString) -> Self {
        Self::Acquisition {
            resource,
            reason: reason.to_string(),
        }
    }

    /// Build a release error from any displayable cause
    pub fn release(resource: &'static str, reason: impl ToString) -> Self {
        Self::Release {
            resource,
            reason: reason.to_string(),
        }
    }

    /// True for use-after-terminate errors
    #[inline]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}

/// Guard metadata for observability
#[derive(Debug, Clone)]
pub struct GuardMetadata {
    pub resource_type: &'static str,
    pub id: GuardId,
    pub creation_time: std::time::Instant,
}

impl GuardMetadata {
    #[inline]
    pub fn new(resource_type: &'static str) -> Self {
        Self {
            resource_type,
            id: GuardId::next(),
            creation_time: std::time::Instant::now(),
        }
    }

    #[inline]
    pub fn lifetime_micros(&self) -> u64 {
        self.creation_time.elapsed().as_micros() as u64
    }
}

/// Render a caught panic payload for logs and events
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {}", msg)
    } else {
        "panicked".to_string()
    }
}
