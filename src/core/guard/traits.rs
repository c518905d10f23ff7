/*!
 * Guard Traits
 *
 * Core abstractions for resources and the guards that own them
 */

use super::{GuardError, GuardMetadata, GuardResult};

/// An exclusively owned external resource
///
/// `release` consumes the resource, so the type system rules out a second
/// release of the same handle. Guards decide *when* it runs.
pub trait Resource: Send + Sized {
    /// Resource type name for logging/debugging
    fn resource_type(&self) -> &'static str;

    /// Release the underlying handle
    ///
    /// Errors are reported to the owning guard, which logs them.
    fn release(self) -> GuardResult<()>;
}

/// Resources that can be obtained from a configuration
///
/// Acquisition is all-or-nothing: an implementation that obtains several
/// sub-resources must release the ones it got before returning an error.
pub trait Acquire: Resource {
    type Config;

    /// Acquire the resource synchronously
    fn acquire(config: &Self::Config) -> GuardResult<Self>;
}

/// A resource layered on top of a base resource
///
/// Implementors only describe their own layer. Release ordering against the
/// base is fixed by [`super::Chained`] and cannot be overridden here.
pub trait Layer<B: Resource>: Resource {
    type LayerConfig;

    /// Acquire this layer once the base is held
    fn acquire_on(base: &mut B, config: &Self::LayerConfig) -> GuardResult<Self>;
}

/// Core guard trait
///
/// All guards must implement this to provide:
/// - Resource type identification
/// - Metadata access
/// - Explicit, idempotent termination
pub trait Guard: Send + Sync {
    /// Resource type name for logging/debugging
    fn resource_type(&self) -> &'static str;

    /// Get guard metadata
    fn metadata(&self) -> &GuardMetadata;

    /// Check if the guarded resource is still usable
    fn is_live(&self) -> bool;

    /// Release the resource
    ///
    /// Never fails observably. Calling it on a terminated guard is a no-op.
    fn terminate(&self);
}

/// Guards that run a safety net when dropped
///
/// Separates Drop logic for better testability and observability
pub trait GuardDrop: Guard {
    /// Perform best-effort cleanup on drop
    ///
    /// # Panics
    ///
    /// Must NOT panic. Log errors instead.
    fn on_drop(&mut self);
}

/// Guards with observable lifecycle
pub trait Observable: Guard {
    /// Emit acquisition event
    fn emit_created(&self);

    /// Emit usage event with operation name
    fn emit_used(&self, operation: &str);

    /// Emit explicit termination event
    fn emit_terminated(&self);

    /// Emit leak event (reached the safety net while live)
    fn emit_leaked(&self);

    /// Emit error event
    fn emit_error(&self, error: &GuardError);
}

/// Guards that can be cloned with reference counting
pub trait GuardRef: Guard + Clone {
    /// Get current reference count
    fn ref_count(&self) -> usize;

    /// Check if this is the last reference
    fn is_last_ref(&self) -> bool {
        self.ref_count() == 1
    }
}
