/*!
 * Lifecycle Guards
 *
 * Explicit acquire / use / terminate with a Drop safety net
 */

use super::traits::{Acquire, Guard, GuardDrop, Observable, Resource};
use super::{panic_message, GuardError, GuardMetadata, GuardResult};
use crate::config::LifecycleConfig;
use crate::core::types::GuardId;
use crate::monitoring::{span_operation, Category, Collector, Event, Payload, Severity};
use parking_lot::{Mutex, MutexGuard};
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Guard over an exclusively owned resource
///
/// The resource and its liveness live behind one lock: an operation either
/// runs against the fully live handle or fails with `InvalidState`, even when
/// another thread is terminating the guard at the same time.
///
/// Inside a `with` closure the guard itself must not be used again: a nested
/// `with` fails with `Reentrant`, and a nested `terminate` (directly or via a
/// [`super::GuardScope`]) is deferred until the closure returns.
///
/// # Example
///
/// ```ignore
/// let guard = LifecycleGuard::<FileResource>::acquire(&FileConfig::read_only(path), None)?;
/// let text = guard.try_with("read", |file| file.read_to_string())?;
/// guard.terminate();
/// assert!(guard.with("read", |_| ()).unwrap_err().is_invalid_state());
/// ```
pub struct LifecycleGuard<R: Resource> {
    state: Mutex<Option<R>>,
    live: AtomicBool,
    pending_release: AtomicBool,
    metadata: GuardMetadata,
    config: LifecycleConfig,
    collector: Option<Arc<Collector>>,
}

enum ReleaseOutcome {
    Released,
    AlreadyReleased,
    Failed(GuardError),
}

impl<R: Resource> LifecycleGuard<R> {
    /// Guard an already acquired resource
    pub fn new(resource: R, collector: Option<Arc<Collector>>) -> Self {
        Self::with_config(resource, LifecycleConfig::default(), collector)
    }

    /// Guard an already acquired resource with an explicit policy
    pub fn with_config(
        resource: R,
        config: LifecycleConfig,
        collector: Option<Arc<Collector>>,
    ) -> Self {
        let metadata = GuardMetadata::new(resource.resource_type());

        let guard = Self {
            state: Mutex::new(Some(resource)),
            live: AtomicBool::new(true),
            pending_release: AtomicBool::new(false),
            metadata,
            config,
            collector,
        };

        debug!(
            resource = guard.metadata.resource_type,
            guard_id = guard.metadata.id.as_u64(),
            "guard acquired"
        );
        guard.emit_created();
        guard
    }

    /// Acquire a resource and guard it
    ///
    /// No guard exists unless acquisition fully succeeded.
    pub fn acquire(config: &R::Config, collector: Option<Arc<Collector>>) -> GuardResult<Self>
    where
        R: Acquire,
    {
        Self::acquire_with(config, LifecycleConfig::default(), collector)
    }

    /// Acquire with an explicit lifecycle policy
    pub fn acquire_with(
        config: &R::Config,
        lifecycle: LifecycleConfig,
        collector: Option<Arc<Collector>>,
    ) -> GuardResult<Self>
    where
        R: Acquire,
    {
        match R::acquire(config) {
            Ok(resource) => Ok(Self::with_config(resource, lifecycle, collector)),
            Err(err) => {
                let resource = match &err {
                    GuardError::Acquisition { resource, .. } => *resource,
                    _ => "unknown",
                };
                debug!(resource, error = %err, "acquisition failed");
                if let Some(ref collector) = collector {
                    collector.emit(Event::new(
                        Severity::Warn,
                        Category::Resource,
                        Payload::AcquisitionFailed {
                            resource: resource.to_string(),
                            error: err.to_string(),
                        },
                    ));
                }
                Err(err)
            }
        }
    }

    /// Run an operation against the live resource
    ///
    /// Fails with `InvalidState` once the guard has been terminated, and with
    /// `Reentrant` when called from inside another operation on this guard.
    /// A `terminate` issued from inside `f` takes effect once `f` returns.
    pub fn with<T, F>(&self, operation: &str, f: F) -> GuardResult<T>
    where
        F: FnOnce(&mut R) -> T,
    {
        if held_by_current_thread(self.metadata.id) {
            return Err(GuardError::Reentrant {
                resource: self.metadata.resource_type,
                operation: operation.to_string(),
            });
        }

        let mut section = HeldSection::enter(self);
        let Some(resource) = section.state.as_mut() else {
            return Err(GuardError::InvalidState {
                resource: self.metadata.resource_type,
                operation: operation.to_string(),
            });
        };

        let _span = span_operation(
            self.metadata.resource_type,
            self.metadata.id.as_u64(),
            operation,
        )
        .entered();
        if self.config.record_usage {
            self.emit_used(operation);
        }
        Ok(f(resource))
    }

    /// Run a fallible operation against the live resource
    pub fn try_with<T, F>(&self, operation: &str, f: F) -> GuardResult<T>
    where
        F: FnOnce(&mut R) -> GuardResult<T>,
    {
        self.with(operation, f)?
    }

    /// Check if the guard was terminated (explicitly or otherwise)
    #[inline]
    pub fn is_terminated(&self) -> bool {
        !self.is_live()
    }

    /// Lifecycle policy in effect
    #[inline]
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Diagnostic sink, if any
    #[inline]
    pub fn collector(&self) -> Option<&Arc<Collector>> {
        self.collector.as_ref()
    }

    /// Flip liveness and release under the state lock
    fn release_locked(&self) -> ReleaseOutcome {
        let mut state = self.state.lock();
        let Some(resource) = state.take() else {
            return ReleaseOutcome::AlreadyReleased;
        };
        self.live.store(false, Ordering::Release);

        let outcome = release_caught(self.metadata.resource_type, resource);
        drop(state);
        outcome
    }

    fn report_outcome(&self, outcome: ReleaseOutcome) {
        match outcome {
            ReleaseOutcome::Released => {
                debug!(
                    resource = self.metadata.resource_type,
                    guard_id = self.metadata.id.as_u64(),
                    lifetime_micros = self.metadata.lifetime_micros(),
                    "guard terminated"
                );
                self.emit_terminated();
            }
            ReleaseOutcome::AlreadyReleased => {
                debug!(
                    resource = self.metadata.resource_type,
                    guard_id = self.metadata.id.as_u64(),
                    "terminate on terminated guard ignored"
                );
            }
            ReleaseOutcome::Failed(err) => {
                // The handle is gone either way; the guard stays terminated.
                self.report_failure(&err);
            }
        }
    }

    fn report_failure(&self, err: &GuardError) {
        error!(
            resource = self.metadata.resource_type,
            guard_id = self.metadata.id.as_u64(),
            error = %err,
            "release failed"
        );
        self.emit_error(err);
    }
}

thread_local! {
    /// Guards whose state lock this thread holds inside `with`
    static HELD: RefCell<Vec<GuardId>> = const { RefCell::new(Vec::new()) };
}

fn held_by_current_thread(id: GuardId) -> bool {
    HELD.try_with(|held| held.borrow().contains(&id)).unwrap_or(false)
}

fn mark_held(id: GuardId, entering: bool) {
    let tracked = HELD.try_with(|held| {
        let mut held = held.borrow_mut();
        if entering {
            held.push(id);
        } else if let Some(pos) = held.iter().rposition(|h| *h == id) {
            held.remove(pos);
        }
    });
    if let Err(e) = tracked {
        debug!(guard_id = id.as_u64(), error = %e, "re-entry tracking unavailable");
    }
}

/// State lock held for the duration of one `with` call
///
/// Runs a release deferred by a nested `terminate` when the call ends,
/// including by panic.
struct HeldSection<'a, R: Resource> {
    guard: &'a LifecycleGuard<R>,
    state: MutexGuard<'a, Option<R>>,
}

impl<'a, R: Resource> HeldSection<'a, R> {
    fn enter(guard: &'a LifecycleGuard<R>) -> Self {
        let state = guard.state.lock();
        mark_held(guard.metadata.id, true);
        Self { guard, state }
    }
}

impl<R: Resource> Drop for HeldSection<'_, R> {
    fn drop(&mut self) {
        mark_held(self.guard.metadata.id, false);
        if !self.guard.pending_release.swap(false, Ordering::AcqRel) {
            return;
        }

        let outcome = match self.state.take() {
            Some(resource) => {
                self.guard.live.store(false, Ordering::Release);
                release_caught(self.guard.metadata.resource_type, resource)
            }
            None => ReleaseOutcome::AlreadyReleased,
        };
        self.guard.report_outcome(outcome);
    }
}

/// Run a release, turning a panic into a release error
fn release_caught<R: Resource>(resource_type: &'static str, resource: R) -> ReleaseOutcome {
    match panic::catch_unwind(AssertUnwindSafe(move || resource.release())) {
        Ok(Ok(())) => ReleaseOutcome::Released,
        Ok(Err(err)) => ReleaseOutcome::Failed(err),
        Err(payload) => {
            ReleaseOutcome::Failed(GuardError::release(resource_type, panic_message(payload)))
        }
    }
}

impl<R: Resource> Guard for LifecycleGuard<R> {
    fn resource_type(&self) -> &'static str {
        self.metadata.resource_type
    }

    fn metadata(&self) -> &GuardMetadata {
        &self.metadata
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn terminate(&self) {
        if held_by_current_thread(self.metadata.id) {
            self.pending_release.store(true, Ordering::Release);
            debug!(
                resource = self.metadata.resource_type,
                guard_id = self.metadata.id.as_u64(),
                "terminate inside guarded operation deferred"
            );
            return;
        }

        let outcome = self.release_locked();
        self.report_outcome(outcome);
    }
}

impl<R: Resource> GuardDrop for LifecycleGuard<R> {
    fn on_drop(&mut self) {
        let Some(resource) = self.state.get_mut().take() else {
            return;
        };
        self.live.store(false, Ordering::Release);

        warn!(
            resource = self.metadata.resource_type,
            guard_id = self.metadata.id.as_u64(),
            lifetime_micros = self.metadata.lifetime_micros(),
            safety_net = self.config.safety_net,
            "guard dropped without terminate(); resource leaked to safety net"
        );
        self.emit_leaked();

        if !self.config.safety_net {
            drop(resource);
            return;
        }

        if let ReleaseOutcome::Failed(err) = release_caught(self.metadata.resource_type, resource) {
            self.report_failure(&err);
        }
    }
}

impl<R: Resource> Observable for LifecycleGuard<R> {
    fn emit_created(&self) {
        if let Some(ref collector) = self.collector {
            let event = Event::new(
                Severity::Debug,
                Category::Lifecycle,
                Payload::GuardAcquired {
                    resource: self.metadata.resource_type.to_string(),
                },
            )
            .with_guard(self.metadata.id);
            collector.emit(event);
        }
    }

    fn emit_used(&self, operation: &str) {
        if let Some(ref collector) = self.collector {
            let event = Event::new(
                Severity::Trace,
                Category::Lifecycle,
                Payload::GuardUsed {
                    resource: self.metadata.resource_type.to_string(),
                    operation: operation.to_string(),
                },
            )
            .with_guard(self.metadata.id);
            collector.emit(event);
        }
    }

    fn emit_terminated(&self) {
        if let Some(ref collector) = self.collector {
            let event = Event::new(
                Severity::Debug,
                Category::Lifecycle,
                Payload::GuardTerminated {
                    resource: self.metadata.resource_type.to_string(),
                    lifetime_micros: self.metadata.lifetime_micros(),
                },
            )
            .with_guard(self.metadata.id);
            collector.emit(event);
        }
    }

    fn emit_leaked(&self) {
        if let Some(ref collector) = self.collector {
            let event = Event::new(
                self.config.leak_severity,
                Category::Lifecycle,
                Payload::ResourceLeaked {
                    resource: self.metadata.resource_type.to_string(),
                    lifetime_micros: self.metadata.lifetime_micros(),
                    released: self.config.safety_net,
                },
            )
            .with_guard(self.metadata.id);
            collector.emit(event);
        }
    }

    fn emit_error(&self, error: &GuardError) {
        if let Some(ref collector) = self.collector {
            let event = Event::new(
                Severity::Error,
                Category::Lifecycle,
                Payload::ReleaseFailed {
                    resource: self.metadata.resource_type.to_string(),
                    error: error.to_string(),
                },
            )
            .with_guard(self.metadata.id);
            collector.emit(event);
        }
    }
}

impl<R: Resource> Drop for LifecycleGuard<R> {
    fn drop(&mut self) {
        self.on_drop();
    }
}

impl<R: Resource> std::fmt::Debug for LifecycleGuard<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleGuard")
            .field("resource_type", &self.metadata.resource_type)
            .field("id", &self.metadata.id)
            .field("live", &self.is_live())
            .finish()
    }
}
