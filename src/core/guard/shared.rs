/*!
 * Shared Guards
 *
 * Reference-counted guards with a single release authority
 */

use super::lifecycle::LifecycleGuard;
use super::traits::{Guard, GuardRef, Resource};
use super::GuardMetadata;
use std::ops::Deref;
use std::sync::Arc;

/// Reference-counted lifecycle guard
///
/// Holders may call `terminate` at any time; otherwise the last holder to
/// [`relinquish`](SharedGuard::relinquish) its handle releases the resource.
/// A last holder that simply drops its handle sends the guard to the safety net.
///
/// # Example
///
/// ```ignore
/// let shared = SharedGuard::new(guard);
/// let worker = shared.clone();
/// assert!(!worker.relinquish()); // still shared
/// assert!(shared.relinquish());  // last holder terminates
/// ```
pub struct SharedGuard<R: Resource> {
    inner: Arc<LifecycleGuard<R>>,
}

impl<R: Resource> SharedGuard<R> {
    /// Share an existing guard
    pub fn new(guard: LifecycleGuard<R>) -> Self {
        Self {
            inner: Arc::new(guard),
        }
    }

    /// Give up this handle
    ///
    /// Returns `true` if this was the last holder and the guard was terminated.
    pub fn relinquish(self) -> bool {
        match Arc::into_inner(self.inner) {
            Some(guard) => {
                guard.terminate();
                true
            }
            None => false,
        }
    }
}

impl<R: Resource> Deref for SharedGuard<R> {
    type Target = LifecycleGuard<R>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<R: Resource> Clone for SharedGuard<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Resource> Guard for SharedGuard<R> {
    fn resource_type(&self) -> &'static str {
        self.inner.resource_type()
    }

    fn metadata(&self) -> &GuardMetadata {
        self.inner.metadata()
    }

    fn is_live(&self) -> bool {
        self.inner.is_live()
    }

    fn terminate(&self) {
        self.inner.terminate();
    }
}

impl<R: Resource> GuardRef for SharedGuard<R> {
    fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}
