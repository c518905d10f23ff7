/*!
 * Guard Scopes
 *
 * Terminate a set of guards together on every exit path
 */

use super::traits::Guard;
use tracing::debug;

/// Cleanup scope over borrowed guards
///
/// Guards are terminated in reverse registration order when the scope ends,
/// whether by falling off the end, an early `?` return, or a panic. Declare
/// the scope after the guards it covers so it drops first.
///
/// # Example
///
/// ```ignore
/// let file = LifecycleGuard::<FileResource>::acquire(&config, None)?;
/// let peer = LifecycleGuard::<PeerResource<LocalRuntime>>::acquire(&peer_config, None)?;
///
/// let mut scope = GuardScope::new();
/// scope.defer(&file).defer(&peer);
///
/// file.try_with("write", |f| f.write_all(b"data"))?;
/// // peer terminated, then file
/// ```
pub struct GuardScope<'a> {
    guards: Vec<&'a dyn Guard>,
}

impl<'a> GuardScope<'a> {
    /// Create a new empty scope
    pub fn new() -> Self {
        Self { guards: Vec::new() }
    }

    /// Terminate `guard` when the scope ends
    pub fn defer(&mut self, guard: &'a dyn Guard) -> &mut Self {
        self.guards.push(guard);
        self
    }

    /// Get number of guards in the scope
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// Check if scope is empty
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Get all guard resource types
    pub fn resource_types(&self) -> Vec<&'static str> {
        self.guards.iter().map(|g| g.resource_type()).collect()
    }

    /// Check if all guards are live
    pub fn all_live(&self) -> bool {
        self.guards.iter().all(|g| g.is_live())
    }

    /// End the scope now
    pub fn close(self) {}

    /// Terminate all guards in reverse order (LIFO)
    fn terminate_all(&mut self) {
        for guard in self.guards.drain(..).rev() {
            debug!(
                resource = guard.resource_type(),
                guard_id = guard.metadata().id.as_u64(),
                "scope terminating guard"
            );
            guard.terminate();
        }
    }
}

impl Default for GuardScope<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for GuardScope<'_> {
    fn drop(&mut self) {
        self.terminate_all();
    }
}
