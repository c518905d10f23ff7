/*!
 * Chained Resources
 *
 * A resource layered on top of a base resource. Release order is fixed:
 * the layer goes first, and the base release runs on every path out of
 * the layer release, including errors and panics.
 */

use super::traits::{Acquire, Layer, Resource};
use super::{panic_message, GuardError, GuardResult};
use std::panic::{self, AssertUnwindSafe};
use tracing::error;

/// Base resource with an additional layer on top
///
/// Wrap it in a [`super::LifecycleGuard`] like any other resource; the guard's
/// `terminate` and safety net both go through the chained release.
///
/// # Example
///
/// ```ignore
/// type LockedFile = Chained<FileResource, FileLock>;
///
/// let guard = LifecycleGuard::<LockedFile>::acquire(
///     &ChainedConfig::new(FileConfig::create(path), LockConfig::default()),
///     None,
/// )?;
/// guard.terminate(); // lock removed, then file closed
/// ```
#[derive(Debug)]
pub struct Chained<B: Resource, L: Resource> {
    base: B,
    layer: L,
}

/// Acquisition parameters for both parts of a chain
#[derive(Debug, Clone, Default)]
pub struct ChainedConfig<BC, LC> {
    pub base: BC,
    pub layer: LC,
}

impl<BC, LC> ChainedConfig<BC, LC> {
    pub fn new(base: BC, layer: LC) -> Self {
        Self { base, layer }
    }
}

impl<B: Resource, L: Resource> Chained<B, L> {
    /// Chain two already acquired resources
    pub fn new(base: B, layer: L) -> Self {
        Self { base, layer }
    }

    #[inline]
    pub fn base(&self) -> &B {
        &self.base
    }

    #[inline]
    pub fn base_mut(&mut self) -> &mut B {
        &mut self.base
    }

    #[inline]
    pub fn layer(&self) -> &L {
        &self.layer
    }

    #[inline]
    pub fn layer_mut(&mut self) -> &mut L {
        &mut self.layer
    }
}

impl<B: Resource, L: Resource> Resource for Chained<B, L> {
    fn resource_type(&self) -> &'static str {
        self.layer.resource_type()
    }

    fn release(self) -> GuardResult<()> {
        let Chained { base, layer } = self;
        let layer_type = layer.resource_type();

        let base = BaseRelease::arm(base);
        // A panic here unwinds through `base`, whose Drop releases it.
        let layer_result = layer.release();
        let base_result = base.release_now();

        match (layer_result, base_result) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(err), Ok(())) | (Ok(()), Err(err)) => Err(err),
            (Err(layer_err), Err(base_err)) => Err(GuardError::release(
                layer_type,
                format!("{}; base: {}", layer_err, base_err),
            )),
        }
    }
}

impl<B: Acquire, L: Layer<B>> Acquire for Chained<B, L> {
    type Config = ChainedConfig<B::Config, L::LayerConfig>;

    fn acquire(config: &Self::Config) -> GuardResult<Self> {
        let mut base = B::acquire(&config.base)?;

        let layer = panic::catch_unwind(AssertUnwindSafe(|| {
            L::acquire_on(&mut base, &config.layer)
        }));
        match layer {
            Ok(Ok(layer)) => Ok(Self { base, layer }),
            Ok(Err(err)) => {
                drop(BaseRelease::arm(base));
                Err(err)
            }
            Err(payload) => {
                // Base is released before the layer's panic continues.
                drop(BaseRelease::arm(base));
                panic::resume_unwind(payload)
            }
        }
    }
}

/// Releases the base on drop unless released explicitly first
struct BaseRelease<B: Resource> {
    base: Option<B>,
}

impl<B: Resource> BaseRelease<B> {
    fn arm(base: B) -> Self {
        Self { base: Some(base) }
    }

    fn release_now(mut self) -> GuardResult<()> {
        match self.base.take() {
            Some(base) => base.release(),
            None => Ok(()),
        }
    }
}

impl<B: Resource> Drop for BaseRelease<B> {
    fn drop(&mut self) {
        let Some(base) = self.base.take() else {
            return;
        };
        let resource = base.resource_type();
        match panic::catch_unwind(AssertUnwindSafe(move || base.release())) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!(resource, error = %err, "base release failed during unwind");
            }
            Err(payload) => {
                error!(
                    resource,
                    error = %panic_message(payload),
                    "base release panicked during unwind"
                );
            }
        }
    }
}
