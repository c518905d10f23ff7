/*!
 * Test Utilities
 *
 * Release-counting fake resources for exercising guard lifecycles
 */

use crate::core::guard::{Acquire, GuardError, GuardResult, Layer, Resource};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// How a [`CountingResource`] behaves when released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleaseBehavior {
    #[default]
    Succeed,
    Fail,
    Panic,
}

/// Shared counters observed by tests after the resource is gone
#[derive(Debug, Clone, Default)]
pub struct ReleaseProbe {
    acquisitions: Arc<AtomicUsize>,
    release_attempts: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
    touches: Arc<AtomicUsize>,
    touches_after_release: Arc<AtomicUsize>,
    released: Arc<AtomicBool>,
    log: Option<Arc<Mutex<Vec<&'static str>>>>,
}

impl ReleaseProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe that appends the resource name to `log` on every release attempt
    pub fn with_log(log: Arc<Mutex<Vec<&'static str>>>) -> Self {
        Self {
            log: Some(log),
            ..Self::default()
        }
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Release calls, including failed and panicking ones
    pub fn release_attempts(&self) -> usize {
        self.release_attempts.load(Ordering::SeqCst)
    }

    /// Successful releases
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Operations run against the resource
    pub fn touches(&self) -> usize {
        self.touches.load(Ordering::SeqCst)
    }

    pub fn touches_after_release(&self) -> usize {
        self.touches_after_release.load(Ordering::SeqCst)
    }

    /// Acquired resources not yet released
    pub fn held(&self) -> usize {
        self.acquisitions()
            .saturating_sub(self.release_attempts())
    }
}

/// Acquisition parameters for [`CountingResource`]
#[derive(Debug, Clone, Default)]
pub struct CountingConfig {
    pub probe: ReleaseProbe,
    pub name: &'static str,
    pub behavior: ReleaseBehavior,
    pub fail_acquire: bool,
    pub panic_acquire: bool,
}

impl CountingConfig {
    pub fn new(probe: ReleaseProbe) -> Self {
        Self {
            probe,
            name: "counting",
            behavior: ReleaseBehavior::Succeed,
            fail_acquire: false,
            panic_acquire: false,
        }
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn with_behavior(mut self, behavior: ReleaseBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn failing_acquire(mut self) -> Self {
        self.fail_acquire = true;
        self
    }

    pub fn panicking_acquire(mut self) -> Self {
        self.panic_acquire = true;
        self
    }
}

/// Fake resource counting every acquire, use and release
#[derive(Debug)]
pub struct CountingResource {
    name: &'static str,
    probe: ReleaseProbe,
    behavior: ReleaseBehavior,
}

impl CountingResource {
    /// Echo `message` back through the resource
    pub fn echo(&mut self, message: &str) -> String {
        self.probe.touches.fetch_add(1, Ordering::SeqCst);
        if self.probe.released.load(Ordering::SeqCst) {
            self.probe.touches_after_release.fetch_add(1, Ordering::SeqCst);
        }
        message.to_string()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Resource for CountingResource {
    fn resource_type(&self) -> &'static str {
        self.name
    }

    fn release(self) -> GuardResult<()> {
        self.probe.release_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(ref log) = self.probe.log {
            log.lock().push(self.name);
        }

        match self.behavior {
            ReleaseBehavior::Succeed => {
                self.probe.released.store(true, Ordering::SeqCst);
                self.probe.releases.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            ReleaseBehavior::Fail => Err(GuardError::release(self.name, "injected failure")),
            ReleaseBehavior::Panic => panic!("injected release panic in {}", self.name),
        }
    }
}

impl Acquire for CountingResource {
    type Config = CountingConfig;

    fn acquire(config: &CountingConfig) -> GuardResult<Self> {
        if config.fail_acquire {
            return Err(GuardError::acquisition(config.name, "injected failure"));
        }
        if config.panic_acquire {
            panic!("injected acquisition panic in {}", config.name);
        }
        config.probe.acquisitions.fetch_add(1, Ordering::SeqCst);
        Ok(Self {
            name: config.name,
            probe: config.probe.clone(),
            behavior: config.behavior,
        })
    }
}

impl<B: Resource> Layer<B> for CountingResource {
    type LayerConfig = CountingConfig;

    fn acquire_on(_base: &mut B, config: &CountingConfig) -> GuardResult<Self> {
        <Self as Acquire>::acquire(config)
    }
}
