/*!
 * Lifecycle Guard Library
 * Deterministic release of external resources with a logged safety net
 */

pub mod config;
pub mod core;
pub mod monitoring;
pub mod resources;
pub mod testing;

// Re-exports
pub use config::{ConfigError, LifecycleConfig};
pub use crate::core::guard::{
    Acquire, Chained, ChainedConfig, Guard, GuardDrop, GuardError, GuardMetadata, GuardRef,
    GuardResult, GuardScope, Layer, LifecycleGuard, Observable, Resource, SharedGuard,
};
pub use crate::core::types::{GuardId, PeerId};
pub use monitoring::{init_tracing, Category, Collector, Event, EventFilter, Payload, Severity};
pub use resources::{
    FileConfig, FileGuard, FileResource, LocalRuntime, LockedFileGuard, PeerConfig, PeerGuard,
    PeerRuntime,
};
