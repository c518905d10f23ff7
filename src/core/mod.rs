/*!
 * Core Module
 * Guard abstractions and shared types
 */

pub mod guard;
pub mod types;

// Re-export for convenience
pub use guard::{
    Acquire, Chained, ChainedConfig, Guard, GuardDrop, GuardError, GuardMetadata, GuardRef,
    GuardResult, GuardScope, Layer, LifecycleGuard, Observable, Resource, SharedGuard,
};
pub use types::*;
