/*!
 * Collection
 * Diagnostic sink for guard lifecycle events
 */

mod collector;

pub use collector::{Collector, CollectorStats, DEFAULT_EVENT_CAPACITY};
