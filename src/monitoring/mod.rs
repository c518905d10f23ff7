/*!
 * Monitoring
 * Lifecycle diagnostics: typed events, a bounded collector, and tracing setup
 */

pub mod collection;
pub mod events;
mod tracer;

pub use collection::{Collector, CollectorStats, DEFAULT_EVENT_CAPACITY};
pub use events::{Category, Event, EventFilter, Payload, Severity};
pub use tracer::{init_tracing, span_operation, TRACE_JSON_ENV};
