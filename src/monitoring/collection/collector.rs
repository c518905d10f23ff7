/*!
 * Lifecycle Collector
 * Diagnostic sink for guard events
 *
 * Keeps the most recent events in a bounded buffer and counts everything
 * ever emitted, so leak totals stay accurate after the buffer wraps.
 */

use crate::monitoring::events::{Event, EventFilter, Payload, Severity};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default number of buffered events
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Collector statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectorStats {
    pub emitted: u64,
    pub evicted: u64,
    pub buffered: usize,
    pub leaks: u64,
    pub release_failures: u64,
}

/// Bounded event sink shared by guards
pub struct Collector {
    events: Mutex<VecDeque<Event>>,
    capacity: usize,
    emitted: AtomicU64,
    evicted: AtomicU64,
    leaks: AtomicU64,
    release_failures: AtomicU64,
    by_severity: [AtomicU64; 6],
}

impl Collector {
    /// Create a collector with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create a collector buffering at most `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_CAPACITY))),
            capacity,
            emitted: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            leaks: AtomicU64::new(0),
            release_failures: AtomicU64::new(0),
            by_severity: Default::default(),
        }
    }

    /// Emit an event (primary API)
    #[inline]
    pub fn emit(&self, event: Event) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
        self.by_severity[event.severity as usize].fetch_add(1, Ordering::Relaxed);
        match event.payload {
            Payload::ResourceLeaked { .. } => {
                self.leaks.fetch_add(1, Ordering::Relaxed);
            }
            Payload::ReleaseFailed { .. } => {
                self.release_failures.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }

        let mut events = self.events.lock();
        if events.len() == self.capacity {
            events.pop_front();
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        events.push_back(event);
    }

    /// Snapshot of buffered events, oldest first
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().iter().cloned().collect()
    }

    /// Buffered events matching a filter
    pub fn query(&self, filter: &EventFilter) -> Vec<Event> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.matches(filter))
            .cloned()
            .collect()
    }

    /// Remove and return all buffered events
    pub fn drain(&self) -> Vec<Event> {
        self.events.lock().drain(..).collect()
    }

    /// Total leak diagnostics ever emitted
    #[inline]
    pub fn leak_count(&self) -> u64 {
        self.leaks.load(Ordering::Relaxed)
    }

    /// Total release failures ever emitted
    #[inline]
    pub fn release_failure_count(&self) -> u64 {
        self.release_failures.load(Ordering::Relaxed)
    }

    /// Total events ever emitted at a severity
    #[inline]
    pub fn count_at(&self, severity: Severity) -> u64 {
        self.by_severity[severity as usize].load(Ordering::Relaxed)
    }

    /// Buffer capacity
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CollectorStats {
        CollectorStats {
            emitted: self.emitted.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            buffered: self.events.lock().len(),
            leaks: self.leak_count(),
            release_failures: self.release_failure_count(),
        }
    }

    /// Reset buffer and counters
    pub fn reset(&self) {
        self.events.lock().clear();
        self.emitted.store(0, Ordering::Relaxed);
        self.evicted.store(0, Ordering::Relaxed);
        self.leaks.store(0, Ordering::Relaxed);
        self.release_failures.store(0, Ordering::Relaxed);
        for counter in &self.by_severity {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("capacity", &self.capacity)
            .field("stats", &self.stats())
            .finish()
    }
}
