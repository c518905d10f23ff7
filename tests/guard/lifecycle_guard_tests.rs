/*!
 * Lifecycle Guard Tests
 */

use lifecycle_guard::core::guard::*;
use lifecycle_guard::monitoring::{Collector, EventFilter, Payload, Severity};
use lifecycle_guard::testing::{CountingConfig, CountingResource, ReleaseBehavior, ReleaseProbe};
use lifecycle_guard::LifecycleConfig;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn acquire(
    probe: &ReleaseProbe,
    collector: &Arc<Collector>,
) -> LifecycleGuard<CountingResource> {
    LifecycleGuard::acquire(&CountingConfig::new(probe.clone()), Some(collector.clone())).unwrap()
}

#[test]
fn test_end_to_end_hello_scenario() {
    let probe = ReleaseProbe::new();
    let collector = Arc::new(Collector::new());

    let guard = acquire(&probe, &collector);
    assert!(guard.is_live());
    assert_eq!(guard.with("say_hello", |r| r.echo("hello")).unwrap(), "hello");

    guard.terminate();
    let err = guard.with("say_hello", |r| r.echo("hello")).unwrap_err();
    assert_eq!(
        err,
        GuardError::InvalidState {
            resource: "counting",
            operation: "say_hello".to_string(),
        }
    );

    guard.terminate();
    assert_eq!(probe.releases(), 1);
    assert_eq!(probe.touches(), 1);

    let kinds: Vec<_> = collector.events().iter().map(|e| e.payload.kind()).collect();
    assert_eq!(kinds, vec!["guard_acquired", "guard_terminated"]);
}

#[test]
fn test_safety_net_records_exactly_one_leak() {
    let probe = ReleaseProbe::new();
    let collector = Arc::new(Collector::new());

    let guard = acquire(&probe, &collector);
    let id = guard.metadata().id;
    drop(guard);

    assert_eq!(probe.releases(), 1);
    let leaks = collector.query(&EventFilter::leaks());
    assert_eq!(leaks.len(), 1);
    assert_eq!(leaks[0].guard_id, Some(id));
    assert_eq!(leaks[0].severity, Severity::Warn);
    assert!(matches!(
        leaks[0].payload,
        Payload::ResourceLeaked { released: true, .. }
    ));
}

#[test]
fn test_safety_net_silent_after_terminate() {
    let probe = ReleaseProbe::new();
    let collector = Arc::new(Collector::new());

    let guard = acquire(&probe, &collector);
    guard.terminate();
    let before = collector.stats().emitted;
    drop(guard);

    assert_eq!(probe.release_attempts(), 1);
    assert_eq!(collector.leak_count(), 0);
    assert_eq!(collector.stats().emitted, before);
}

#[test]
fn test_strict_config_raises_leak_severity() {
    let probe = ReleaseProbe::new();
    let collector = Arc::new(Collector::new());

    drop(
        LifecycleGuard::<CountingResource>::acquire_with(
            &CountingConfig::new(probe.clone()),
            LifecycleConfig::strict(),
            Some(collector.clone()),
        )
        .unwrap(),
    );

    assert_eq!(collector.count_at(Severity::Error), 1);
    assert_eq!(collector.leak_count(), 1);
}

#[test]
fn test_release_failure_never_escapes_terminate() {
    let probe = ReleaseProbe::new();
    let collector = Arc::new(Collector::new());

    for behavior in [ReleaseBehavior::Fail, ReleaseBehavior::Panic] {
        let guard = LifecycleGuard::<CountingResource>::acquire(
            &CountingConfig::new(probe.clone()).with_behavior(behavior),
            Some(collector.clone()),
        )
        .unwrap();

        guard.terminate();
        assert!(!guard.is_live());
        assert!(guard.with("echo", |r| r.echo("x")).unwrap_err().is_invalid_state());
    }

    assert_eq!(probe.release_attempts(), 2);
    assert_eq!(collector.release_failure_count(), 2);
    assert_eq!(collector.leak_count(), 0);
}

#[test]
fn test_guard_without_collector() {
    let probe = ReleaseProbe::new();
    let guard =
        LifecycleGuard::<CountingResource>::acquire(&CountingConfig::new(probe.clone()), None)
            .unwrap();

    assert!(guard.collector().is_none());
    drop(guard);
    assert_eq!(probe.releases(), 1);
}

#[test]
fn test_wrapping_acquired_resource() {
    let probe = ReleaseProbe::new();
    let resource = CountingResource::acquire(&CountingConfig::new(probe.clone()).named("wrapped"))
        .unwrap();

    let guard = LifecycleGuard::new(resource, None);
    assert_eq!(guard.resource_type(), "wrapped");
    guard.terminate();
    assert_eq!(probe.held(), 0);
}
