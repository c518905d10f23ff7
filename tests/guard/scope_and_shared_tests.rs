/*!
 * Guard Scope and Shared Guard Tests
 */

use lifecycle_guard::core::guard::*;
use lifecycle_guard::monitoring::Collector;
use lifecycle_guard::testing::{CountingConfig, CountingResource, ReleaseProbe};
use std::sync::Arc;

fn counting(probe: &ReleaseProbe, collector: &Arc<Collector>) -> LifecycleGuard<CountingResource> {
    LifecycleGuard::acquire(&CountingConfig::new(probe.clone()), Some(collector.clone())).unwrap()
}

#[test]
fn test_scope_runs_on_panic() {
    let probe = ReleaseProbe::new();
    let collector = Arc::new(Collector::new());
    let guard = counting(&probe, &collector);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut scope = GuardScope::new();
        scope.defer(&guard);
        panic!("caller failure");
    }));

    assert!(result.is_err());
    assert!(!guard.is_live());
    assert_eq!(probe.releases(), 1);
    drop(guard);
    assert_eq!(collector.leak_count(), 0);
}

#[test]
fn test_scope_with_already_terminated_guard() {
    let probe = ReleaseProbe::new();
    let collector = Arc::new(Collector::new());
    let guard = counting(&probe, &collector);

    {
        let mut scope = GuardScope::new();
        scope.defer(&guard);
        guard.terminate();
    }

    assert_eq!(probe.release_attempts(), 1);
}

#[test]
fn test_shared_guard_in_scope() {
    let probe = ReleaseProbe::new();
    let collector = Arc::new(Collector::new());
    let shared = SharedGuard::new(counting(&probe, &collector));
    let other = shared.clone();

    {
        let mut scope = GuardScope::new();
        scope.defer(&shared);
        assert_eq!(other.with("echo", |r| r.echo("a")).unwrap(), "a");
    }

    assert!(other.with("echo", |r| r.echo("b")).unwrap_err().is_invalid_state());
    assert!(!other.relinquish());
    assert!(shared.relinquish());
    assert_eq!(probe.releases(), 1);
    assert_eq!(collector.leak_count(), 0);
}

#[test]
fn test_terminate_inside_operation_returns() {
    let probe = ReleaseProbe::new();
    let collector = Arc::new(Collector::new());
    let guard = Arc::new(counting(&probe, &collector));

    let (tx, rx) = std::sync::mpsc::channel();
    let worker = guard.clone();
    std::thread::spawn(move || {
        let out = worker.with("outer", |r| {
            worker.terminate();
            r.echo("finished")
        });
        let _ = tx.send(out);
    });

    let out = rx
        .recv_timeout(std::time::Duration::from_secs(5))
        .expect("terminate inside an operation must not block");
    assert_eq!(out.unwrap(), "finished");
    assert!(!guard.is_live());
    assert_eq!(probe.releases(), 1);
}

#[test]
fn test_scope_closing_inside_operation() {
    let probe = ReleaseProbe::new();
    let collector = Arc::new(Collector::new());
    let guard = counting(&probe, &collector);

    let nested = guard
        .with("outer", |r| {
            let mut scope = GuardScope::new();
            scope.defer(&guard);
            let echoed = r.echo("inside");
            scope.close();
            (echoed, guard.with("inner", |r| r.echo("again")))
        })
        .unwrap();

    assert_eq!(nested.0, "inside");
    assert!(matches!(nested.1, Err(GuardError::Reentrant { .. })));
    assert!(!guard.is_live());
    assert_eq!(probe.releases(), 1);
    assert_eq!(collector.leak_count(), 0);
}
