/*!
 * Chained Guard Tests
 *
 * Derived resources always release their base
 */

use lifecycle_guard::core::guard::*;
use lifecycle_guard::monitoring::Collector;
use lifecycle_guard::testing::{CountingConfig, CountingResource, ReleaseBehavior, ReleaseProbe};
use parking_lot::Mutex;
use std::sync::Arc;

type Derived = Chained<CountingResource, CountingResource>;

fn chained_config(
    base: &ReleaseProbe,
    layer: &ReleaseProbe,
) -> ChainedConfig<CountingConfig, CountingConfig> {
    ChainedConfig::new(
        CountingConfig::new(base.clone()).named("base"),
        CountingConfig::new(layer.clone()).named("derived"),
    )
}

#[test]
fn test_partial_acquisition_holds_nothing() {
    let base = ReleaseProbe::new();
    let layer = ReleaseProbe::new();
    let mut config = chained_config(&base, &layer);
    config.layer = config.layer.failing_acquire();

    let collector = Arc::new(Collector::new());
    let err = LifecycleGuard::<Derived>::acquire(&config, Some(collector.clone())).unwrap_err();

    assert!(matches!(err, GuardError::Acquisition { resource: "derived", .. }));
    assert_eq!(base.acquisitions(), 1);
    assert_eq!(base.releases(), 1);
    assert_eq!(base.held() + layer.held(), 0);
    assert_eq!(collector.leak_count(), 0);
}

#[test]
fn test_failing_derived_release_still_releases_base() {
    let base = ReleaseProbe::new();
    let layer = ReleaseProbe::new();
    let mut config = chained_config(&base, &layer);
    config.layer = config.layer.with_behavior(ReleaseBehavior::Fail);

    let collector = Arc::new(Collector::new());
    let guard = LifecycleGuard::<Derived>::acquire(&config, Some(collector.clone())).unwrap();
    guard.terminate();
    guard.terminate();

    assert_eq!(base.releases(), 1);
    assert_eq!(layer.release_attempts(), 1);
    assert_eq!(collector.release_failure_count(), 1);
}

#[test]
fn test_panicking_derived_release_still_releases_base() {
    let base = ReleaseProbe::new();
    let layer = ReleaseProbe::new();
    let mut config = chained_config(&base, &layer);
    config.layer = config.layer.with_behavior(ReleaseBehavior::Panic);

    let guard = LifecycleGuard::<Derived>::acquire(&config, None).unwrap();
    guard.terminate();

    assert_eq!(base.releases(), 1);
    assert!(!guard.is_live());
}

#[test]
fn test_derived_safety_net_releases_both_layers_in_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let config = ChainedConfig::new(
        CountingConfig::new(ReleaseProbe::with_log(order.clone())).named("base"),
        CountingConfig::new(ReleaseProbe::with_log(order.clone())).named("derived"),
    );

    let collector = Arc::new(Collector::new());
    drop(LifecycleGuard::<Derived>::acquire(&config, Some(collector.clone())).unwrap());

    assert_eq!(*order.lock(), vec!["derived", "base"]);
    assert_eq!(collector.leak_count(), 1);
}

#[test]
fn test_three_level_chain() {
    type Tower = Chained<Derived, CountingResource>;

    let order = Arc::new(Mutex::new(Vec::new()));
    let probe = ReleaseProbe::with_log(order.clone());
    let config: <Tower as Acquire>::Config = ChainedConfig::new(
        ChainedConfig::new(
            CountingConfig::new(probe.clone()).named("base"),
            CountingConfig::new(probe.clone()).named("middle"),
        ),
        CountingConfig::new(probe.clone()).named("top"),
    );

    let guard = LifecycleGuard::<Tower>::acquire(&config, None).unwrap();
    guard
        .with("peek", |tower| {
            assert_eq!(tower.layer().name(), "top");
            assert_eq!(tower.base().layer().name(), "middle");
        })
        .unwrap();
    guard.terminate();

    assert_eq!(*order.lock(), vec!["top", "middle", "base"]);
    assert_eq!(probe.held(), 0);
}

#[test]
fn test_panicking_layer_acquisition_releases_base() {
    let base = ReleaseProbe::new();
    let layer = ReleaseProbe::new();
    let mut config = chained_config(&base, &layer);
    config.layer = config.layer.panicking_acquire();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        LifecycleGuard::<Derived>::acquire(&config, None)
    }));

    assert!(result.is_err());
    assert_eq!(base.acquisitions(), 1);
    assert_eq!(base.releases(), 1);
    assert_eq!(base.held() + layer.held(), 0);
}
