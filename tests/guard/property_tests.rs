/*!
 * Lifecycle Property Tests
 *
 * Random interleavings of use and terminate
 */

use lifecycle_guard::core::guard::*;
use lifecycle_guard::monitoring::Collector;
use lifecycle_guard::testing::{CountingConfig, CountingResource, ReleaseProbe};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
enum Step {
    Use,
    Terminate,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![Just(Step::Use), Just(Step::Terminate)]
}

proptest! {
    #[test]
    fn release_happens_at_most_once(steps in prop::collection::vec(step(), 0..40), drop_at_end in any::<bool>()) {
        let probe = ReleaseProbe::new();
        let collector = Arc::new(Collector::new());
        let guard = LifecycleGuard::<CountingResource>::acquire(
            &CountingConfig::new(probe.clone()),
            Some(collector.clone()),
        )
        .unwrap();

        let mut terminated = false;
        let mut successful_uses = 0usize;
        for step in &steps {
            match step {
                Step::Use => match guard.with("echo", |r| r.echo("p")) {
                    Ok(out) => {
                        prop_assert!(!terminated);
                        prop_assert_eq!(out, "p");
                        successful_uses += 1;
                    }
                    Err(err) => {
                        prop_assert!(terminated);
                        prop_assert!(err.is_invalid_state());
                    }
                },
                Step::Terminate => {
                    guard.terminate();
                    terminated = true;
                }
            }
            prop_assert!(probe.releases() <= 1);
        }

        if drop_at_end {
            drop(guard);
            prop_assert_eq!(probe.releases(), 1);
            prop_assert_eq!(collector.leak_count(), if terminated { 0 } else { 1 });
        } else {
            prop_assert_eq!(probe.releases(), usize::from(terminated));
        }
        prop_assert_eq!(probe.touches(), successful_uses);
        prop_assert_eq!(probe.touches_after_release(), 0);
    }
}
