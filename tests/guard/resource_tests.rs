/*!
 * Concrete Resource Tests
 *
 * Files and foreign peers under explicit lifecycles
 */

use lifecycle_guard::core::guard::*;
use lifecycle_guard::monitoring::{Collector, EventFilter};
use lifecycle_guard::resources::file::LockConfig;
use lifecycle_guard::resources::*;
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_file_and_peer_in_one_scope() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scoped.txt");
    let runtime = Arc::new(LocalRuntime::new());
    let collector = Arc::new(Collector::new());

    {
        let file = FileGuard::acquire(&FileConfig::create(&path), Some(collector.clone())).unwrap();
        let peer =
            PeerGuard::acquire(&PeerConfig::new(runtime.clone(), "adder"), Some(collector.clone()))
                .unwrap();

        let mut scope = GuardScope::new();
        scope.defer(&file).defer(&peer);
        assert_eq!(scope.resource_types(), vec!["file", "peer"]);

        let sum = peer.try_with("invoke", |p| p.invoke(&[20, 22])).unwrap();
        file.try_with("write", |f| f.write_all(sum.to_string().as_bytes()))
            .unwrap();
        assert_eq!(runtime.live_peers(), 1);
    }

    assert_eq!(runtime.live_peers(), 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), "42");
    assert_eq!(collector.leak_count(), 0);
    assert_eq!(
        collector
            .query(&EventFilter::new().kind("guard_terminated"))
            .len(),
        2
    );
}

#[test]
fn test_leaked_peers_are_all_reclaimed() {
    let runtime = Arc::new(LocalRuntime::new());
    let collector = Arc::new(Collector::new());

    let guards: Vec<_> = (0..5)
        .map(|_| {
            PeerGuard::acquire(&PeerConfig::new(runtime.clone(), "worker"), Some(collector.clone()))
                .unwrap()
        })
        .collect();
    assert_eq!(runtime.live_peers(), 5);

    guards[0].terminate();
    drop(guards);

    assert_eq!(runtime.live_peers(), 0);
    assert_eq!(runtime.released(), 5);
    assert_eq!(collector.leak_count(), 4);
}

#[test]
fn test_empty_peer_kind_fails_acquisition() {
    let runtime = Arc::new(LocalRuntime::new());
    let err = PeerGuard::acquire(&PeerConfig::new(runtime.clone(), ""), None).unwrap_err();

    assert!(matches!(err, GuardError::Acquisition { resource: "peer", .. }));
    assert_eq!(runtime.created(), 0);
}

#[test]
fn test_lock_released_after_terminate_allows_reacquire() {
    let dir = tempdir().unwrap();
    let config = ChainedConfig::new(
        FileConfig::create(dir.path().join("exclusive.txt")),
        LockConfig {
            suffix: ".owner".to_string(),
        },
    );

    let first = LockedFileGuard::acquire(&config, None).unwrap();
    assert!(LockedFileGuard::acquire(&config, None).is_err());
    first.terminate();

    let second = LockedFileGuard::acquire(&config, None).unwrap();
    let lock_path = second.with("lock_path", |chain| chain.layer().path().to_path_buf()).unwrap();
    assert!(lock_path.ends_with("exclusive.txt.owner"));
    second.terminate();
    assert!(!lock_path.exists());
}
