/*!
 * Lifeguard - Demo Entry Point
 *
 * Walks through the explicit lifecycle:
 * - Acquire a file and a foreign peer under a cleanup scope
 * - Use after terminate fails with an invalid-state error
 * - A guard dropped without terminate reaches the safety net
 */

use anyhow::Context;
use lifecycle_guard::resources::{FileConfig, FileGuard, LocalRuntime, PeerConfig, PeerGuard};
use lifecycle_guard::{init_tracing, Collector, EventFilter, Guard, GuardScope, LifecycleConfig};
use std::sync::Arc;
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = LifecycleConfig::from_env().context("loading LIFEGUARD_* configuration")?;
    info!(?config, "Lifeguard starting");

    let collector = Arc::new(Collector::with_capacity(config.event_capacity));
    let runtime = Arc::new(LocalRuntime::new());
    let path = std::env::temp_dir().join(format!("lifeguard-{}.txt", std::process::id()));

    {
        let file = FileGuard::acquire_with(
            &FileConfig::create(&path),
            config.clone(),
            Some(collector.clone()),
        )?;
        let peer = PeerGuard::acquire_with(
            &PeerConfig::new(runtime.clone(), "adder"),
            config.clone(),
            Some(collector.clone()),
        )?;

        let mut scope = GuardScope::new();
        scope.defer(&file).defer(&peer);

        let sum = peer.try_with("invoke", |p| p.invoke(&[1, 2, 3, 4]))?;
        file.try_with("write", |f| f.write_all(format!("hello {}\n", sum).as_bytes()))?;
        let text = file.try_with("read", |f| f.read_to_string())?;
        info!(sum, text = text.trim_end(), "guarded operations complete");
    }

    // Explicit termination, then misuse
    let file = FileGuard::acquire_with(&FileConfig::read_only(&path), config.clone(), Some(collector.clone()))?;
    file.terminate();
    match file.try_with("read", |f| f.read_to_string()) {
        Err(err) if err.is_invalid_state() => info!(error = %err, "use after terminate rejected"),
        other => warn!(?other, "unexpected result after terminate"),
    }
    file.terminate();

    // Forgetting to terminate: the safety net releases and reports
    drop(PeerGuard::acquire_with(
        &PeerConfig::new(runtime.clone(), "forgotten"),
        config,
        Some(collector.clone()),
    )?);

    let leaks = collector.query(&EventFilter::leaks());
    info!(
        leaks = leaks.len(),
        live_peers = runtime.live_peers(),
        stats = ?collector.stats(),
        "Lifeguard finished"
    );

    std::fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
    Ok(())
}
