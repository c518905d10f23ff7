/*!
 * Foreign Peer Resources
 *
 * Handles to objects living in an external runtime. The runtime's own
 * reclamation never sees them, so the guard releases each peer exactly once.
 */

use crate::core::guard::{Acquire, GuardError, GuardResult, LifecycleGuard, Resource};
use crate::core::types::PeerId;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Primitives exposed by an external runtime
#[cfg_attr(test, mockall::automock)]
pub trait PeerRuntime: Send + Sync {
    /// Create a peer object of the given kind
    fn create_peer(&self, kind: &str) -> Result<PeerId, String>;

    /// Delegate a call to the peer
    fn invoke(&self, peer: PeerId, args: &[i32]) -> Result<i32, String>;

    /// Destroy the peer; must be called exactly once per created peer
    fn release_peer(&self, peer: PeerId) -> Result<(), String>;
}

#[derive(Debug, Clone)]
struct PeerState {
    kind: String,
    calls: u64,
}

/// In-process runtime standing in for a foreign one
///
/// Sums its arguments on `invoke` and reports double releases as errors.
#[derive(Debug, Default)]
pub struct LocalRuntime {
    peers: DashMap<PeerId, PeerState>,
    next_id: AtomicU64,
    created: AtomicU64,
    released: AtomicU64,
}

impl LocalRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Peers created and not yet released
    pub fn live_peers(&self) -> usize {
        self.peers.len()
    }

    pub fn created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    pub fn released(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    /// Calls made to a live peer
    pub fn calls(&self, peer: PeerId) -> Option<u64> {
        self.peers.get(&peer).map(|p| p.calls)
    }

    /// Kind of a live peer
    pub fn kind(&self, peer: PeerId) -> Option<String> {
        self.peers.get(&peer).map(|p| p.kind.clone())
    }
}

impl PeerRuntime for LocalRuntime {
    fn create_peer(&self, kind: &str) -> Result<PeerId, String> {
        if kind.is_empty() {
            return Err("peer kind must not be empty".to_string());
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.peers.insert(
            id,
            PeerState {
                kind: kind.to_string(),
                calls: 0,
            },
        );
        self.created.fetch_add(1, Ordering::Relaxed);
        Ok(id)
    }

    fn invoke(&self, peer: PeerId, args: &[i32]) -> Result<i32, String> {
        let mut state = self
            .peers
            .get_mut(&peer)
            .ok_or_else(|| format!("peer {} does not exist", peer))?;
        state.calls += 1;
        args.iter()
            .try_fold(0i32, |acc, v| acc.checked_add(*v))
            .ok_or_else(|| "sum overflowed".to_string())
    }

    fn release_peer(&self, peer: PeerId) -> Result<(), String> {
        self.peers
            .remove(&peer)
            .map(|_| {
                self.released.fetch_add(1, Ordering::Relaxed);
            })
            .ok_or_else(|| format!("peer {} already released", peer))
    }
}

/// Acquisition parameters for a [`PeerResource`]
pub struct PeerConfig<RT: PeerRuntime> {
    pub runtime: Arc<RT>,
    pub kind: String,
}

impl<RT: PeerRuntime> PeerConfig<RT> {
    pub fn new(runtime: Arc<RT>, kind: impl Into<String>) -> Self {
        Self {
            runtime,
            kind: kind.into(),
        }
    }
}

impl<RT: PeerRuntime> Clone for PeerConfig<RT> {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            kind: self.kind.clone(),
        }
    }
}

/// Exclusively owned handle to a foreign peer
pub struct PeerResource<RT: PeerRuntime> {
    runtime: Arc<RT>,
    id: PeerId,
}

impl<RT: PeerRuntime> PeerResource<RT> {
    #[inline]
    pub fn id(&self) -> PeerId {
        self.id
    }

    /// Delegate a call to the peer
    pub fn invoke(&mut self, args: &[i32]) -> GuardResult<i32> {
        self.runtime
            .invoke(self.id, args)
            .map_err(GuardError::OperationFailed)
    }
}

impl<RT: PeerRuntime> Resource for PeerResource<RT> {
    fn resource_type(&self) -> &'static str {
        "peer"
    }

    fn release(self) -> GuardResult<()> {
        debug!(peer = self.id, "releasing foreign peer");
        self.runtime
            .release_peer(self.id)
            .map_err(|e| GuardError::release("peer", e))
    }
}

impl<RT: PeerRuntime> Acquire for PeerResource<RT> {
    type Config = PeerConfig<RT>;

    fn acquire(config: &PeerConfig<RT>) -> GuardResult<Self> {
        let id = config
            .runtime
            .create_peer(&config.kind)
            .map_err(|e| GuardError::acquisition("peer", e))?;
        Ok(Self {
            runtime: Arc::clone(&config.runtime),
            id,
        })
    }
}

/// Guard over a foreign peer
pub type PeerGuard<RT> = LifecycleGuard<PeerResource<RT>>;
