//! Live client counter

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::info;

/// Counts connected clients for diagnostics.
///
/// Never used to refuse connections.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    active: AtomicUsize,
    total: AtomicUsize,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new client and return the live count
    pub fn increment(&self) -> usize {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Record a departed client and return the live count
    pub fn decrement(&self) -> usize {
        let prev = self
            .active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .unwrap_or(0);
        prev.saturating_sub(1)
    }

    /// Clients connected right now
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Clients accepted since start
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Increment and hand back a guard that decrements exactly once on drop
    pub fn register(self: &Arc<Self>, peer: SocketAddr) -> ClientGuard {
        let clients = self.increment();
        info!(%peer, clients, "new client");
        ClientGuard {
            registry: Arc::clone(self),
            peer,
        }
    }
}

/// Membership of one session in the registry
#[derive(Debug)]
pub struct ClientGuard {
    registry: Arc<ClientRegistry>,
    peer: SocketAddr,
}

impl ClientGuard {
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        let clients = self.registry.decrement();
        info!(peer = %self.peer, clients, "dead client removed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[test]
    fn test_increment_decrement() {
        let registry = ClientRegistry::new();
        assert_eq!(registry.increment(), 1);
        assert_eq!(registry.increment(), 2);
        assert_eq!(registry.decrement(), 1);
        assert_eq!(registry.active(), 1);
        assert_eq!(registry.total(), 2);
    }

    #[test]
    fn test_decrement_never_underflows() {
        let registry = ClientRegistry::new();
        assert_eq!(registry.decrement(), 0);
        assert_eq!(registry.active(), 0);
    }

    #[test]
    fn test_guard_decrements_once() {
        let registry = Arc::new(ClientRegistry::new());
        let guard = registry.register(addr());
        assert_eq!(guard.peer(), addr());
        assert_eq!(registry.active(), 1);
        drop(guard);
        assert_eq!(registry.active(), 0);
        assert_eq!(registry.total(), 1);
    }
}
