//! Connectivity signal consumed by the alert queue.

use tokio::sync::watch;

/// Live "is online" query plus a stream of transitions.
pub trait ConnectivitySignal: Send + Sync {
    /// Current connectivity, read at call time.
    fn is_online(&self) -> bool;

    /// Receiver that observes every change of the online flag.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// `watch`-backed connectivity state set by whoever observes the network.
#[derive(Debug)]
pub struct ConnectivityMonitor {
    tx: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx }
    }

    /// Publish the current state. Subscribers are only woken on an actual change.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            tracing::info!(online, "Connectivity changed");
        }
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivitySignal for ConnectivityMonitor {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
