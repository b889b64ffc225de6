//! In-process broadcast hub standing in for the host socket.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use questlog_shared::Envelope;

use crate::infrastructure::ports::{ChannelError, SyncChannel};

/// Routes envelopes between every connected peer.
#[derive(Default)]
pub struct InMemorySyncHub {
    next_peer: AtomicU64,
    peers: Mutex<Vec<(u64, mpsc::UnboundedSender<Envelope>)>>,
}

impl InMemorySyncHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A channel handle for one client.
    pub fn connect(self: &Arc<Self>) -> InMemorySyncChannel {
        InMemorySyncChannel {
            peer_id: self.next_peer.fetch_add(1, Ordering::Relaxed),
            hub: Arc::clone(self),
        }
    }

    fn deliver(&self, from: u64, envelope: Envelope) -> usize {
        let mut peers = self.peers.lock().unwrap_or_else(|p| p.into_inner());
        peers.retain(|(_, tx)| !tx.is_closed());
        peers
            .iter()
            .filter(|(peer, _)| *peer != from)
            .filter(|(_, tx)| tx.send(envelope.clone()).is_ok())
            .count()
    }
}

pub struct InMemorySyncChannel {
    peer_id: u64,
    hub: Arc<InMemorySyncHub>,
}

impl SyncChannel for InMemorySyncChannel {
    fn send(&self, envelope: Envelope) -> Result<(), ChannelError> {
        let delivered = self.hub.deliver(self.peer_id, envelope);
        tracing::trace!(peer = self.peer_id, delivered, "Envelope broadcast");
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<Envelope> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.hub
            .peers
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((self.peer_id, tx));
        rx
    }
}
