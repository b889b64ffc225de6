//! Broadcast channel port.

use tokio::sync::mpsc;

use questlog_shared::Envelope;

use super::error::ChannelError;

/// Fire-and-forget broadcast to every other peer of the world.
///
/// Senders never receive their own messages.
#[cfg_attr(test, mockall::automock)]
pub trait SyncChannel: Send + Sync {
    fn send(&self, envelope: Envelope) -> Result<(), ChannelError>;
    fn subscribe(&self) -> mpsc::UnboundedReceiver<Envelope>;
}
