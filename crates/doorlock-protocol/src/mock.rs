//! Mock supervisor link for testing.
//!
//! [`MockRemoteChannel`] behaves like the network adapter: one pending
//! inbound command at most, publishes dropped while disconnected.

use crate::{InboundCommand, OutboundEvent, RemoteChannel};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::mpsc;

/// Mock remote channel driven by a [`MockRemoteHandle`].
///
/// # Examples
///
/// ```
/// use doorlock_protocol::{InboundCommand, MockRemoteChannel, OutboundEvent, RemoteChannel};
///
/// let (mut channel, mut handle) = MockRemoteChannel::new();
///
/// assert!(handle.send_command(InboundCommand::Unlock));
/// assert_eq!(channel.try_receive(), Some(InboundCommand::Unlock));
///
/// channel.publish(OutboundEvent::DoorUnlocked);
/// assert_eq!(handle.published(), vec![OutboundEvent::DoorUnlocked]);
/// ```
#[derive(Debug)]
pub struct MockRemoteChannel {
    inbound_rx: mpsc::Receiver<InboundCommand>,
    outbound_tx: mpsc::UnboundedSender<OutboundEvent>,
    connected: Arc<AtomicBool>,
}

impl MockRemoteChannel {
    /// Create a connected mock channel and its handle.
    pub fn new() -> (Self, MockRemoteHandle) {
        let (inbound_tx, inbound_rx) = mpsc::channel(1);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(true));

        let channel = Self {
            inbound_rx,
            outbound_tx,
            connected: Arc::clone(&connected),
        };
        let handle = MockRemoteHandle {
            inbound_tx,
            outbound_rx,
            connected,
        };
        (channel, handle)
    }
}

impl RemoteChannel for MockRemoteChannel {
    fn try_receive(&mut self) -> Option<InboundCommand> {
        if !self.is_connected() {
            return None;
        }
        self.inbound_rx.try_recv().ok()
    }

    fn publish(&mut self, event: OutboundEvent) {
        if self.is_connected() {
            let _ = self.outbound_tx.send(event);
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Supervisor side of a [`MockRemoteChannel`].
#[derive(Debug)]
pub struct MockRemoteHandle {
    inbound_tx: mpsc::Sender<InboundCommand>,
    outbound_rx: mpsc::UnboundedReceiver<OutboundEvent>,
    connected: Arc<AtomicBool>,
}

impl MockRemoteHandle {
    /// Offer a command to the controller.
    ///
    /// Returns `false` when a command is already pending and this one was
    /// dropped.
    pub fn send_command(&self, command: InboundCommand) -> bool {
        self.inbound_tx.try_send(command).is_ok()
    }

    /// Drain every event published since the last call.
    pub fn published(&mut self) -> Vec<OutboundEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.outbound_rx.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pending_command() {
        let (mut channel, handle) = MockRemoteChannel::new();

        assert!(handle.send_command(InboundCommand::Unlock));
        assert!(!handle.send_command(InboundCommand::ClearAllFingerprints));

        assert_eq!(channel.try_receive(), Some(InboundCommand::Unlock));
        assert_eq!(channel.try_receive(), None);
    }

    #[test]
    fn test_disconnected_drops_publish() {
        let (mut channel, mut handle) = MockRemoteChannel::new();

        handle.set_connected(false);
        channel.publish(OutboundEvent::DoorLocked);
        assert!(handle.published().is_empty());

        handle.set_connected(true);
        channel.publish(OutboundEvent::DoorLocked);
        assert_eq!(handle.published(), vec![OutboundEvent::DoorLocked]);
    }

    #[test]
    fn test_disconnected_hides_inbound() {
        let (mut channel, handle) = MockRemoteChannel::new();

        assert!(handle.send_command(InboundCommand::Unlock));
        handle.set_connected(false);
        assert_eq!(channel.try_receive(), None);

        handle.set_connected(true);
        assert_eq!(channel.try_receive(), Some(InboundCommand::Unlock));
    }
}
