use crate::{InboundCommand, OutboundEvent};

/// Best-effort link to the remote supervisor.
///
/// Both directions are non-blocking. While disconnected, `publish` drops
/// the event and `try_receive` yields nothing, so the controller keeps
/// working locally.
pub trait RemoteChannel {
    /// Take the pending inbound command, if any.
    fn try_receive(&mut self) -> Option<InboundCommand>;

    /// Queue an event for the supervisor.
    fn publish(&mut self, event: OutboundEvent);

    fn is_connected(&self) -> bool;
}

/// Channel for installations without a supervisor.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineChannel;

impl RemoteChannel for OfflineChannel {
    fn try_receive(&mut self) -> Option<InboundCommand> {
        None
    }

    fn publish(&mut self, _event: OutboundEvent) {}

    fn is_connected(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_channel() {
        let mut channel = OfflineChannel;
        channel.publish(OutboundEvent::DoorUnlocked);
        assert!(channel.try_receive().is_none());
        assert!(!channel.is_connected());
    }
}
