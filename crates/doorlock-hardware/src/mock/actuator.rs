//! Mock door actuator that records every command.

use crate::{ActuatorControl, Indicator, Result};
use std::sync::{Arc, Mutex, MutexGuard};

/// Command received by a [`MockActuator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorEvent {
    Pulse,
    Indicator(Indicator),
}

/// Mock actuator for testing and development.
#[derive(Debug)]
pub struct MockActuator {
    events: Arc<Mutex<Vec<ActuatorEvent>>>,
}

impl MockActuator {
    pub fn new() -> (Self, MockActuatorHandle) {
        let events = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                events: Arc::clone(&events),
            },
            MockActuatorHandle { events },
        )
    }
}

fn lock(events: &Mutex<Vec<ActuatorEvent>>) -> MutexGuard<'_, Vec<ActuatorEvent>> {
    events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ActuatorControl for MockActuator {
    async fn pulse_open(&mut self) -> Result<()> {
        lock(&self.events).push(ActuatorEvent::Pulse);
        Ok(())
    }

    async fn set_indicator(&mut self, indicator: Indicator) -> Result<()> {
        lock(&self.events).push(ActuatorEvent::Indicator(indicator));
        Ok(())
    }
}

/// Handle for inspecting a [`MockActuator`].
#[derive(Debug, Clone)]
pub struct MockActuatorHandle {
    events: Arc<Mutex<Vec<ActuatorEvent>>>,
}

impl MockActuatorHandle {
    #[must_use]
    pub fn events(&self) -> Vec<ActuatorEvent> {
        lock(&self.events).clone()
    }

    /// Number of door open pulses.
    #[must_use]
    pub fn pulses(&self) -> usize {
        lock(&self.events)
            .iter()
            .filter(|e| matches!(e, ActuatorEvent::Pulse))
            .count()
    }

    /// Last lamp state set, if any.
    #[must_use]
    pub fn indicator(&self) -> Option<Indicator> {
        lock(&self.events).iter().rev().find_map(|e| match e {
            ActuatorEvent::Indicator(i) => Some(*i),
            ActuatorEvent::Pulse => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_commands() {
        let (mut actuator, handle) = MockActuator::new();
        assert_eq!(handle.indicator(), None);

        actuator.set_indicator(Indicator::Unlocked).await.unwrap();
        actuator.pulse_open().await.unwrap();
        actuator.set_indicator(Indicator::Locked).await.unwrap();

        assert_eq!(handle.pulses(), 1);
        assert_eq!(handle.indicator(), Some(Indicator::Locked));
        assert_eq!(handle.events().len(), 3);
    }
}
