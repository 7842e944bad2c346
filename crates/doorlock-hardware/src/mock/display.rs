//! Mock display that records every screen and buzzer pulse.

use crate::{DisplaySink, Result, Screen};
use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

#[derive(Debug, Default)]
struct DisplayLog {
    screens: Vec<Screen>,
    beeps: Vec<Duration>,
}

/// Mock display for testing and development.
#[derive(Debug)]
pub struct MockDisplay {
    log: Arc<Mutex<DisplayLog>>,
}

impl MockDisplay {
    pub fn new() -> (Self, MockDisplayHandle) {
        let log = Arc::new(Mutex::new(DisplayLog::default()));
        (
            Self {
                log: Arc::clone(&log),
            },
            MockDisplayHandle { log },
        )
    }
}

fn lock(log: &Mutex<DisplayLog>) -> MutexGuard<'_, DisplayLog> {
    log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DisplaySink for MockDisplay {
    async fn show(&mut self, screen: &Screen) -> Result<()> {
        lock(&self.log).screens.push(screen.clone());
        Ok(())
    }

    async fn feedback(&mut self, duration: Duration) -> Result<()> {
        lock(&self.log).beeps.push(duration);
        Ok(())
    }
}

/// Handle for inspecting a [`MockDisplay`].
#[derive(Debug, Clone)]
pub struct MockDisplayHandle {
    log: Arc<Mutex<DisplayLog>>,
}

impl MockDisplayHandle {
    /// The screen currently shown.
    #[must_use]
    pub fn current(&self) -> Option<Screen> {
        lock(&self.log).screens.last().cloned()
    }

    #[must_use]
    pub fn screens(&self) -> Vec<Screen> {
        lock(&self.log).screens.clone()
    }

    /// Whether any screen so far contained `text`.
    #[must_use]
    pub fn has_shown(&self, text: &str) -> bool {
        lock(&self.log).screens.iter().any(|s| s.contains(text))
    }

    #[must_use]
    pub fn beeps(&self) -> Vec<Duration> {
        lock(&self.log).beeps.clone()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        let mut log = lock(&self.log);
        log.screens.clear();
        log.beeps.clear();
    }
}
