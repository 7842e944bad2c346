//! Bounded lockout after repeated authentication failures.
//!
//! Disabled by default: failures only increment the counter. When enabled,
//! reaching `threshold` consecutive failures opens a refusal window of
//! `duration` during which keypad digits and `#` are ignored.

use doorlock_core::constants::{DEFAULT_LOCKOUT_DURATION_SECS, DEFAULT_LOCKOUT_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutPolicy {
    pub enabled: bool,
    pub threshold: u32,
    pub duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: DEFAULT_LOCKOUT_THRESHOLD,
            duration: Duration::from_secs(DEFAULT_LOCKOUT_DURATION_SECS),
        }
    }
}

impl LockoutPolicy {
    /// Enabled policy with the given limits.
    pub fn enabled(threshold: u32, duration: Duration) -> Self {
        Self {
            enabled: true,
            threshold,
            duration,
        }
    }

    /// Window length to apply after `failures` consecutive failures.
    ///
    /// ```
    /// use doorlock_controller::LockoutPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = LockoutPolicy::enabled(3, Duration::from_secs(30));
    /// assert_eq!(policy.lockout_duration(2), None);
    /// assert_eq!(policy.lockout_duration(3), Some(Duration::from_secs(30)));
    /// assert_eq!(LockoutPolicy::default().lockout_duration(99), None);
    /// ```
    pub fn lockout_duration(&self, failures: u32) -> Option<Duration> {
        (self.enabled && self.threshold > 0 && failures >= self.threshold).then_some(self.duration)
    }
}

/// Active refusal window, if any.
#[derive(Debug, Clone, Default)]
pub struct Lockout {
    policy: LockoutPolicy,
    until: Option<Instant>,
    shown_secs: Option<u64>,
}

impl Lockout {
    pub fn new(policy: LockoutPolicy) -> Self {
        Self {
            policy,
            until: None,
            shown_secs: None,
        }
    }

    /// Open a window if `failures` reached the threshold.
    ///
    /// Returns `true` when a window was opened.
    pub fn engage(&mut self, failures: u32, now: Instant) -> bool {
        match self.policy.lockout_duration(failures) {
            Some(duration) => {
                self.until = Some(now + duration);
                self.shown_secs = None;
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.until.is_some()
    }

    /// Whether an active window has run out.
    pub fn has_elapsed(&self, now: Instant) -> bool {
        self.until.is_some_and(|until| now >= until)
    }

    /// Whole seconds left, rounded up.
    pub fn remaining_secs(&self, now: Instant) -> Option<u64> {
        self.until.map(|until| {
            let left = until.saturating_duration_since(now);
            left.as_secs() + u64::from(left.subsec_nanos() > 0)
        })
    }

    /// Seconds to display if they differ from the last value shown.
    pub fn countdown_update(&mut self, now: Instant) -> Option<u64> {
        let secs = self.remaining_secs(now)?;
        if self.shown_secs == Some(secs) {
            return None;
        }
        self.shown_secs = Some(secs);
        Some(secs)
    }

    /// Make the next [`Lockout::countdown_update`] report the current value.
    pub fn force_redraw(&mut self) {
        self.shown_secs = None;
    }

    pub fn clear(&mut self) {
        self.until = None;
        self.shown_secs = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disabled() {
        let policy = LockoutPolicy::default();
        assert!(!policy.enabled);
        assert_eq!(policy.threshold, 3);
        assert_eq!(policy.lockout_duration(u32::MAX), None);
    }

    #[test]
    fn test_zero_threshold_never_locks() {
        let policy = LockoutPolicy::enabled(0, Duration::from_secs(5));
        assert_eq!(policy.lockout_duration(0), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_lifecycle() {
        let mut lockout = Lockout::new(LockoutPolicy::enabled(3, Duration::from_secs(30)));
        let now = Instant::now();

        assert!(!lockout.engage(2, now));
        assert!(!lockout.is_active());

        assert!(lockout.engage(3, now));
        assert!(lockout.is_active());
        assert_eq!(lockout.remaining_secs(now), Some(30));
        assert!(!lockout.has_elapsed(now + Duration::from_secs(29)));
        assert!(lockout.has_elapsed(now + Duration::from_secs(30)));

        lockout.clear();
        assert!(!lockout.is_active());
        assert_eq!(lockout.remaining_secs(now), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_only_reports_changes() {
        let mut lockout = Lockout::new(LockoutPolicy::enabled(1, Duration::from_secs(3)));
        let now = Instant::now();
        lockout.engage(1, now);

        assert_eq!(lockout.countdown_update(now), Some(3));
        assert_eq!(lockout.countdown_update(now + Duration::from_millis(400)), None);
        assert_eq!(lockout.countdown_update(now + Duration::from_millis(1_500)), Some(2));
    }
}
