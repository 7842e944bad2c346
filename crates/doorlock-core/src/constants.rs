//! Core constants for the door-access controller.
//!
//! This module collects every fixed value that shapes controller behavior:
//! credential format, fingerprint slot range, menu pacing, feedback timing,
//! persistence keys and supervisor topics. Runtime-tunable values (timers,
//! lockout) have a `DEFAULT_` prefix and can be overridden from the
//! configuration file; the rest are part of the device contract.
//!
//! # Usage
//!
//! ```
//! use doorlock_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(PASSWORD_LENGTH, 4);
//! let idle = Duration::from_millis(DEFAULT_IDLE_TIMEOUT_MS);
//! assert_eq!(idle.as_secs(), 10);
//! ```

// ============================================================================
// Credential
// ============================================================================

/// Number of digits in a credential.
pub const PASSWORD_LENGTH: usize = 4;

/// Credential used when nothing has been persisted yet.
///
/// # Examples
///
/// ```
/// use doorlock_core::constants::{DEFAULT_PASSWORD, PASSWORD_LENGTH};
///
/// assert_eq!(DEFAULT_PASSWORD.len(), PASSWORD_LENGTH);
/// ```
pub const DEFAULT_PASSWORD: &str = "1234";

/// Character used to mask entered digits on the display.
pub const MASK_CHAR: char = '*';

// ============================================================================
// Fingerprint slots
// ============================================================================

/// Lowest addressable fingerprint template slot.
pub const MIN_FINGERPRINT_ID: u8 = 1;

/// Highest addressable fingerprint template slot.
///
/// The sensor stores at most 127 templates; enrollment checks
/// `MIN_FINGERPRINT_ID..=MAX_FINGERPRINT_ID` in ascending order.
pub const MAX_FINGERPRINT_ID: u8 = 127;

// ============================================================================
// Menu
// ============================================================================

/// Number of actions shown per menu page (the title takes the first line).
pub const MENU_PAGE_SIZE: usize = 3;

/// Title line drawn on every menu page.
pub const MENU_TITLE: &str = "========MENU========";

/// Interval between automatic page advances, in milliseconds.
pub const DEFAULT_SCROLL_INTERVAL_MS: u64 = 3_000;

/// Inactivity period after which the menu exits on its own, in milliseconds.
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 10_000;

// ============================================================================
// Actuator
// ============================================================================

/// How long the door stays open after an open pulse, in milliseconds.
pub const DEFAULT_OPEN_HOLD_MS: u64 = 3_000;

// ============================================================================
// Feedback timing
// ============================================================================

/// Beep after each accepted digit.
pub const KEY_BEEP_MS: u64 = 30;

/// Beep when entering fingerprint mode with `#`.
pub const FINGER_PROMPT_BEEP_MS: u64 = 50;

/// Beep on successful authentication or change.
pub const SUCCESS_BEEP_MS: u64 = 100;

/// Beep on failed authentication.
pub const FAILURE_BEEP_MS: u64 = 200;

/// Pause after showing an outcome before redrawing.
pub const RESULT_PAUSE_MS: u64 = 500;

/// Pause after a remote password change.
pub const REMOTE_CHANGE_PAUSE_MS: u64 = 2_000;

/// Pause on the "Timeout" screen before leaving the menu.
pub const TIMEOUT_PAUSE_MS: u64 = 1_000;

/// Pause after a clear-all outcome.
pub const CLEAR_ALL_PAUSE_MS: u64 = 200;

/// Default sleep between control loop iterations, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5;

// ============================================================================
// Lockout
// ============================================================================

/// Consecutive failures that trigger a lockout window when enabled.
pub const DEFAULT_LOCKOUT_THRESHOLD: u32 = 3;

/// Length of a lockout window, in seconds.
pub const DEFAULT_LOCKOUT_DURATION_SECS: u64 = 30;

// ============================================================================
// Display
// ============================================================================

/// Number of text lines on the character display.
pub const DISPLAY_LINES: usize = 4;

/// Number of columns on the character display.
pub const DISPLAY_COLUMNS: usize = 20;

// ============================================================================
// Session
// ============================================================================

/// Maximum number of state transitions kept for diagnostics.
pub const MAX_HISTORY_SIZE: usize = 100;

// ============================================================================
// Persistence
// ============================================================================

/// Namespace of the persisted credential record.
pub const STORAGE_NAMESPACE: &str = "locksys";

/// Key of the persisted credential record inside [`STORAGE_NAMESPACE`].
pub const STORAGE_PASSWORD_KEY: &str = "password";

// ============================================================================
// Supervisor link
// ============================================================================

/// Topic carrying lock status and credential events.
pub const TOPIC_STATUS: &str = "door/status";

/// Topic the supervisor publishes commands on.
pub const TOPIC_COMMAND: &str = "door/command";

/// Topic carrying fingerprint enrollment and match events.
pub const TOPIC_FINGERPRINT: &str = "door/fingerprint";

/// Minimum delay between reconnect attempts, in milliseconds.
pub const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 5_000;

/// Default TCP port of the supervisor broker.
pub const DEFAULT_SUPERVISOR_PORT: u16 = 1883;
