//! Session state machine for the door controller.
//!
//! The controller is always in exactly one session state. Every change is
//! validated against the transition table and recorded in a bounded
//! history for diagnostics.
//!
//! # States
//!
//! - `Locked`: lock screen shown, buffer empty
//! - `AuthenticatingPassword`: at least one digit collected
//! - `AuthenticatingFingerprint`: a capture and search is running
//! - `MenuActive { page }`: authenticated, menu page `page` shown
//!
//! # Valid Transitions
//!
//! - Locked → AuthenticatingPassword → Locked (mismatch) / MenuActive{0} (match)
//! - Locked / AuthenticatingPassword → AuthenticatingFingerprint → Locked / MenuActive{0}
//! - Locked / AuthenticatingPassword → MenuActive{0} (remote unlock)
//! - MenuActive → MenuActive (scroll, refresh) / Locked (exit, timeout)
//!
//! Forced returns to `Locked` (clear-all, lockout expiry) go through
//! [`SessionMachine::reset`], which bypasses validation.
//!
//! # Examples
//!
//! ```
//! use doorlock_controller::{SessionMachine, SessionState};
//!
//! let mut machine = SessionMachine::new();
//! machine.transition_to(SessionState::AuthenticatingPassword).unwrap();
//! machine.transition_to(SessionState::MenuActive { page: 0 }).unwrap();
//!
//! assert!(machine.current_state().is_menu());
//! assert_eq!(machine.history().len(), 2);
//! ```

use doorlock_core::{Error, Result, constants::MAX_HISTORY_SIZE};
use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, fmt};
use tokio::time::Instant;

/// One of the four session states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Locked,
    AuthenticatingPassword,
    AuthenticatingFingerprint,
    MenuActive { page: usize },
}

impl SessionState {
    /// Check whether moving to `target` is allowed.
    ///
    /// ```
    /// use doorlock_controller::SessionState;
    ///
    /// assert!(SessionState::Locked.can_transition_to(&SessionState::AuthenticatingPassword));
    /// assert!(!SessionState::Locked.can_transition_to(&SessionState::MenuActive { page: 1 }));
    /// ```
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        use SessionState::*;

        matches!(
            (self, target),
            (Locked, AuthenticatingPassword)
                | (Locked | AuthenticatingPassword, AuthenticatingFingerprint)
                | (AuthenticatingPassword | AuthenticatingFingerprint, Locked)
                | (
                    Locked | AuthenticatingPassword | AuthenticatingFingerprint,
                    MenuActive { page: 0 }
                )
                | (MenuActive { .. }, MenuActive { .. })
                | (MenuActive { .. }, Locked)
        )
    }

    /// Whether remote commands may be consumed in this state.
    pub fn is_idle_point(&self) -> bool {
        !matches!(self, SessionState::AuthenticatingFingerprint)
    }

    pub fn is_menu(&self) -> bool {
        matches!(self, SessionState::MenuActive { .. })
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Locked => write!(f, "Locked"),
            SessionState::AuthenticatingPassword => write!(f, "AuthenticatingPassword"),
            SessionState::AuthenticatingFingerprint => write!(f, "AuthenticatingFingerprint"),
            SessionState::MenuActive { page } => write!(f, "MenuActive({page})"),
        }
    }
}

/// A recorded state change.
///
/// The timestamp is monotonic and process-local, so it is not serialized.
/// Deserialized records carry the time of deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: SessionState,
    pub to: SessionState,
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    pub fn new(from: SessionState, to: SessionState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }
}

/// Validated session state with a bounded transition history.
#[derive(Debug)]
pub struct SessionMachine {
    current_state: SessionState,
    /// Oldest first, at most `MAX_HISTORY_SIZE` entries.
    history: VecDeque<StateTransition>,
}

impl SessionMachine {
    /// Create a machine in the `Locked` state.
    pub fn new() -> Self {
        Self {
            current_state: SessionState::Locked,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Builder for restoring a machine to a specific state.
    ///
    /// ```
    /// use doorlock_controller::{SessionMachine, SessionState};
    ///
    /// let machine = SessionMachine::builder()
    ///     .with_initial_state(SessionState::MenuActive { page: 1 })
    ///     .build();
    ///
    /// assert_eq!(machine.current_state(), &SessionState::MenuActive { page: 1 });
    /// ```
    pub fn builder() -> SessionMachineBuilder {
        SessionMachineBuilder::default()
    }

    pub fn current_state(&self) -> &SessionState {
        &self.current_state
    }

    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The most recent `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Move to `new_state` if the transition table allows it.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` and leaves the machine
    /// untouched when the move is not allowed.
    pub fn transition_to(&mut self, new_state: SessionState) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state);
        self.perform_state_change(new_state, transition.clone());
        Ok(transition)
    }

    /// Force the machine back to `Locked` from any state.
    pub fn reset(&mut self) -> StateTransition {
        let transition = StateTransition::new(self.current_state, SessionState::Locked);
        self.perform_state_change(SessionState::Locked, transition.clone());
        transition
    }

    fn perform_state_change(&mut self, new_state: SessionState, transition: StateTransition) {
        self.current_state = new_state;

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
pub struct SessionMachineBuilder {
    initial_state: Option<SessionState>,
    history: VecDeque<StateTransition>,
}

impl SessionMachineBuilder {
    pub fn with_initial_state(mut self, state: SessionState) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Pre-populate the history; entries beyond the cap are dropped oldest first.
    pub fn with_history(mut self, history: VecDeque<StateTransition>) -> Self {
        self.history = history;
        self
    }

    pub fn build(mut self) -> SessionMachine {
        while self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }

        SessionMachine {
            current_state: self.initial_state.unwrap_or(SessionState::Locked),
            history: self.history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use SessionState::*;

    const MENU0: SessionState = MenuActive { page: 0 };
    const MENU1: SessionState = MenuActive { page: 1 };

    #[rstest]
    #[case(Locked, AuthenticatingPassword)]
    #[case(Locked, AuthenticatingFingerprint)]
    #[case(Locked, MENU0)]
    #[case(AuthenticatingPassword, Locked)]
    #[case(AuthenticatingPassword, AuthenticatingFingerprint)]
    #[case(AuthenticatingPassword, MENU0)]
    #[case(AuthenticatingFingerprint, Locked)]
    #[case(AuthenticatingFingerprint, MENU0)]
    #[case(MENU0, MENU1)]
    #[case(MENU1, MENU0)]
    #[case(MENU1, Locked)]
    fn test_valid_transitions(#[case] from: SessionState, #[case] to: SessionState) {
        assert!(from.can_transition_to(&to), "{from} -> {to} should be allowed");
    }

    #[rstest]
    #[case(Locked, Locked)]
    #[case(Locked, MENU1)]
    #[case(AuthenticatingPassword, AuthenticatingPassword)]
    #[case(AuthenticatingFingerprint, AuthenticatingPassword)]
    #[case(AuthenticatingFingerprint, MENU1)]
    #[case(MENU0, AuthenticatingPassword)]
    #[case(MENU0, AuthenticatingFingerprint)]
    fn test_invalid_transitions(#[case] from: SessionState, #[case] to: SessionState) {
        assert!(!from.can_transition_to(&to), "{from} -> {to} should be rejected");
    }

    #[test]
    fn test_new_machine_is_locked() {
        let machine = SessionMachine::new();
        assert_eq!(machine.current_state(), &Locked);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_invalid_transition_leaves_state() {
        let mut machine = SessionMachine::new();
        let err = machine.transition_to(MENU1).unwrap_err();

        assert!(matches!(err, Error::InvalidStateTransition { .. }));
        assert_eq!(machine.current_state(), &Locked);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut machine = SessionMachine::builder()
            .with_initial_state(AuthenticatingFingerprint)
            .build();

        let transition = machine.reset();
        assert_eq!(transition.from, AuthenticatingFingerprint);
        assert_eq!(transition.to, Locked);

        // Locked -> Locked is only reachable through reset.
        machine.reset();
        assert_eq!(machine.history().len(), 2);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut machine = SessionMachine::builder().with_initial_state(MENU0).build();

        for i in 0..MAX_HISTORY_SIZE + 20 {
            machine
                .transition_to(MenuActive { page: i % 2 })
                .unwrap();
        }

        assert_eq!(machine.history().len(), MAX_HISTORY_SIZE);
        let last = machine.last_transitions(1);
        assert_eq!(last[0].to, MenuActive { page: (MAX_HISTORY_SIZE + 19) % 2 });
    }

    #[test]
    fn test_last_transitions_order() {
        let mut machine = SessionMachine::new();
        machine.transition_to(AuthenticatingPassword).unwrap();
        machine.transition_to(Locked).unwrap();
        machine.transition_to(AuthenticatingFingerprint).unwrap();

        let last = machine.last_transitions(2);
        assert_eq!(last.len(), 2);
        assert_eq!(last[0].to, Locked);
        assert_eq!(last[1].to, AuthenticatingFingerprint);
        assert_eq!(machine.last_transitions(10).len(), 3);
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&MenuActive { page: 1 }).unwrap();
        assert_eq!(json, r#"{"state":"menu_active","page":1}"#);

        let state: SessionState = serde_json::from_str(r#"{"state":"locked"}"#).unwrap();
        assert_eq!(state, Locked);
    }

    #[test]
    fn test_transition_serialization_skips_timestamp() {
        let transition = StateTransition::new(Locked, AuthenticatingPassword);
        let json = serde_json::to_value(&transition).unwrap();

        assert!(json.get("timestamp").is_none());
        assert_eq!(json["to"]["state"], "authenticating_password");
    }

    #[rstest]
    #[case(Locked, true)]
    #[case(AuthenticatingPassword, true)]
    #[case(AuthenticatingFingerprint, false)]
    #[case(MENU1, true)]
    fn test_idle_points(#[case] state: SessionState, #[case] idle: bool) {
        assert_eq!(state.is_idle_point(), idle);
    }
}
