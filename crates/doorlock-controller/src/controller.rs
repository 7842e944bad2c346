//! The access controller and its control loop.
//!
//! [`AccessController`] owns every piece of mutable session state: the
//! session machine, the digit buffer, the credential, the failure counter,
//! the menu timers and the lockout window. One call to
//! [`AccessController::step`] handles at most one key and at most one
//! remote command; [`AccessController::run`] calls it on a fixed poll
//! interval until shutdown.
//!
//! Collaborator failures never stop the loop. Display and actuator errors
//! are logged and ignored, sensor errors become failed attempts, and
//! storage errors leave the new credential in memory only.
//!
//! # Example
//!
//! ```no_run
//! use doorlock_controller::{AccessController, ControllerConfig, Peripherals};
//! use doorlock_hardware::mock::{MockActuator, MockDisplay, MockFingerprintSensor, MockKeypad};
//! use doorlock_protocol::OfflineChannel;
//! use doorlock_storage::MemoryCredentialStore;
//!
//! # async fn example() {
//! let (keypad, keys) = MockKeypad::new();
//! let (sensor, _) = MockFingerprintSensor::new();
//! let (display, _) = MockDisplay::new();
//! let (actuator, _) = MockActuator::new();
//!
//! let mut controller = AccessController::new(
//!     Peripherals { keypad, sensor, display, actuator },
//!     MemoryCredentialStore::new(),
//!     OfflineChannel,
//!     ControllerConfig::default(),
//! );
//!
//! keys.type_keys("1234").unwrap();
//! controller.run(tokio::signal::ctrl_c()).await;
//! # }
//! ```

use crate::{
    enrollment,
    lockout::{Lockout, LockoutPolicy},
    menu::{self, Menu, MenuAction},
    state_machine::{SessionMachine, SessionState},
};
use doorlock_core::{
    Credential, CredentialError, Error, FailureCounter,
    constants::{
        CLEAR_ALL_PAUSE_MS, DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS,
        DEFAULT_SCROLL_INTERVAL_MS, FAILURE_BEEP_MS, FINGER_PROMPT_BEEP_MS, KEY_BEEP_MS,
        MASK_CHAR, PASSWORD_LENGTH, REMOTE_CHANGE_PAUSE_MS, RESULT_PAUSE_MS, SUCCESS_BEEP_MS,
        TIMEOUT_PAUSE_MS,
    },
};
use doorlock_hardware::{
    ActuatorControl, DisplaySink, FingerprintSensor, Indicator, Key, KeypadDevice, Screen,
    SearchOutcome,
};
use doorlock_protocol::{FingerprintFailure, InboundCommand, OutboundEvent, RemoteChannel};
use doorlock_storage::CredentialStore;
use std::{future::Future, time::Duration};
use tokio::time::{Instant, MissedTickBehavior, sleep};
use tracing::{debug, info, trace, warn};

/// Timing and policy knobs of the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Delay between two steps of [`AccessController::run`].
    pub poll_interval: Duration,
    pub scroll_interval: Duration,
    /// Menu (and new-password prompt) inactivity limit.
    pub idle_timeout: Duration,
    /// Pause after an authentication or menu action result.
    pub result_pause: Duration,
    pub remote_change_pause: Duration,
    pub timeout_pause: Duration,
    pub clear_all_pause: Duration,
    pub lockout: LockoutPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            scroll_interval: Duration::from_millis(DEFAULT_SCROLL_INTERVAL_MS),
            idle_timeout: Duration::from_millis(DEFAULT_IDLE_TIMEOUT_MS),
            result_pause: Duration::from_millis(RESULT_PAUSE_MS),
            remote_change_pause: Duration::from_millis(REMOTE_CHANGE_PAUSE_MS),
            timeout_pause: Duration::from_millis(TIMEOUT_PAUSE_MS),
            clear_all_pause: Duration::from_millis(CLEAR_ALL_PAUSE_MS),
            lockout: LockoutPolicy::default(),
        }
    }
}

impl ControllerConfig {
    pub fn with_lockout(mut self, lockout: LockoutPolicy) -> Self {
        self.lockout = lockout;
        self
    }
}

/// The four local peripherals handed to the controller.
#[derive(Debug)]
pub struct Peripherals<K, F, D, A> {
    pub keypad: K,
    pub sensor: F,
    pub display: D,
    pub actuator: A,
}

/// Door-access session controller.
pub struct AccessController<K, F, D, A, S, R> {
    keypad: K,
    sensor: F,
    display: D,
    actuator: A,
    store: S,
    remote: R,
    config: ControllerConfig,
    session: SessionMachine,
    menu: Menu,
    lockout: Lockout,
    credential: Credential,
    buffer: String,
    failures: FailureCounter,
}

impl<K, F, D, A, S, R> AccessController<K, F, D, A, S, R>
where
    K: KeypadDevice,
    F: FingerprintSensor,
    D: DisplaySink,
    A: ActuatorControl,
    S: CredentialStore,
    R: RemoteChannel,
{
    pub fn new(
        peripherals: Peripherals<K, F, D, A>,
        store: S,
        remote: R,
        config: ControllerConfig,
    ) -> Self {
        let Peripherals {
            keypad,
            sensor,
            display,
            actuator,
        } = peripherals;

        Self {
            keypad,
            sensor,
            display,
            actuator,
            store,
            remote,
            menu: Menu::new(config.scroll_interval, config.idle_timeout),
            lockout: Lockout::new(config.lockout),
            config,
            session: SessionMachine::new(),
            credential: Credential::default(),
            buffer: String::with_capacity(PASSWORD_LENGTH),
            failures: FailureCounter::new(),
        }
    }

    /// Load the stored credential and show the lock screen.
    ///
    /// A missing record yields the default password; an unreadable one is
    /// logged and the default is used as well.
    pub async fn start(&mut self) {
        match self.store.load().await {
            Ok(credential) => self.credential = credential,
            Err(e) => warn!(error = %e, "Could not load stored password, using default"),
        }
        info!(
            remote_connected = self.remote.is_connected(),
            lockout_enabled = self.config.lockout.enabled,
            "Door controller ready"
        );
        self.enter_locked().await;
    }

    pub fn state(&self) -> SessionState {
        *self.session.current_state()
    }

    pub fn session(&self) -> &SessionMachine {
        &self.session
    }

    /// Consecutive failed attempts.
    pub fn failures(&self) -> u32 {
        self.failures.get()
    }

    pub fn is_locked_out(&self) -> bool {
        self.lockout.is_active()
    }

    pub fn remote_connected(&self) -> bool {
        self.remote.is_connected()
    }

    /// Digits collected on the lock screen so far.
    pub fn pending_digits(&self) -> usize {
        self.buffer.len()
    }

    /// Run steps every poll interval until `shutdown` completes.
    pub async fn run<Fut>(&mut self, shutdown: Fut)
    where
        Fut: Future,
    {
        self.start().await;

        tokio::pin!(shutdown);
        let period = self.config.poll_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Control loop stopping");
                    break;
                }
                _ = ticker.tick() => self.step().await,
            }
        }
    }

    /// Advance the session by one poll cycle.
    pub async fn step(&mut self) {
        let now = Instant::now();
        let state = self.state();

        if state.is_idle_point()
            && let Some(command) = self.remote.try_receive()
        {
            self.handle_remote(command).await;
            return;
        }

        match state {
            SessionState::Locked | SessionState::AuthenticatingPassword => {
                self.step_lock_screen(now).await;
            }
            SessionState::MenuActive { .. } => self.step_menu(now).await,
            SessionState::AuthenticatingFingerprint => {
                warn!("Capture state left open, returning to lock screen");
                self.enter_locked().await;
            }
        }
    }

    async fn step_lock_screen(&mut self, now: Instant) {
        if self.lockout.is_active() {
            self.step_lockout(now).await;
            return;
        }

        let Some(key) = self.poll_key().await else {
            return;
        };
        match key {
            Key::Digit(digit) => self.push_digit(digit).await,
            Key::Hash => self.authenticate_fingerprint().await,
            other => trace!(key = %other, "Ignoring key on lock screen"),
        }
    }

    async fn step_lockout(&mut self, now: Instant) {
        if self.lockout.has_elapsed(now) {
            info!("Lockout window elapsed");
            self.lockout.clear();
            self.failures.reset();
            self.enter_locked().await;
            return;
        }

        if let Some(secs) = self.lockout.countdown_update(now) {
            self.show(lockout_screen(secs)).await;
        }
        if let Some(key) = self.poll_key().await {
            trace!(key = %key, "Ignoring key during lockout");
        }
    }

    async fn push_digit(&mut self, digit: u8) {
        let Some(c) = char::from_digit(u32::from(digit), 10) else {
            return;
        };
        if self.buffer.is_empty() {
            self.change_state(SessionState::AuthenticatingPassword);
        }

        self.buffer.push(c);
        self.beep(KEY_BEEP_MS).await;
        self.show(lock_screen(self.buffer.len())).await;

        if self.buffer.len() >= PASSWORD_LENGTH {
            let candidate = std::mem::take(&mut self.buffer);
            if self.credential.matches(&candidate) {
                info!("Password accepted");
                self.grant_access("Correct Pass!").await;
            } else {
                self.deny_access("Wrong Pass!").await;
            }
        }
    }

    async fn authenticate_fingerprint(&mut self) {
        self.buffer.clear();
        self.change_state(SessionState::AuthenticatingFingerprint);
        self.show(Screen::message("Scan Finger...")).await;
        self.beep(FINGER_PROMPT_BEEP_MS).await;

        match self.sensor.search().await {
            Ok(SearchOutcome::Matched(id)) => {
                info!(slot = %id, "Fingerprint matched");
                self.remote.publish(OutboundEvent::MatchSucceeded(id));
                self.grant_access("Finger OK!").await;
            }
            Ok(SearchOutcome::NoMatch) => {
                self.remote
                    .publish(OutboundEvent::MatchFailed(FingerprintFailure::NoMatch));
                self.deny_access("Finger Not Found").await;
            }
            Err(e) => {
                warn!(error = %e, "Fingerprint search failed");
                self.remote
                    .publish(OutboundEvent::MatchFailed(FingerprintFailure::SensorError));
                self.deny_access("Sensor Error").await;
            }
        }
    }

    async fn grant_access(&mut self, message: &str) {
        self.failures.reset();
        self.show(Screen::message(message)).await;
        self.beep(SUCCESS_BEEP_MS).await;
        self.indicate(Indicator::Unlocked).await;
        sleep(self.config.result_pause).await;

        self.remote.publish(OutboundEvent::DoorUnlocked);
        self.enter_menu().await;
    }

    async fn deny_access(&mut self, message: &str) {
        let attempts = self.failures.increment();
        warn!(attempts, "Authentication failed");

        self.show(Screen::message(message)).await;
        self.beep(FAILURE_BEEP_MS).await;
        self.remote
            .publish(OutboundEvent::WrongPassword { attempts });
        self.buffer.clear();
        sleep(self.config.result_pause).await;

        self.enter_locked().await;
        if self.lockout.engage(attempts, Instant::now()) {
            warn!(
                attempts,
                duration_secs = self.config.lockout.duration.as_secs(),
                "Too many failures, keypad locked out"
            );
        }
    }

    async fn enter_locked(&mut self) {
        self.buffer.clear();
        self.change_state(SessionState::Locked);
        self.lockout.force_redraw();
        self.show(lock_screen(0)).await;
        self.indicate(Indicator::Locked).await;
    }

    async fn enter_menu(&mut self) {
        self.buffer.clear();
        self.lockout.clear();
        self.indicate(Indicator::Unlocked).await;
        self.beep(SUCCESS_BEEP_MS).await;
        self.refresh_menu().await;
    }

    /// Back to page 0 with both menu timers restarted.
    async fn refresh_menu(&mut self) {
        self.change_state(SessionState::MenuActive { page: 0 });
        self.menu.reset(Instant::now());
        self.show(menu::page_screen(0)).await;
    }

    async fn step_menu(&mut self, now: Instant) {
        if let Some(key) = self.poll_key().await {
            self.menu.touch(now);
            if let Some(action) = MenuAction::from_key(key) {
                info!(action = %action, "Menu action selected");
                self.run_action(action).await;
                return;
            }
        }

        if let Some(page) = self.menu.tick_scroll(now) {
            self.change_state(SessionState::MenuActive { page });
            self.show(menu::page_screen(page)).await;
        }

        if self.menu.idle_expired(now) {
            info!("Menu idle, exiting");
            self.menu_timeout().await;
        }
    }

    async fn run_action(&mut self, action: MenuAction) {
        match action {
            MenuAction::OpenDoor => self.open_door().await,
            MenuAction::ChangePassword => self.change_password_locally().await,
            MenuAction::AddFingerprint => self.add_fingerprint().await,
            MenuAction::Exit => self.exit_menu().await,
        }
    }

    async fn open_door(&mut self) {
        self.show(Screen::message("Door Opening...")).await;
        if let Err(e) = self.actuator.pulse_open().await {
            debug!(error = %e, "Door actuator failed");
        }
        self.refresh_menu().await;
    }

    /// New-password prompt. Remote commands wait until it closes.
    async fn change_password_locally(&mut self) {
        let mut candidate = String::with_capacity(PASSWORD_LENGTH);
        self.show(new_password_screen(0)).await;

        while candidate.len() < PASSWORD_LENGTH {
            if let Some(key) = self.poll_key().await {
                self.menu.touch(Instant::now());
                if let Some(c) = key
                    .as_digit()
                    .and_then(|d| char::from_digit(u32::from(d), 10))
                {
                    candidate.push(c);
                    self.beep(KEY_BEEP_MS).await;
                    self.show(new_password_screen(candidate.len())).await;
                }
                continue;
            }

            if self.menu.idle_expired(Instant::now()) {
                info!("Password prompt idle, exiting");
                self.menu_timeout().await;
                return;
            }
            sleep(self.config.poll_interval).await;
        }

        match Credential::new(&candidate) {
            Ok(credential) => {
                self.replace_credential(credential).await;
                self.remote.publish(OutboundEvent::PasswordChanged);
                self.show(Screen::message("Pass Changed!")).await;
                sleep(self.config.result_pause).await;
            }
            Err(e) => warn!(error = %e, "Rejected new password"),
        }
        self.refresh_menu().await;
    }

    async fn add_fingerprint(&mut self) {
        self.show(Screen::message("Add Finger...")).await;

        match enrollment::enroll_next(&mut self.sensor).await {
            Ok(id) => {
                info!(slot = %id, "Fingerprint enrolled");
                self.remote.publish(OutboundEvent::EnrollSucceeded(id));
                self.show(Screen::message("Add Success")).await;
                self.beep(SUCCESS_BEEP_MS).await;
            }
            Err(Error::DatabaseFull) => {
                warn!("Fingerprint store is full");
                self.remote.publish(OutboundEvent::EnrollFailed);
                self.show(Screen::message("DB Full")).await;
                self.beep(FAILURE_BEEP_MS).await;
            }
            Err(e) => {
                warn!(error = %e, "Fingerprint enrollment failed");
                self.remote.publish(OutboundEvent::EnrollFailed);
                self.show(Screen::message("Add Fail")).await;
                self.beep(FAILURE_BEEP_MS).await;
            }
        }

        sleep(self.config.result_pause).await;
        self.refresh_menu().await;
    }

    async fn menu_timeout(&mut self) {
        self.show(Screen::message("Timeout").with_line(1, "Auto exiting..."))
            .await;
        sleep(self.config.timeout_pause).await;
        self.exit_menu().await;
    }

    async fn exit_menu(&mut self) {
        self.remote.publish(OutboundEvent::DoorLocked);
        self.show(Screen::message("Exit Menu")).await;
        sleep(self.config.result_pause).await;
        info!("Menu closed");
        self.enter_locked().await;
    }

    async fn handle_remote(&mut self, command: InboundCommand) {
        info!(command = command.name(), "Remote command received");

        match command {
            InboundCommand::Unlock => {
                self.failures.reset();
                self.remote.publish(OutboundEvent::DoorUnlocked);
                self.enter_menu().await;
            }
            InboundCommand::ClearAllFingerprints => self.clear_all_fingerprints().await,
            InboundCommand::ChangePassword { password } => {
                self.change_password_remotely(&password).await;
            }
        }
    }

    async fn clear_all_fingerprints(&mut self) {
        self.show(Screen::message("Clear all fingers...")).await;

        let cleared = match self.sensor.empty_database().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Clearing fingerprints failed");
                false
            }
        };
        self.remote.publish(if cleared {
            OutboundEvent::ClearAllSucceeded
        } else {
            OutboundEvent::ClearAllFailed
        });
        info!(cleared, "Clear-all finished");

        sleep(self.config.clear_all_pause).await;
        self.show(Screen::message(if cleared { "OK" } else { "Fail" }))
            .await;
        sleep(self.config.clear_all_pause).await;
        self.enter_locked().await;
    }

    async fn change_password_remotely(&mut self, candidate: &str) {
        let credential = match Credential::new(candidate) {
            Ok(credential) => credential,
            Err(Error::InvalidCredential(reason)) => {
                warn!(reason = %reason, "Rejected remote password change");
                self.remote.publish(match reason {
                    CredentialError::Length { .. } => OutboundEvent::PasswordErrorLength,
                    CredentialError::Format => OutboundEvent::PasswordErrorFormat,
                });
                return;
            }
            Err(e) => {
                warn!(error = %e, "Rejected remote password change");
                return;
            }
        };

        self.replace_credential(credential).await;
        self.remote.publish(OutboundEvent::PasswordChanged);
        let screen = Screen::message("Password Changed")
            .with_line(1, format!("New: {}", mask(PASSWORD_LENGTH)));
        self.show(screen).await;
        self.beep(SUCCESS_BEEP_MS).await;
        sleep(self.config.remote_change_pause).await;

        self.lockout.clear();
        self.enter_locked().await;
    }

    /// Swap in a new credential and persist it.
    ///
    /// The in-memory credential changes even when the write fails.
    async fn replace_credential(&mut self, credential: Credential) {
        if let Err(e) = self.store.save(&credential).await {
            warn!(error = %e, "Could not persist new password, keeping it in memory only");
        }
        self.credential = credential;
        self.failures.reset();
        info!("Password changed");
    }

    fn change_state(&mut self, target: SessionState) {
        let current = self.state();
        if current == target {
            return;
        }

        match self.session.transition_to(target) {
            Ok(transition) if current.is_menu() && target.is_menu() => {
                debug!(from = %transition.from, to = %transition.to, "Menu page changed");
            }
            Ok(transition) => {
                info!(from = %transition.from, to = %transition.to, "Session state changed");
            }
            Err(e) if target == SessionState::Locked => {
                warn!(error = %e, "Forcing session back to Locked");
                self.session.reset();
            }
            Err(e) => warn!(error = %e, "Session transition refused"),
        }
    }

    async fn poll_key(&mut self) -> Option<Key> {
        match self.keypad.poll().await {
            Ok(key) => key,
            Err(e) => {
                debug!(error = %e, "Keypad poll failed");
                None
            }
        }
    }

    async fn show(&mut self, screen: Screen) {
        if let Err(e) = self.display.show(&screen).await {
            debug!(error = %e, "Display update failed");
        }
    }

    async fn beep(&mut self, millis: u64) {
        if let Err(e) = self.display.feedback(Duration::from_millis(millis)).await {
            debug!(error = %e, "Buzzer failed");
        }
    }

    async fn indicate(&mut self, indicator: Indicator) {
        if let Err(e) = self.actuator.set_indicator(indicator).await {
            debug!(error = %e, "Indicator update failed");
        }
    }
}

fn mask(len: usize) -> String {
    std::iter::repeat_n(MASK_CHAR, len).collect()
}

fn lock_screen(digits: usize) -> Screen {
    Screen::from_lines(&["Enter Password:", &mask(digits), "", "Press # for finger"])
}

fn new_password_screen(digits: usize) -> Screen {
    Screen::message("New Pass:").with_line(1, mask(digits))
}

fn lockout_screen(secs: u64) -> Screen {
    Screen::message("Locked!").with_line(1, format!("{secs}s"))
}
