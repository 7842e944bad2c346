//! Terminal-backed peripherals for running the controller without hardware.
//!
//! Standard input is read line by line. Plain lines are keypad input, one key
//! per character (`1234`, `#`, `3`). Lines starting with `!` drive the
//! simulated fingerprint sensor:
//!
//! | Line            | Effect                                     |
//! |-----------------|--------------------------------------------|
//! | `!finger <n>`   | finger enrolled in slot `n` (or a new one) |
//! | `!nofinger`     | a finger that matches no template          |
//! | `!sensor-error` | the sensor fails the capture               |
//!
//! The display is a `VirtualDisplay`, which renders to the log.

use doorlock_core::FingerprintId;
use doorlock_hardware::{
    ActuatorControl, FingerprintSensor, HardwareError, Indicator, Key, KeypadDevice, Result,
    SearchOutcome,
};
use std::{collections::BTreeSet, time::Duration};
use thiserror::Error;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::mpsc,
    task::JoinHandle,
    time::{sleep, timeout},
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("Not a keypad key: {0:?}")]
    InvalidKey(char),

    #[error("Unknown sensor command: {0}")]
    UnknownCommand(String),

    #[error("Invalid fingerprint slot: {0}")]
    InvalidSlot(String),
}

/// What the person in front of the simulated sensor does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorCommand {
    /// Present the finger stored in (or destined for) this slot.
    Finger(FingerprintId),
    /// Present a finger with no stored template.
    NoFinger,
    /// Make the capture fail.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Keys(Vec<Key>),
    Sensor(SensorCommand),
}

/// Parse one console line. Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns `ConsoleError` for characters the keypad does not have and for
/// malformed `!` commands.
pub fn parse_line(line: &str) -> std::result::Result<Option<ConsoleInput>, ConsoleError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    if let Some(command) = line.strip_prefix('!') {
        let mut parts = command.split_whitespace();
        let sensor = match (parts.next(), parts.next(), parts.next()) {
            (Some("finger" | "f"), Some(slot), None) => slot
                .parse::<u16>()
                .ok()
                .and_then(|id| FingerprintId::new(id).ok())
                .map(SensorCommand::Finger)
                .ok_or_else(|| ConsoleError::InvalidSlot(slot.to_string()))?,
            (Some("nofinger" | "n"), None, None) => SensorCommand::NoFinger,
            (Some("sensor-error" | "e"), None, None) => SensorCommand::Error,
            _ => return Err(ConsoleError::UnknownCommand(line.to_string())),
        };
        return Ok(Some(ConsoleInput::Sensor(sensor)));
    }

    line.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| Key::from_char(c).ok_or(ConsoleError::InvalidKey(c)))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(|keys| Some(ConsoleInput::Keys(keys)))
}

/// Route lines from `reader` to the keypad and sensor channels until EOF.
///
/// Bad lines are logged and skipped. Returns early once both receivers are
/// gone.
pub async fn pump_lines<R>(
    reader: R,
    keys: mpsc::UnboundedSender<Key>,
    sensor: mpsc::UnboundedSender<SensorCommand>,
) where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Console read failed: {}", e);
                break;
            }
        };

        match parse_line(&line) {
            Ok(Some(ConsoleInput::Keys(pressed))) => {
                for key in pressed {
                    if keys.send(key).is_err() {
                        debug!("Keypad receiver dropped");
                    }
                }
            }
            Ok(Some(ConsoleInput::Sensor(command))) => {
                if sensor.send(command).is_err() {
                    debug!("Sensor receiver dropped");
                }
            }
            Ok(None) => {}
            Err(e) => warn!("{}", e),
        }

        if keys.is_closed() && sensor.is_closed() {
            break;
        }
    }
    debug!("Console input closed");
}

/// Channels fed by the stdin reader task.
#[derive(Debug)]
pub struct ConsoleInputs {
    pub keypad: ConsoleKeypad,
    pub sensor_commands: mpsc::UnboundedReceiver<SensorCommand>,
    pub reader: JoinHandle<()>,
}

/// Spawn a task that reads standard input for the console peripherals.
pub fn spawn_stdin_reader() -> ConsoleInputs {
    let (key_tx, key_rx) = mpsc::unbounded_channel();
    let (sensor_tx, sensor_rx) = mpsc::unbounded_channel();
    let reader = tokio::spawn(async move {
        pump_lines(BufReader::new(tokio::io::stdin()), key_tx, sensor_tx).await;
    });

    ConsoleInputs {
        keypad: ConsoleKeypad::new(key_rx),
        sensor_commands: sensor_rx,
        reader,
    }
}

/// Keypad fed from console lines.
#[derive(Debug)]
pub struct ConsoleKeypad {
    keys: mpsc::UnboundedReceiver<Key>,
}

impl ConsoleKeypad {
    pub fn new(keys: mpsc::UnboundedReceiver<Key>) -> Self {
        Self { keys }
    }
}

impl KeypadDevice for ConsoleKeypad {
    async fn poll(&mut self) -> Result<Option<Key>> {
        // A closed console leaves the keypad idle; remote commands still work.
        match self.keys.try_recv() {
            Ok(key) => Ok(Some(key)),
            Err(mpsc::error::TryRecvError::Empty | mpsc::error::TryRecvError::Disconnected) => {
                Ok(None)
            }
        }
    }
}

/// Fingerprint sensor whose captures are answered from the console.
#[derive(Debug)]
pub struct SimulatedSensor {
    slots: BTreeSet<u8>,
    commands: mpsc::UnboundedReceiver<SensorCommand>,
    capture_timeout: Duration,
}

impl SimulatedSensor {
    pub fn new(commands: mpsc::UnboundedReceiver<SensorCommand>, capture_timeout: Duration) -> Self {
        Self {
            slots: BTreeSet::new(),
            commands,
            capture_timeout,
        }
    }

    pub fn enrolled(&self) -> impl Iterator<Item = u8> + '_ {
        self.slots.iter().copied()
    }

    /// Wait for the next sensor line typed after the capture started.
    async fn capture(&mut self) -> Result<SensorCommand> {
        while let Ok(stale) = self.commands.try_recv() {
            debug!(
                target: "doorlock::sensor",
                ?stale,
                "Ignoring sensor input from before the capture"
            );
        }
        info!(
            target: "doorlock::sensor",
            "Waiting for finger (!finger <n>, !nofinger, !sensor-error)"
        );
        match timeout(self.capture_timeout, self.commands.recv()).await {
            Ok(Some(SensorCommand::Error)) => {
                Err(HardwareError::communication("Simulated capture failure"))
            }
            Ok(Some(command)) => Ok(command),
            Ok(None) => Err(HardwareError::disconnected("Console input closed")),
            Err(_) => Err(HardwareError::timeout(
                u64::try_from(self.capture_timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        }
    }
}

impl FingerprintSensor for SimulatedSensor {
    async fn exists(&mut self, id: FingerprintId) -> Result<bool> {
        Ok(self.slots.contains(&id.as_u8()))
    }

    async fn enroll(&mut self, id: FingerprintId) -> Result<()> {
        match self.capture().await {
            Ok(_) => {
                self.slots.insert(id.as_u8());
                info!(target: "doorlock::sensor", slot = %id, "Template stored");
                Ok(())
            }
            Err(e) => Err(HardwareError::enrollment_failed(e.to_string())),
        }
    }

    async fn search(&mut self) -> Result<SearchOutcome> {
        let outcome = match self.capture().await? {
            SensorCommand::Finger(id) if self.slots.contains(&id.as_u8()) => {
                SearchOutcome::Matched(id)
            }
            _ => SearchOutcome::NoMatch,
        };
        debug!(target: "doorlock::sensor", ?outcome, "Search finished");
        Ok(outcome)
    }

    async fn empty_database(&mut self) -> Result<()> {
        let removed = self.slots.len();
        self.slots.clear();
        info!(target: "doorlock::sensor", removed, "Template store emptied");
        Ok(())
    }
}

/// Door strike and lamps that only log what they would do.
#[derive(Debug, Clone)]
pub struct ConsoleActuator {
    open_hold: Duration,
    indicator: Option<Indicator>,
}

impl ConsoleActuator {
    pub fn new(open_hold: Duration) -> Self {
        Self {
            open_hold,
            indicator: None,
        }
    }

    pub fn indicator(&self) -> Option<Indicator> {
        self.indicator
    }
}

impl ActuatorControl for ConsoleActuator {
    async fn pulse_open(&mut self) -> Result<()> {
        info!(target: "doorlock::door", hold = ?self.open_hold, "Door open");
        sleep(self.open_hold).await;
        info!(target: "doorlock::door", "Door closed");
        Ok(())
    }

    async fn set_indicator(&mut self, indicator: Indicator) -> Result<()> {
        if self.indicator != Some(indicator) {
            info!(target: "doorlock::door", ?indicator, "Indicator");
            self.indicator = Some(indicator);
        }
        Ok(())
    }
}
