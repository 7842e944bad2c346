//! Collaborator traits driven by the access controller.

use crate::{
    Result,
    types::{Indicator, Key, Screen, SearchOutcome},
};
use doorlock_core::FingerprintId;
use std::time::Duration;

/// Polled matrix keypad.
pub trait KeypadDevice: Send {
    /// Return the key pressed since the last poll, if any.
    ///
    /// Must not wait for input; the control loop calls this every cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is disconnected or a scan fails.
    async fn poll(&mut self) -> Result<Option<Key>>;
}

/// Optical fingerprint sensor with an on-board template store.
///
/// Every call may block for the duration of a capture. Capture timeouts
/// are the implementation's responsibility; the controller never retries.
pub trait FingerprintSensor: Send {
    /// Whether a template is stored in `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor cannot be queried.
    async fn exists(&mut self, id: FingerprintId) -> Result<bool>;

    /// Run the two-capture enrollment and store the template in `id`.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::EnrollmentFailed` if the captures cannot be
    /// merged or stored, or a communication error if the sensor fails.
    async fn enroll(&mut self, id: FingerprintId) -> Result<()>;

    /// Capture a finger and search the template store.
    ///
    /// # Errors
    ///
    /// Returns a communication error if the capture or search fails.
    /// "No match" is not an error.
    async fn search(&mut self) -> Result<SearchOutcome>;

    /// Delete every stored template.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor rejects or does not answer the request.
    async fn empty_database(&mut self) -> Result<()>;
}

/// Four-line character display with a buzzer.
pub trait DisplaySink: Send {
    /// Replace the whole display content.
    ///
    /// # Errors
    ///
    /// Returns an error if the display does not acknowledge the write.
    async fn show(&mut self, screen: &Screen) -> Result<()>;

    /// Sound the buzzer for `duration`.
    ///
    /// # Errors
    ///
    /// Returns an error if the buzzer cannot be driven.
    async fn feedback(&mut self, duration: Duration) -> Result<()>;
}

/// Door strike and status lamps.
pub trait ActuatorControl: Send {
    /// Open the door, hold it for the configured time, then close it.
    ///
    /// # Errors
    ///
    /// Returns an error if the actuator cannot be driven.
    async fn pulse_open(&mut self) -> Result<()>;

    /// Switch the lamp pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the lamps cannot be driven.
    async fn set_indicator(&mut self, indicator: Indicator) -> Result<()>;
}
