//! Peripheral abstraction layer for the door-access controller.
//!
//! The controller never touches hardware directly. It drives four narrow
//! collaborator traits, and only their observable effect matters (key
//! characters, sensor outcomes, display text, actuator pulses):
//!
//! - [`KeypadDevice`]: polled, at most one key per call
//! - [`FingerprintSensor`]: enroll, search, and clear-all on a 127-slot
//!   template store
//! - [`DisplaySink`]: four lines of text plus an audible feedback pulse
//! - [`ActuatorControl`]: door strike pulse and the locked/unlocked lamps
//!
//! # Design Philosophy
//!
//! - **Async-first**: operations use native `async fn` in traits (Rust 1.90
//!   + Edition 2024 RPITIT). Sensor calls may take seconds; the control loop
//!   awaits them in place.
//! - **Static dispatch**: the controller is generic over its peripherals, so
//!   the traits do not need to be object-safe.
//! - **Error-aware**: every call returns [`Result<T>`][error::Result]. The
//!   controller decides which failures matter; display and actuator errors
//!   are logged and ignored.
//!
//! ```no_run
//! use doorlock_hardware::{FingerprintSensor, SearchOutcome, Result};
//!
//! async fn who_is_there<S: FingerprintSensor>(sensor: &mut S) -> Result<Option<u8>> {
//!     match sensor.search().await? {
//!         SearchOutcome::Matched(id) => Ok(Some(id.as_u8())),
//!         SearchOutcome::NoMatch => Ok(None),
//!     }
//! }
//! ```
//!
//! # Mock Implementations
//!
//! The [`mock`] module provides channel- and state-backed implementations of
//! every trait, each paired with a handle that tests use to inject input and
//! inspect effects.

#![allow(async_fn_in_trait)]

pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

pub use error::{HardwareError, Result};
pub use traits::{ActuatorControl, DisplaySink, FingerprintSensor, KeypadDevice};
pub use types::{Indicator, Key, Screen, SearchOutcome};
