//! Mock peripherals for testing and development.
//!
//! Each mock is paired with a handle. The mock is handed to the
//! controller; the handle stays with the test to inject input and inspect
//! what the controller did.

pub mod actuator;
pub mod display;
pub mod fingerprint;
pub mod keypad;

pub use actuator::{ActuatorEvent, MockActuator, MockActuatorHandle};
pub use display::{MockDisplay, MockDisplayHandle};
pub use fingerprint::{MockFingerprintSensor, MockFingerprintHandle};
pub use keypad::{MockKeypad, MockKeypadHandle};
