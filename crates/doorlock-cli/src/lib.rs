//! Command-line front end for the door-access controller.
//!
//! - [`config`]: `doorlock.toml` loading and validation
//! - [`logging`]: `tracing` subscriber setup
//! - [`console`]: stdin-driven keypad and fingerprint sensor, logging actuator

pub mod config;
pub mod console;
pub mod logging;

pub use config::{ConfigError, DoorlockConfig};
pub use console::{ConsoleActuator, ConsoleKeypad, SimulatedSensor, spawn_stdin_reader};
pub use logging::init_logging;
