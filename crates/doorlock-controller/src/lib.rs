//! Door-access session controller.
//!
//! This crate holds everything that decides what the door does: the
//! session state machine, the paged menu, the optional lockout policy and
//! the [`AccessController`] that drives the peripherals, the credential
//! store and the supervisor channel from a single control loop.
//!
//! | module | role |
//! |---|---|
//! | [`state_machine`] | validated session states with bounded history |
//! | [`menu`] | action catalog, pages, scroll and idle timers |
//! | [`lockout`] | refusal window after repeated failures (off by default) |
//! | [`enrollment`] | lowest-free-slot fingerprint enrollment |
//! | [`controller`] | [`AccessController`], `step` and `run` |
//! | [`display`] | [`VirtualDisplay`], a 4x20 LCD rendered to the log |
//!
//! All mutable state lives in the controller value owned by the loop;
//! there are no globals.

#![allow(async_fn_in_trait)]

pub mod controller;
pub mod display;
pub mod enrollment;
pub mod lockout;
pub mod menu;
pub mod state_machine;

pub use controller::{AccessController, ControllerConfig, Peripherals};
pub use display::VirtualDisplay;
pub use lockout::{Lockout, LockoutPolicy};
pub use menu::{Menu, MenuAction};
pub use state_machine::{SessionMachine, SessionMachineBuilder, SessionState, StateTransition};
