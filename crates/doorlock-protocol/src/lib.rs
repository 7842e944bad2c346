//! Supervisor protocol for the door-access controller.
//!
//! The controller talks to a remote supervisor over three topics:
//!
//! | Topic | Direction | Content |
//! |-------|-----------|---------|
//! | `door/command` | inbound | [`InboundCommand`] |
//! | `door/status` | outbound | lock state and credential events |
//! | `door/fingerprint` | outbound | enrollment and match events |
//!
//! Messages travel as [`Envelope`]s framed by [`SupervisorCodec`]. The
//! controller itself only sees the [`RemoteChannel`] trait, which is
//! best-effort in both directions.

pub mod channel;
pub mod codec;
pub mod command;
pub mod envelope;
pub mod event;
pub mod mock;
pub mod topic;

pub use channel::{OfflineChannel, RemoteChannel};
pub use codec::SupervisorCodec;
pub use command::InboundCommand;
pub use envelope::Envelope;
pub use event::{FingerprintFailure, OutboundEvent};
pub use mock::{MockRemoteChannel, MockRemoteHandle};
pub use topic::Topic;
