//! Network transport for the supervisor link.
//!
//! # Components
//!
//! - [`TcpClient`]: one framed connection to the supervisor broker
//! - [`TcpRemoteChannel`]: the controller's [`RemoteChannel`] backed by a
//!   background task that keeps a [`TcpClient`] connected
//!
//! # Example
//!
//! ```no_run
//! use doorlock_network::{SupervisorLinkConfig, TcpRemoteChannel};
//! use doorlock_protocol::{OutboundEvent, RemoteChannel};
//!
//! # async fn example() {
//! let mut channel = TcpRemoteChannel::spawn(SupervisorLinkConfig::new("10.0.0.5:1883"));
//! channel.publish(OutboundEvent::DoorLocked);
//! # }
//! ```
//!
//! [`RemoteChannel`]: doorlock_protocol::RemoteChannel

mod client;
mod link;

pub use client::{TcpClient, TcpClientConfig, TcpClientError};
pub use link::{SupervisorLinkConfig, TcpRemoteChannel};
