//! TCP client for the supervisor link.
//!
//! The client is a thin transport: it connects with a timeout, frames
//! [`Envelope`]s with [`SupervisorCodec`], and reports errors to the
//! caller. Reconnection policy lives in [`TcpRemoteChannel`].
//!
//! [`TcpRemoteChannel`]: crate::TcpRemoteChannel

use doorlock_protocol::{Envelope, SupervisorCodec};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, error, info, trace, warn};

/// Configuration for TCP client
///
/// # Example
///
/// ```
/// use doorlock_network::TcpClientConfig;
/// use std::time::Duration;
///
/// let config = TcpClientConfig {
///     server_addr: "127.0.0.1:1883".to_string(),
///     timeout: Duration::from_millis(5000),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct TcpClientConfig {
    /// Server address (`host:port`)
    pub server_addr: String,

    /// Timeout for connect, send and recv
    pub timeout: Duration,
}

impl Default for TcpClientConfig {
    fn default() -> Self {
        Self {
            server_addr: format!(
                "127.0.0.1:{}",
                doorlock_core::constants::DEFAULT_SUPERVISOR_PORT
            ),
            timeout: Duration::from_millis(3000),
        }
    }
}

/// Errors that can occur during TCP client operations
#[derive(Debug, Error)]
pub enum TcpClientError {
    /// Client is not connected to server
    #[error("Not connected to server")]
    NotConnected,

    /// Connection attempt timed out
    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    /// Read operation timed out
    #[error("Read timeout after {0}ms")]
    ReadTimeout(u64),

    /// Write operation timed out
    #[error("Write timeout after {0}ms")]
    WriteTimeout(u64),

    /// Connection was lost during operation
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Framing error from SupervisorCodec
    #[error("Protocol error: {0}")]
    Protocol(#[from] doorlock_core::Error),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// TCP client for the supervisor link
///
/// # Example
///
/// ```no_run
/// use doorlock_network::{TcpClient, TcpClientConfig};
/// use doorlock_protocol::{Envelope, Topic};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut client = TcpClient::new(TcpClientConfig::default());
/// client.connect().await?;
/// client.send(Envelope::new(Topic::Status, "connected")).await?;
/// client.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct TcpClient {
    server_addr: String,

    /// Framed TCP stream (None if not connected)
    framed: Option<Framed<TcpStream, SupervisorCodec>>,

    timeout: Duration,
}

impl TcpClient {
    /// Create a new TCP client; call `connect()` before use.
    pub fn new(config: TcpClientConfig) -> Self {
        debug!("Creating TCP client for server {}", config.server_addr);

        Self {
            server_addr: config.server_addr,
            framed: None,
            timeout: config.timeout,
        }
    }

    /// Connect to the supervisor.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection times out, is refused, or the
    /// address cannot be resolved.
    pub async fn connect(&mut self) -> Result<(), TcpClientError> {
        debug!("Connecting to supervisor at {}", self.server_addr);

        let stream = match tokio::time::timeout(
            self.timeout,
            TcpStream::connect(self.server_addr.as_str()),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                debug!("Connection to {} failed: {}", self.server_addr, e);
                return Err(e.into());
            }
            Err(_) => {
                return Err(TcpClientError::ConnectionTimeout(
                    self.timeout.as_millis() as u64,
                ));
            }
        };

        // Status events are tiny; do not let Nagle hold them back.
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        self.framed = Some(Framed::new(stream, SupervisorCodec::new()));
        info!("Connected to supervisor at {}", self.server_addr);
        Ok(())
    }

    /// Send one envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if not connected, the write times out, or the
    /// connection is lost.
    pub async fn send(&mut self, envelope: Envelope) -> Result<(), TcpClientError> {
        trace!(topic = %envelope.topic, "Sending envelope");
        let framed = self.framed.as_mut().ok_or(TcpClientError::NotConnected)?;

        match tokio::time::timeout(self.timeout, framed.send(envelope)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!("Failed to send envelope: {}", e);
                Err(TcpClientError::Protocol(e))
            }
            Err(_) => Err(TcpClientError::WriteTimeout(self.timeout.as_millis() as u64)),
        }
    }

    /// Wait for one envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if not connected, nothing arrives within the
    /// timeout, or the server closes the connection.
    pub async fn recv(&mut self) -> Result<Envelope, TcpClientError> {
        let framed = self.framed.as_mut().ok_or(TcpClientError::NotConnected)?;

        match tokio::time::timeout(self.timeout, framed.next()).await {
            Ok(Some(Ok(envelope))) => {
                trace!(topic = %envelope.topic, "Received envelope");
                Ok(envelope)
            }
            Ok(Some(Err(e))) => Err(TcpClientError::Protocol(e)),
            Ok(None) => Err(TcpClientError::ConnectionLost(
                "Server closed connection".to_string(),
            )),
            Err(_) => Err(TcpClientError::ReadTimeout(self.timeout.as_millis() as u64)),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.framed.is_some()
    }

    /// Hand the framed stream to a long-lived task.
    ///
    /// # Errors
    ///
    /// Returns `TcpClientError::NotConnected` if `connect()` has not succeeded.
    pub fn into_framed(self) -> Result<Framed<TcpStream, SupervisorCodec>, TcpClientError> {
        self.framed.ok_or(TcpClientError::NotConnected)
    }

    /// Shut the connection down.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket shutdown fails.
    pub async fn close(&mut self) -> Result<(), TcpClientError> {
        if let Some(framed) = self.framed.take() {
            let mut stream = framed.into_inner();
            stream.shutdown().await?;
            debug!("Connection to {} closed", self.server_addr);
        }
        Ok(())
    }
}
