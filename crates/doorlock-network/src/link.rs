//! Supervisor link with automatic reconnection.
//!
//! ```text
//! AccessController ── try_receive / publish ──> TcpRemoteChannel
//!                                                  │  (capacity-1 inbound,
//!                                                  │   bounded outbound)
//!                                                  ▼
//!                                            link task ──(TCP)──> supervisor
//! ```
//!
//! The controller side never blocks. The link task owns the socket,
//! announces `connected` on every successful connect, and retries no more
//! often than the configured interval.
//!
//! Every queued command is tagged with the session it arrived on. Once that
//! session ends the command is stale and is discarded instead of delivered.

use crate::client::{TcpClient, TcpClientConfig};
use doorlock_core::{Error, constants::DEFAULT_RECONNECT_INTERVAL_MS};
use doorlock_protocol::{Envelope, InboundCommand, OutboundEvent, RemoteChannel, Topic};
use futures::{SinkExt, StreamExt};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, info, trace, warn};

/// Outbound events buffered while the socket is busy.
const OUTBOUND_CAPACITY: usize = 32;

/// A command and the number of the session that delivered it.
type SessionCommand = (u64, InboundCommand);

/// Configuration for [`TcpRemoteChannel`].
#[derive(Debug, Clone)]
pub struct SupervisorLinkConfig {
    /// Supervisor address (`host:port`)
    pub server_addr: String,

    /// Timeout for connect and for each write
    pub io_timeout: Duration,

    /// Minimum time between two connection attempts
    pub retry_interval: Duration,
}

impl SupervisorLinkConfig {
    pub fn new(server_addr: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            io_timeout: Duration::from_secs(3),
            retry_interval: Duration::from_millis(DEFAULT_RECONNECT_INTERVAL_MS),
        }
    }

    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }
}

/// [`RemoteChannel`] backed by a TCP connection to the supervisor.
///
/// Dropping the channel stops the link task.
#[derive(Debug)]
pub struct TcpRemoteChannel {
    inbound_rx: mpsc::Receiver<SessionCommand>,
    outbound_tx: mpsc::Sender<OutboundEvent>,
    connected: Arc<AtomicBool>,
    session: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl TcpRemoteChannel {
    /// Start the link task on the current runtime.
    pub fn spawn(config: SupervisorLinkConfig) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(1);
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let connected = Arc::new(AtomicBool::new(false));
        let session = Arc::new(AtomicU64::new(0));

        let task = tokio::spawn(run_link(
            config,
            inbound_tx,
            outbound_rx,
            Arc::clone(&connected),
            Arc::clone(&session),
        ));

        Self {
            inbound_rx,
            outbound_tx,
            connected,
            session,
            task,
        }
    }
}

impl RemoteChannel for TcpRemoteChannel {
    fn try_receive(&mut self) -> Option<InboundCommand> {
        let connected = self.is_connected();
        let current = self.session.load(Ordering::SeqCst);

        while let Ok((session, command)) = self.inbound_rx.try_recv() {
            if connected && session == current {
                return Some(command);
            }
            debug!(
                "{}, discarding {} command",
                Error::ConnectivityLoss,
                command.name()
            );
        }
        None
    }

    fn publish(&mut self, event: OutboundEvent) {
        if !self.is_connected() {
            trace!("{}, dropping {}", Error::ConnectivityLoss, event);
            return;
        }
        match self.outbound_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => warn!("Outbound queue full, dropping {}", event),
            Err(TrySendError::Closed(event)) => debug!("Link stopped, dropping {}", event),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl Drop for TcpRemoteChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// How a connected session ended.
enum SessionEnd {
    /// Socket failed or the supervisor hung up; reconnect.
    Lost,
    /// The channel was dropped; stop.
    Shutdown,
}

async fn run_link(
    config: SupervisorLinkConfig,
    inbound_tx: mpsc::Sender<SessionCommand>,
    mut outbound_rx: mpsc::Receiver<OutboundEvent>,
    connected: Arc<AtomicBool>,
    session: Arc<AtomicU64>,
) {
    loop {
        let attempt = Instant::now();
        let mut client = TcpClient::new(TcpClientConfig {
            server_addr: config.server_addr.clone(),
            timeout: config.io_timeout,
        });

        match client.connect().await {
            Ok(()) => {
                let link = SessionLink {
                    id: session.load(Ordering::SeqCst),
                    inbound_tx: &inbound_tx,
                    connected: &connected,
                };
                let end = serve(client, &config, link, &mut outbound_rx).await;
                // Commands from the finished session are now stale.
                session.fetch_add(1, Ordering::SeqCst);
                connected.store(false, Ordering::SeqCst);
                if matches!(end, SessionEnd::Shutdown) {
                    return;
                }
                warn!("Supervisor link lost, retrying");
            }
            Err(e) => debug!("Supervisor unreachable: {}", e),
        }

        // Events queued for a dead connection are stale.
        while outbound_rx.try_recv().is_ok() {}
        if outbound_rx.is_closed() {
            return;
        }

        tokio::time::sleep_until(attempt + config.retry_interval).await;
    }
}

/// Controller-facing side of one connected session.
struct SessionLink<'a> {
    id: u64,
    inbound_tx: &'a mpsc::Sender<SessionCommand>,
    connected: &'a AtomicBool,
}

async fn serve(
    client: TcpClient,
    config: &SupervisorLinkConfig,
    link: SessionLink<'_>,
    outbound_rx: &mut mpsc::Receiver<OutboundEvent>,
) -> SessionEnd {
    let Ok(framed) = client.into_framed() else {
        return SessionEnd::Lost;
    };
    let (mut sink, mut stream) = framed.split::<Envelope>();

    let hello = OutboundEvent::Connected.to_envelope();
    match tokio::time::timeout(config.io_timeout, sink.send(hello)).await {
        Ok(Ok(())) => link.connected.store(true, Ordering::SeqCst),
        _ => return SessionEnd::Lost,
    }

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(envelope)) => {
                    if !forward_command(&envelope, link.id, link.inbound_tx) {
                        return SessionEnd::Shutdown;
                    }
                }
                Some(Err(e)) => {
                    warn!("Supervisor stream error: {}", e);
                    return SessionEnd::Lost;
                }
                None => return SessionEnd::Lost,
            },
            event = outbound_rx.recv() => match event {
                Some(event) => {
                    let sent = tokio::time::timeout(config.io_timeout, sink.send(event.to_envelope())).await;
                    if !matches!(sent, Ok(Ok(()))) {
                        return SessionEnd::Lost;
                    }
                    trace!("Published {}", event);
                }
                None => return SessionEnd::Shutdown,
            },
        }
    }
}

/// Hand a `door/command` envelope to the controller.
///
/// Returns `false` once the controller side is gone.
fn forward_command(
    envelope: &Envelope,
    session: u64,
    inbound_tx: &mpsc::Sender<SessionCommand>,
) -> bool {
    match envelope.topic() {
        Ok(Topic::Command) => {}
        Ok(topic) => {
            trace!("Ignoring message on {}", topic);
            return true;
        }
        Err(_) => {
            debug!("Ignoring message on unknown topic {}", envelope.topic);
            return true;
        }
    }

    let command = match InboundCommand::parse(&envelope.payload) {
        Ok(command) => command,
        Err(e) => {
            warn!("Ignoring supervisor command: {}", e);
            return true;
        }
    };

    let name = command.name();
    match inbound_tx.try_send((session, command)) {
        Ok(()) => {
            info!("Supervisor command {} queued", name);
            true
        }
        Err(TrySendError::Full(_)) => {
            warn!("Dropping {} command, another is pending", name);
            true
        }
        Err(TrySendError::Closed(_)) => false,
    }
}
