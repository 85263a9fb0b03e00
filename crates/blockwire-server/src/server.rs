//! TCP accept loop for the relay.
//!
//! Each accepted socket is split in two. A writer task drains the
//! connection's [`Outbox`] into framed writes; the reader loop feeds frames
//! to a [`ConnectionDispatcher`]. When the reader stops, for whatever reason,
//! the dispatcher is closed exactly once.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use blockwire_net::{DEFAULT_PORT, FrameConfig, FrameError, read_frame, write_frame};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, watch};

use crate::dispatcher::{ConnectionDispatcher, RelayState};
use crate::session::Outbox;

/// Configuration for [`RelayServer`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Default: `0.0.0.0:4000`.
    pub bind_addr: SocketAddr,
    pub frame: FrameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            frame: FrameConfig::default(),
        }
    }
}

/// The relay process: accepts clients and runs one dispatcher per connection.
pub struct RelayServer {
    config: ServerConfig,
    relay: Arc<RelayState>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl RelayServer {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_state(config, RelayState::default())
    }

    /// Run on top of existing registry and log instances.
    pub fn with_state(config: ServerConfig, relay: RelayState) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            config,
            relay: Arc::new(relay),
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn relay(&self) -> &Arc<RelayState> {
        &self.relay
    }

    /// Bind the configured address and serve until [`shutdown`](Self::shutdown).
    pub async fn run(&self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!("Relay listening on {}", listener.local_addr()?);
        self.run_with_listener(listener).await
    }

    /// Serve on a pre-bound listener.
    pub async fn run_with_listener(&self, listener: TcpListener) -> std::io::Result<()> {
        let mut shutdown_rx = self.shutdown_rx.clone();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, peer) = match result {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            tracing::warn!("Accept failed: {e}");
                            continue;
                        }
                    };
                    if let Err(e) = stream.set_nodelay(true) {
                        tracing::debug!("Could not set TCP_NODELAY for {peer}: {e}");
                    }
                    tracing::info!("New connection from {peer}");

                    let (reader, writer) = stream.into_split();
                    let (outbox, outbound) = Outbox::channel();

                    tokio::spawn(write_loop(writer, outbound, self.config.frame.clone(), peer));

                    let dispatcher = ConnectionDispatcher::new(Arc::clone(&self.relay), outbox);
                    let frame = self.config.frame.clone();
                    let mut task_shutdown = self.shutdown_rx.clone();
                    tokio::spawn(async move {
                        read_loop(dispatcher, reader, frame, peer, &mut task_shutdown).await;
                    });
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Relay shutting down");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

async fn read_loop(
    mut dispatcher: ConnectionDispatcher,
    mut reader: OwnedReadHalf,
    config: FrameConfig,
    peer: SocketAddr,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            frame = read_frame(&mut reader, &config) => match frame {
                Ok(payload) => {
                    if let Err(e) = dispatcher.handle_frame(&payload).await {
                        tracing::warn!("Dropped message from {peer}: {e}");
                    }
                    if dispatcher.is_closed() {
                        break;
                    }
                }
                Err(FrameError::ConnectionClosed) => {
                    tracing::debug!("{peer} closed the connection");
                    break;
                }
                Err(e) => {
                    tracing::warn!("Transport error from {peer}: {e}");
                    break;
                }
            },
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    dispatcher.close().await;
    tracing::info!("Connection from {peer} closed");
}

/// Drains an outbox onto the socket. Exits when every sender is gone or a
/// write fails; later sends to this connection are then silently dropped.
async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<Arc<[u8]>>,
    config: FrameConfig,
    peer: SocketAddr,
) {
    while let Some(payload) = outbound.recv().await {
        if let Err(e) = write_frame(&mut writer, &payload, &config).await {
            tracing::debug!("Write to {peer} failed: {e}");
            break;
        }
    }
}
