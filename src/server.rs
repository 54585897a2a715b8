use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio::time;
use tracing::{debug, error, info, instrument, warn};

use crate::codec;
use crate::commands::executable::Executable;
use crate::commands::Command;
use crate::connection::Connection;
use crate::response::Response;
use crate::shutdown::Shutdown;
use crate::store::Store;
use crate::Error;

/// How long a connection may go without producing a complete frame before the
/// server closes it.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// How long a shutdown waits for in-flight handlers to drain before giving up
/// on them.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub idle_timeout: Duration,
    pub max_frame_size: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_frame_size: codec::DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Runs the server on an already-bound listener until `shutdown` completes.
///
/// Binding is left to the caller so that bind failures surface where they are
/// process-fatal, while everything that happens here is contained per
/// connection. When `shutdown` resolves, the listener stops accepting, every
/// live handler is notified, and in-flight responses get a bounded grace
/// period to flush before the function returns.
pub async fn run(listener: TcpListener, config: Config, shutdown: impl Future) -> Result<(), Error> {
    let (notify_shutdown, _) = broadcast::channel(1);
    let (shutdown_complete_tx, mut shutdown_complete_rx) = mpsc::channel::<()>(1);

    let mut server = Listener {
        listener,
        store: Store::new(),
        config,
        notify_shutdown,
        shutdown_complete_tx,
    };

    info!(
        "Key-value server listening on {}",
        server.listener.local_addr()?
    );

    tokio::select! {
        res = server.accept_loop() => {
            if let Err(e) = res {
                error!(cause = %e, "failed to accept");
            }
        }
        _ = shutdown => {
            info!("shutdown signal received");
        }
    }

    // Dropping the listener stops new connections; dropping the broadcast
    // sender resolves every handler's `Shutdown`. Fields elided by `..` in a
    // destructuring pattern live until end of scope, so both are bound and
    // dropped explicitly here.
    let Listener {
        listener,
        notify_shutdown,
        shutdown_complete_tx,
        ..
    } = server;
    drop(listener);
    drop(notify_shutdown);
    drop(shutdown_complete_tx);

    // Handlers hold clones of the completion sender; `recv` resolves once the
    // last clone is dropped.
    if time::timeout(SHUTDOWN_GRACE_PERIOD, shutdown_complete_rx.recv())
        .await
        .is_err()
    {
        warn!("grace period elapsed; abandoning remaining connections");
    }

    Ok(())
}

struct Listener {
    listener: TcpListener,
    store: Store,
    config: Config,
    notify_shutdown: broadcast::Sender<()>,
    shutdown_complete_tx: mpsc::Sender<()>,
}

impl Listener {
    async fn accept_loop(&mut self) -> Result<(), Error> {
        loop {
            let (socket, peer_address) = self.accept().await?;
            info!("Accepted connection from {:?}", peer_address);

            let mut handler = Handler {
                connection: Connection::new(socket, peer_address, self.config.max_frame_size),
                store: self.store.clone(),
                idle_timeout: self.config.idle_timeout,
                shutdown: Shutdown::new(self.notify_shutdown.subscribe()),
                _shutdown_complete: self.shutdown_complete_tx.clone(),
            };

            tokio::spawn(async move {
                if let Err(e) = handler.run().await {
                    error!(cause = %e, "connection error");
                }
            });
        }
    }

    /// Accepts with exponential backoff. Transient errors (e.g. fd
    /// exhaustion) must not take the listener down; only a persistent failure
    /// propagates.
    async fn accept(&mut self) -> Result<(TcpStream, SocketAddr), Error> {
        let mut backoff = 1;

        loop {
            match self.listener.accept().await {
                Ok((socket, peer_address)) => return Ok((socket, peer_address)),
                Err(e) => {
                    if backoff > 64 {
                        return Err(e.into());
                    }

                    warn!(cause = %e, "accept failed; retrying in {}s", backoff);
                    time::sleep(Duration::from_secs(backoff)).await;
                    backoff *= 2;
                }
            }
        }
    }
}

struct Handler {
    connection: Connection,
    store: Store,
    idle_timeout: Duration,
    shutdown: Shutdown,

    // Held for its Drop: the server's drain completes when every handler has
    // released its clone.
    _shutdown_complete: mpsc::Sender<()>,
}

impl Handler {
    /// Drives one connection through its read, process, write loop until EOF,
    /// an idle timeout, a connection-fatal error, or server shutdown.
    #[instrument(name = "connection", skip(self), fields(connection_id, peer_address))]
    async fn run(&mut self) -> Result<(), Error> {
        tracing::Span::current()
            .record("connection_id", self.connection.id.to_string())
            .record("peer_address", self.connection.peer_address.to_string());

        while !self.shutdown.is_shutdown() {
            let maybe_frame = tokio::select! {
                res = time::timeout(self.idle_timeout, self.connection.read_frame()) => match res {
                    // Frame-too-large and transport errors propagate: fatal to
                    // this connection, logged by the spawner, invisible to the
                    // rest of the server.
                    Ok(frame) => frame?,
                    Err(_) => {
                        info!("idle timeout elapsed; closing connection");
                        break;
                    }
                },
                _ = self.shutdown.recv() => break,
            };

            let Some(payload) = maybe_frame else {
                // Clean EOF from the peer.
                break;
            };

            debug!("received frame of {} bytes", payload.len());

            // Malformed commands are answered, not fatal: the connection stays
            // open for subsequent frames.
            let response = match Command::try_from(payload) {
                Ok(cmd) => cmd.exec(self.store.clone()),
                Err(e) => Response::Error(e.to_string()),
            };

            self.connection.write_frame(response.encode()).await?;
        }

        info!("Connection closed");
        Ok(())
    }
}
