//! # Switch Server
//!
//! Accept loop for one listening endpoint, run on its own task.
//!
//! ## Lifecycle
//! - `spawn` starts binding immediately; the online signal resolves with the
//!   bound address, or with the bind error
//! - every accepted socket gets its own task (see [`super::connection`])
//! - `shutdown` stops accepting, cancels every connection, waits for them up
//!   to the shutdown timeout (aborting stragglers), releases the listener and
//!   only then resolves the shutdown signal
//!
//! The listener is owned by the accept task alone, so it is released exactly
//! once no matter how often shutdown is requested.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ConnectionConfig;
use crate::error::{constants, ProtocolError, Result};
use crate::service::connection::{handle_switch, ConnectionContext};
use crate::service::handler::ConnectionId;
use crate::service::signal::{signal, Signal, SignalSender};
use crate::utils::metrics::Timer;

/// Pause after a failed `accept` (e.g. out of file descriptors).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Handle to a running accept loop.
#[derive(Debug)]
pub struct SwitchServer {
    cancel: CancellationToken,
    online: Signal<SocketAddr>,
    finished: Signal<()>,
}

impl SwitchServer {
    pub(crate) fn spawn(
        runtime: &Handle,
        config: &ConnectionConfig,
        context: Arc<ConnectionContext>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (online_tx, online) = signal();
        let (finished_tx, finished) = signal();

        let task = AcceptLoop {
            bind_addr: SocketAddr::new(config.address, config.port),
            max_connections: config.max_connections,
            shutdown_timeout: config.shutdown_timeout,
            context,
            cancel: cancel.clone(),
        };
        runtime.spawn(task.run(online_tx, finished_tx));

        Self {
            cancel,
            online,
            finished,
        }
    }

    /// Resolves once the listener is bound (or failed to bind).
    pub fn online(&self) -> Signal<SocketAddr> {
        self.online.clone()
    }

    /// Bound address, once online.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.online.try_get().and_then(|outcome| outcome.ok())
    }

    /// Whether startup ended in failure.
    pub fn failed(&self) -> bool {
        matches!(self.online.try_get(), Some(Err(_)))
    }

    /// Request shutdown; every call returns the same completion signal.
    pub fn shutdown(&self) -> Signal<()> {
        self.cancel.cancel();
        self.finished.clone()
    }

    /// Completion signal without requesting shutdown.
    pub fn finished(&self) -> Signal<()> {
        self.finished.clone()
    }
}

struct AcceptLoop {
    bind_addr: SocketAddr,
    max_connections: usize,
    shutdown_timeout: Duration,
    context: Arc<ConnectionContext>,
    cancel: CancellationToken,
}

impl AcceptLoop {
    async fn bind(&self) -> Result<(TcpListener, SocketAddr)> {
        let listener = tokio::select! {
            _ = self.cancel.cancelled() => {
                return Err(ProtocolError::Custom(constants::ERR_STARTUP_CANCELLED.to_string()));
            }
            result = TcpListener::bind(self.bind_addr) => result?,
        };
        let local = listener.local_addr()?;
        Ok((listener, local))
    }

    #[instrument(name = "switch_server", skip_all, fields(bind = %self.bind_addr))]
    async fn run(self, online: SignalSender<SocketAddr>, finished: SignalSender<()>) {
        let listener = match self.bind().await {
            Ok((listener, local)) => {
                info!(address = %local, "Switch server listening");
                online.succeed(local);
                listener
            }
            Err(e) => {
                error!(error = %e, "Switch server failed to start");
                online.fail(e);
                finished.succeed(());
                return;
            }
        };

        let mut connections = JoinSet::new();
        let mut next_id = 0u64;

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,

                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            error!(error = %e, "Switch connection task panicked");
                        }
                    }
                }

                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        if connections.len() >= self.max_connections {
                            self.context.metrics.connection_refused();
                            debug!(%peer, limit = self.max_connections, "Refusing switch: connection limit reached");
                            drop(stream);
                            continue;
                        }
                        next_id += 1;
                        connections.spawn(handle_switch(
                            stream,
                            ConnectionId(next_id),
                            peer,
                            Arc::clone(&self.context),
                            self.cancel.child_token(),
                        ));
                    }
                    Err(e) => {
                        warn!(error = %e, "Accept failed");
                        sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }

        let _timer = Timer::start("switch_server_shutdown");
        drop(listener);
        info!(open = connections.len(), "Switch server stopped accepting");

        let drain = async { while connections.join_next().await.is_some() {} };
        if timeout(self.shutdown_timeout, drain).await.is_err() {
            warn!(
                remaining = connections.len(),
                "Shutdown timeout elapsed, aborting switch connections"
            );
            connections.abort_all();
            while connections.join_next().await.is_some() {}
        }

        self.context.metrics.log_metrics();
        info!("Switch server shut down");
        finished.succeed(());
    }
}
