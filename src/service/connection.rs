//! # Switch Connection Task
//!
//! One task per accepted socket:
//! 1. optional TLS handshake, bounded by the handshake timeout
//! 2. frame the stream with [`OfFrameCodec`] and decode each frame in order
//! 3. write frames queued through [`ConnectionHandle`]s
//! 4. close on idle timeout, decode failure, remote close or shutdown
//!
//! The idle timer is driven by [`ActivityTracked`], which sits below the
//! framer and records the time of the last successful read, so a switch that
//! trickles a frame byte by byte is not considered idle.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, timeout, Instant};
use tokio_rustls::TlsAcceptor;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::core::codec::OfFrameCodec;
use crate::error::ProtocolError;
use crate::protocol::deserialization::DeserializationFactory;
use crate::protocol::serialization::SerializationFactory;
use crate::service::handler::{CloseReason, ConnectionHandle, ConnectionId, SwitchConnectionHandler};
use crate::utils::metrics::Metrics;

/// Bound on flushing and closing the socket once the connection is done.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Everything a connection task needs, shared by all connections of a server.
pub(crate) struct ConnectionContext {
    pub handler: Arc<dyn SwitchConnectionHandler>,
    pub serializer: SerializationFactory,
    pub deserializer: DeserializationFactory,
    pub tls: Option<TlsAcceptor>,
    pub idle_timeout: Duration,
    pub handshake_timeout: Duration,
    pub outbound_queue: usize,
    pub read_buffer_size: usize,
    pub tcp_nodelay: bool,
    pub metrics: &'static Metrics,
}

/// Stream wrapper recording when bytes were last received.
#[derive(Debug)]
pub struct ActivityTracked<S> {
    inner: S,
    last_read: Instant,
}

impl<S> ActivityTracked<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            last_read: Instant::now(),
        }
    }

    pub fn last_read(&self) -> Instant {
        self.last_read
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for ActivityTracked<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if matches!(poll, Poll::Ready(Ok(()))) && buf.filled().len() > before {
            this.last_read = Instant::now();
        }
        poll
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for ActivityTracked<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

/// Drive one accepted socket to completion.
///
/// The handler's `on_connection_closed` is called exactly once, whatever the
/// outcome.
#[instrument(skip(stream, context, cancel), fields(%id, %peer))]
pub(crate) async fn handle_switch(
    stream: TcpStream,
    id: ConnectionId,
    peer: SocketAddr,
    context: Arc<ConnectionContext>,
    cancel: CancellationToken,
) {
    context.metrics.connection_established();
    let closer = CloseNotifier {
        id,
        context: Arc::clone(&context),
        notified: false,
    };
    if let Err(e) = stream.set_nodelay(context.tcp_nodelay) {
        debug!(error = %e, "Failed to set TCP_NODELAY");
    }

    let reason = match &context.tls {
        Some(acceptor) => {
            let handshake = timeout(context.handshake_timeout, acceptor.accept(stream));
            let outcome = tokio::select! {
                _ = cancel.cancelled() => Err(CloseReason::Shutdown),
                result = handshake => match result {
                    Ok(Ok(tls)) => Ok(tls),
                    Ok(Err(e)) => Err(CloseReason::HandshakeFailed(e.to_string())),
                    Err(_) => Err(CloseReason::HandshakeFailed("handshake timed out".into())),
                },
            };
            match outcome {
                Ok(tls) => {
                    debug!("TLS handshake complete");
                    serve(tls, id, peer, &context, &cancel).await
                }
                Err(reason) => {
                    if matches!(reason, CloseReason::HandshakeFailed(_)) {
                        context.metrics.handshake_failed();
                        warn!(%reason, "Switch TLS handshake failed");
                    }
                    reason
                }
            }
        }
        None => serve(stream, id, peer, &context, &cancel).await,
    };

    closer.notify(reason);
}

/// Reports the close of one connection to the handler exactly once.
///
/// A task aborted after the shutdown timeout never reaches `notify`; the
/// drop then reports `CloseReason::Shutdown` instead.
struct CloseNotifier {
    id: ConnectionId,
    context: Arc<ConnectionContext>,
    notified: bool,
}

impl CloseNotifier {
    fn notify(mut self, reason: CloseReason) {
        self.notified = true;
        info!(%reason, "Switch connection closed");
        self.context.metrics.connection_closed();
        self.context.handler.on_connection_closed(&self.id, reason);
    }
}

impl Drop for CloseNotifier {
    fn drop(&mut self) {
        if self.notified || std::thread::panicking() {
            return;
        }
        warn!(id = %self.id, "Switch connection aborted");
        self.context.metrics.connection_closed();
        self.context
            .handler
            .on_connection_closed(&self.id, CloseReason::Shutdown);
    }
}

async fn serve<S>(
    stream: S,
    id: ConnectionId,
    peer: SocketAddr,
    context: &ConnectionContext,
    cancel: &CancellationToken,
) -> CloseReason
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::with_capacity(
        ActivityTracked::new(stream),
        OfFrameCodec,
        context.read_buffer_size,
    );
    let (tx, mut outbound) = mpsc::channel::<Bytes>(context.outbound_queue);
    // Keeps the queue open for as long as the connection lives, even when the
    // handler drops its handle.
    let handle = ConnectionHandle::new(id, peer, context.serializer.clone(), tx);

    info!("Switch connected");
    context.handler.on_switch_connected(handle.clone());

    let reason = loop {
        let deadline = framed.get_ref().last_read() + context.idle_timeout;

        tokio::select! {
            biased;

            _ = cancel.cancelled() => break CloseReason::Shutdown,

            frame = framed.next() => match frame {
                Some(Ok(frame)) => {
                    context.metrics.message_received(frame.wire_len() as u64);
                    let mut payload = frame.payload;
                    match context.deserializer.deserialize(&mut payload, frame.version) {
                        Ok(message) => context.handler.on_message(&id, message),
                        Err(e) => {
                            context.metrics.protocol_error();
                            warn!(error = %e, version = frame.version, "Dropping switch after undecodable frame");
                            break CloseReason::ProtocolError(e.to_string());
                        }
                    }
                }
                Some(Err(ProtocolError::Io(e))) => break CloseReason::TransportError(e.to_string()),
                Some(Err(e)) => {
                    context.metrics.protocol_error();
                    warn!(error = %e, "Dropping switch after framing error");
                    break CloseReason::ProtocolError(e.to_string());
                }
                None => break CloseReason::RemoteClosed,
            },

            Some(frame) = outbound.recv() => {
                let len = frame.len() as u64;
                if let Err(e) = framed.send(frame).await {
                    break CloseReason::TransportError(e.to_string());
                }
                context.metrics.message_sent(len);
            }

            _ = sleep_until(deadline) => {
                // Bytes may have arrived since the deadline was computed.
                if framed.get_ref().last_read() + context.idle_timeout <= Instant::now() {
                    context.metrics.idle_timeout();
                    break CloseReason::IdleTimeout;
                }
            }
        }
    };

    drop(handle);
    outbound.close();
    let _ = timeout(CLOSE_TIMEOUT, SinkExt::<Bytes>::close(&mut framed)).await;
    reason
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test(start_paused = true)]
    async fn test_reads_refresh_activity() {
        let (client, server) = tokio::io::duplex(64);
        let mut tracked = ActivityTracked::new(server);
        let start = tracked.last_read();

        tokio::time::advance(Duration::from_secs(5)).await;
        let mut client = client;
        client.write_all(b"x").await.unwrap();
        let mut byte = [0u8; 1];
        tracked.read_exact(&mut byte).await.unwrap();

        assert!(tracked.last_read() >= start + Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_do_not_count_as_activity() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut tracked = ActivityTracked::new(server);
        let start = tracked.last_read();

        tokio::time::advance(Duration::from_secs(5)).await;
        tracked.write_all(b"out").await.unwrap();
        let mut buf = [0u8; 3];
        client.read_exact(&mut buf).await.unwrap();

        assert_eq!(tracked.last_read(), start);
    }
}
