//! Shared scenario driver for the integration tests: a recording controller,
//! switch-side clients over plain TCP and TLS, and provider set-up helpers.

#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use openflow_protocol::config::ConnectionConfig;
use openflow_protocol::core::codec::{Frame, OfFrameCodec};
use openflow_protocol::protocol::message::MessageBody;
use openflow_protocol::protocol::{DeserializationFactory, Message, SerializationFactory};
use openflow_protocol::service::{
    CloseReason, ConnectionHandle, ConnectionId, SwitchConnectionHandler,
    SwitchConnectionProvider,
};
use openflow_protocol::transport::TlsServerConfig;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::codec::Framed;

/// Upper bound on waiting for any single event in a scenario.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connected(ConnectionId),
    Message(ConnectionId, Message),
    Closed(ConnectionId, CloseReason),
}

/// Controller that records every callback and optionally answers echo
/// requests through the connection handle.
pub struct Recorder {
    events: mpsc::UnboundedSender<Event>,
    handles: Mutex<HashMap<ConnectionId, ConnectionHandle>>,
    echo: bool,
}

impl Recorder {
    pub fn new() -> (Arc<Self>, EventLog) {
        Self::build(false)
    }

    pub fn echoing() -> (Arc<Self>, EventLog) {
        Self::build(true)
    }

    fn build(echo: bool) -> (Arc<Self>, EventLog) {
        let (events, rx) = mpsc::unbounded_channel();
        let recorder = Arc::new(Self {
            events,
            handles: Mutex::new(HashMap::new()),
            echo,
        });
        (recorder, EventLog { rx })
    }

    pub fn handle(&self, id: ConnectionId) -> ConnectionHandle {
        self.handles
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .expect("no handle recorded for connection")
    }
}

impl SwitchConnectionHandler for Recorder {
    fn on_switch_connected(&self, connection: ConnectionHandle) {
        let id = connection.id();
        self.handles.lock().unwrap().insert(id, connection);
        let _ = self.events.send(Event::Connected(id));
    }

    fn on_message(&self, connection: &ConnectionId, message: Message) {
        if self.echo {
            if let MessageBody::EchoRequest { data } = &message.body {
                let reply = Message::new(
                    message.version,
                    message.xid,
                    MessageBody::EchoReply { data: data.clone() },
                );
                if let Some(handle) = self.handles.lock().unwrap().get(connection) {
                    handle.try_send(&reply).expect("echo reply queued");
                }
            }
        }
        let _ = self.events.send(Event::Message(*connection, message));
    }

    fn on_connection_closed(&self, connection: &ConnectionId, reason: CloseReason) {
        self.handles.lock().unwrap().remove(connection);
        let _ = self.events.send(Event::Closed(*connection, reason));
    }
}

/// Receiving end of a [`Recorder`].
pub struct EventLog {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventLog {
    pub async fn next(&mut self) -> Event {
        timeout(EVENT_TIMEOUT, self.rx.recv())
            .await
            .expect("timed out waiting for handler event")
            .expect("recorder dropped")
    }

    pub async fn connected(&mut self) -> ConnectionId {
        match self.next().await {
            Event::Connected(id) => id,
            other => panic!("expected a connection, got {other:?}"),
        }
    }

    pub async fn message(&mut self) -> (ConnectionId, Message) {
        match self.next().await {
            Event::Message(id, message) => (id, message),
            other => panic!("expected a message, got {other:?}"),
        }
    }

    pub async fn closed(&mut self) -> (ConnectionId, CloseReason) {
        match self.next().await {
            Event::Closed(id, reason) => (id, reason),
            other => panic!("expected a close, got {other:?}"),
        }
    }

    /// Whether no event arrives within `window`.
    pub async fn quiet_for(&mut self, window: Duration) -> bool {
        timeout(window, self.rx.recv()).await.is_err()
    }
}

pub fn loopback(idle: Duration) -> ConnectionConfig {
    ConnectionConfig::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0, idle)
}

/// Start `provider` and wait until it is online.
pub async fn start(
    provider: &SwitchConnectionProvider,
    config: ConnectionConfig,
    handler: Arc<dyn SwitchConnectionHandler>,
) -> SocketAddr {
    provider.set_configuration(config).unwrap();
    provider.set_switch_connection_handler(handler).unwrap();
    let online = provider.startup().expect("startup accepted");
    timeout(EVENT_TIMEOUT, online.wait())
        .await
        .expect("timed out waiting for online")
        .expect("provider online")
}

pub async fn stop(provider: &SwitchConnectionProvider) {
    let done = provider.shutdown().expect("shutdown accepted");
    timeout(EVENT_TIMEOUT, done.wait())
        .await
        .expect("timed out waiting for shutdown")
        .expect("shutdown completed");
}

/// Metrics owned by a single test.
pub fn isolated_metrics() -> &'static openflow_protocol::utils::metrics::Metrics {
    Box::leak(Box::default())
}

/// Self-signed certificate and key written to a fresh temp location.
pub fn self_signed(tag: &str) -> (PathBuf, PathBuf) {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "openflow-protocol-{}-{tag}-{n}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let cert = dir.join("cert.pem");
    let key = dir.join("key.pem");
    TlsServerConfig::generate_self_signed(&cert, &key).unwrap();
    (cert, key)
}

/// Switch-side end of a connection.
pub struct SwitchClient<S> {
    framed: Framed<S, OfFrameCodec>,
    serializer: SerializationFactory,
    deserializer: DeserializationFactory,
}

impl SwitchClient<TcpStream> {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect");
        Self::over(stream)
    }
}

impl SwitchClient<tokio_rustls::client::TlsStream<TcpStream>> {
    pub async fn connect_tls(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect");
        let tls = tls_connector()
            .connect(rustls::ServerName::try_from("localhost").unwrap(), stream)
            .await
            .expect("TLS handshake");
        Self::over(tls)
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> SwitchClient<S> {
    pub fn over(stream: S) -> Self {
        Self {
            framed: Framed::new(stream, OfFrameCodec),
            serializer: SerializationFactory::builtin(),
            deserializer: DeserializationFactory::builtin(),
        }
    }

    pub async fn send(&mut self, message: &Message) {
        let mut out = BytesMut::new();
        self.serializer.serialize(message, &mut out).unwrap();
        self.framed.send(out.freeze()).await.unwrap();
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.framed
            .send(Bytes::copy_from_slice(bytes))
            .await
            .unwrap();
    }

    pub async fn recv_frame(&mut self) -> Frame {
        timeout(EVENT_TIMEOUT, self.framed.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed")
            .expect("frame decodes")
    }

    pub async fn recv(&mut self) -> Message {
        let frame = self.recv_frame().await;
        let mut payload = frame.payload;
        self.deserializer
            .deserialize(&mut payload, frame.version)
            .expect("message decodes")
    }

    /// Wait for the server to close the connection.
    pub async fn closed(&mut self) -> bool {
        match timeout(EVENT_TIMEOUT, self.framed.next()).await {
            Ok(None) | Ok(Some(Err(_))) => true,
            Ok(Some(Ok(_))) | Err(_) => false,
        }
    }
}

struct AcceptAnyServerCert;

impl rustls::client::ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::Certificate,
        _intermediates: &[rustls::Certificate],
        _server_name: &rustls::ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: std::time::SystemTime,
    ) -> std::result::Result<rustls::client::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::ServerCertVerified::assertion())
    }
}

fn tls_connector() -> tokio_rustls::TlsConnector {
    let config = rustls::ClientConfig::builder()
        .with_safe_defaults()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert))
        .with_no_client_auth();
    tokio_rustls::TlsConnector::from(Arc::new(config))
}
