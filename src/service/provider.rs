//! # Switch Connection Provider
//!
//! Public entry point of the connection service: holds the configuration,
//! the handler and the codec registries, and runs the startup/shutdown state
//! machine around a [`SwitchServer`].
//!
//! ## State rules
//! - `startup` needs a configuration, a handler and a running tokio runtime,
//!   otherwise `NotConfigured` is returned before any socket is touched
//! - `startup` while starting, online or still shutting down is `AlreadyRunning`
//! - `shutdown` before any startup is `NotStarted`
//! - `shutdown` after a failed startup returns an already successful signal
//! - repeated `shutdown` calls return the same signal
//! - a new `startup` is allowed once a shutdown has completed
//!
//! ## Extensibility
//! Serializers and deserializers registered through the provider are
//! published to running connections immediately: the factories read the
//! current registry snapshot for every message.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::Handle;
use tracing::{info, instrument, warn};

use crate::config::ConnectionConfig;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::deserialization::DeserializationFactory;
use crate::protocol::kind::{MessageCodeKey, MessageTypeKey};
use crate::protocol::registry::{
    DeserializerRegistry, MessageDeserializer, MessageSerializer, SerializerRegistry,
    SharedDeserializerRegistry, SharedSerializerRegistry,
};
use crate::protocol::serialization::SerializationFactory;
use crate::service::connection::ConnectionContext;
use crate::service::handler::SwitchConnectionHandler;
use crate::service::server::SwitchServer;
use crate::service::signal::Signal;
use crate::transport::tls::TlsServerConfig;
use crate::utils::metrics::{global_metrics, Metrics};

enum State {
    Idle,
    Running(SwitchServer),
    Stopping(Signal<()>),
}

struct Inner {
    config: Option<ConnectionConfig>,
    handler: Option<Arc<dyn SwitchConnectionHandler>>,
    state: State,
}

/// Owns the listening endpoint for switch connections.
pub struct SwitchConnectionProvider {
    inner: Mutex<Inner>,
    serializer: SerializationFactory,
    deserializer: DeserializationFactory,
    metrics: &'static Metrics,
}

impl Default for SwitchConnectionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SwitchConnectionProvider {
    /// Provider with the built-in codecs and the global metrics.
    pub fn new() -> Self {
        Self::with_registries(SerializerRegistry::builtin(), DeserializerRegistry::builtin())
    }

    /// Provider over pre-built registries.
    pub fn with_registries(
        serializers: SerializerRegistry,
        deserializers: DeserializerRegistry,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                config: None,
                handler: None,
                state: State::Idle,
            }),
            serializer: SerializationFactory::new(Arc::new(SharedSerializerRegistry::new(
                serializers,
            ))),
            deserializer: DeserializationFactory::new(Arc::new(
                SharedDeserializerRegistry::new(deserializers),
            )),
            metrics: global_metrics(),
        }
    }

    /// Report into `metrics` instead of the global instance.
    pub fn with_metrics(mut self, metrics: &'static Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &'static Metrics {
        self.metrics
    }

    /// Configuration used by the next `startup`.
    pub fn set_configuration(&self, config: ConnectionConfig) -> Result<()> {
        self.lock()?.config = Some(config);
        Ok(())
    }

    /// Handler used by the next `startup`.
    pub fn set_switch_connection_handler(
        &self,
        handler: Arc<dyn SwitchConnectionHandler>,
    ) -> Result<()> {
        self.lock()?.handler = Some(handler);
        Ok(())
    }

    /// Factory encoding through this provider's serializer registry.
    pub fn serialization_factory(&self) -> SerializationFactory {
        self.serializer.clone()
    }

    /// Factory decoding through this provider's deserializer registry.
    pub fn deserialization_factory(&self) -> DeserializationFactory {
        self.deserializer.clone()
    }

    /// Add a serializer; an existing one for `key` is `DuplicateRegistration`.
    pub fn register_serializer(
        &self,
        key: MessageTypeKey,
        serializer: Arc<dyn MessageSerializer>,
    ) -> Result<()> {
        self.serializer.registry().register(key, serializer)
    }

    /// Add or replace a serializer, returning the replaced one.
    pub fn register_serializer_override(
        &self,
        key: MessageTypeKey,
        serializer: Arc<dyn MessageSerializer>,
    ) -> Result<Option<Arc<dyn MessageSerializer>>> {
        self.serializer.registry().register_override(key, serializer)
    }

    /// Add a deserializer; an existing one for `key` is `DuplicateRegistration`.
    pub fn register_deserializer(
        &self,
        key: MessageCodeKey,
        deserializer: Arc<dyn MessageDeserializer>,
    ) -> Result<()> {
        self.deserializer.registry().register(key, deserializer)
    }

    /// Add or replace a deserializer, returning the replaced one.
    pub fn register_deserializer_override(
        &self,
        key: MessageCodeKey,
        deserializer: Arc<dyn MessageDeserializer>,
    ) -> Result<Option<Arc<dyn MessageDeserializer>>> {
        self.deserializer
            .registry()
            .register_override(key, deserializer)
    }

    /// Start listening. Must be called from within a tokio runtime.
    ///
    /// The returned signal resolves with the bound address once the listener
    /// accepts connections, or with the bind error.
    #[instrument(skip(self))]
    pub fn startup(&self) -> Result<Signal<SocketAddr>> {
        let mut inner = self.lock()?;

        match &inner.state {
            State::Running(server) if !server.failed() => return Err(ProtocolError::AlreadyRunning),
            State::Stopping(done) if !done.is_resolved() => return Err(ProtocolError::AlreadyRunning),
            _ => {}
        }

        let config = inner.config.clone().ok_or_else(|| {
            ProtocolError::NotConfigured(constants::ERR_NO_CONFIGURATION.to_string())
        })?;
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(ProtocolError::NotConfigured(format!(
                "Invalid connection configuration: {}",
                errors.join("; ")
            )));
        }
        let handler = inner
            .handler
            .clone()
            .ok_or_else(|| ProtocolError::NotConfigured(constants::ERR_NO_HANDLER.to_string()))?;
        let runtime = Handle::try_current()
            .map_err(|_| ProtocolError::NotConfigured(constants::ERR_NO_RUNTIME.to_string()))?;

        let tls = if config.tls_enabled() {
            Some(TlsServerConfig::from_settings(&config.tls)?.build_acceptor()?)
        } else {
            None
        };

        let context = Arc::new(ConnectionContext {
            handler,
            serializer: self.serializer.clone(),
            deserializer: self.deserializer.clone(),
            tls,
            idle_timeout: config.switch_idle_timeout,
            handshake_timeout: config.tls.handshake_timeout,
            outbound_queue: config.outbound_queue,
            read_buffer_size: config.read_buffer_size,
            tcp_nodelay: config.tcp_nodelay,
            metrics: self.metrics,
        });

        info!(
            address = %config.address,
            port = config.port,
            tls = config.tls_enabled(),
            idle_timeout_ms = config.switch_idle_timeout.as_millis() as u64,
            "Starting switch connection provider"
        );
        let server = SwitchServer::spawn(&runtime, &config, context);
        let online = server.online();
        inner.state = State::Running(server);
        Ok(online)
    }

    /// Stop listening and close every switch connection.
    ///
    /// The returned signal resolves once all connections are closed and the
    /// listener is released.
    #[instrument(skip(self))]
    pub fn shutdown(&self) -> Result<Signal<()>> {
        let mut inner = self.lock()?;

        let signal = match &inner.state {
            State::Idle => return Err(ProtocolError::NotStarted),
            State::Stopping(done) => return Ok(done.clone()),
            State::Running(server) if server.failed() => {
                warn!("Shutdown after failed startup");
                server.shutdown();
                Signal::resolved(Ok(()))
            }
            State::Running(server) => {
                info!("Shutting down switch connection provider");
                server.shutdown()
            }
        };
        inner.state = State::Stopping(signal.clone());
        Ok(signal)
    }

    /// Bound address while online.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.lock().ok()?.state {
            State::Running(server) => server.local_addr(),
            _ => None,
        }
    }

    pub fn is_online(&self) -> bool {
        self.local_addr().is_some()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| ProtocolError::Custom(constants::ERR_LOCK_POISONED.to_string()))
    }
}

impl Drop for SwitchConnectionProvider {
    fn drop(&mut self) {
        if let Ok(inner) = self.inner.get_mut() {
            if let State::Running(server) = &inner.state {
                server.shutdown();
            }
        }
    }
}
