//! Integration tests for the provider's startup/shutdown state machine

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use std::time::Duration;

use bytes::Bytes;

use common::{loopback, start, stop, Recorder, SwitchClient};
use openflow_protocol::config::ConnectionConfig;
use openflow_protocol::error::ProtocolError;
use openflow_protocol::protocol::message::MessageBody;
use openflow_protocol::protocol::{Message, OFP_VERSION_1_3};
use openflow_protocol::service::{CloseReason, SwitchConnectionProvider};

const IDLE: Duration = Duration::from_secs(30);

#[tokio::test]
async fn test_startup_without_configuration_is_not_configured() {
    let provider = SwitchConnectionProvider::new();
    let (recorder, _events) = Recorder::new();
    provider.set_switch_connection_handler(recorder).unwrap();

    assert!(matches!(
        provider.startup(),
        Err(ProtocolError::NotConfigured(_))
    ));
    assert!(!provider.is_online());
}

#[tokio::test]
async fn test_invalid_limits_are_not_configured() {
    let overrides: [fn(&mut ConnectionConfig); 3] = [
        |c| c.outbound_queue = 0,
        |c| c.max_connections = 0,
        |c| c.switch_idle_timeout = Duration::ZERO,
    ];

    for apply in overrides {
        let provider = SwitchConnectionProvider::new();
        let (recorder, _events) = Recorder::new();
        let mut config = loopback(IDLE);
        apply(&mut config);
        provider.set_configuration(config).unwrap();
        provider.set_switch_connection_handler(recorder).unwrap();

        assert!(matches!(
            provider.startup(),
            Err(ProtocolError::NotConfigured(_))
        ));
        assert!(!provider.is_online());
        assert!(matches!(provider.shutdown(), Err(ProtocolError::NotStarted)));
    }
}

#[tokio::test]
async fn test_second_startup_is_already_running() {
    let provider = SwitchConnectionProvider::new();
    let (recorder, _events) = Recorder::new();
    provider.set_configuration(loopback(IDLE)).unwrap();
    provider.set_switch_connection_handler(recorder).unwrap();

    let online = provider.startup().unwrap();
    // Rejected whether or not the first startup has completed yet.
    assert!(matches!(provider.startup(), Err(ProtocolError::AlreadyRunning)));

    online.wait().await.unwrap();
    assert!(matches!(provider.startup(), Err(ProtocolError::AlreadyRunning)));

    stop(&provider).await;
}

#[tokio::test]
async fn test_online_signal_reports_bound_address() {
    let provider = SwitchConnectionProvider::new();
    let (recorder, _events) = Recorder::new();
    let addr = start(&provider, loopback(IDLE), recorder).await;

    assert!(addr.ip().is_loopback());
    assert_ne!(addr.port(), 0);
    assert_eq!(provider.local_addr(), Some(addr));
    assert!(provider.is_online());

    stop(&provider).await;
    assert!(!provider.is_online());
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let provider = SwitchConnectionProvider::new();
    let (recorder, _events) = Recorder::new();
    start(&provider, loopback(IDLE), recorder).await;

    let first = provider.shutdown().unwrap();
    let second = provider.shutdown().unwrap();
    assert!(first.wait().await.is_ok());
    assert!(second.is_resolved());

    let third = provider.shutdown().unwrap();
    assert!(third.is_resolved());
    assert!(third.wait().await.is_ok());
}

#[tokio::test]
async fn test_restart_after_shutdown_reuses_port() {
    let provider = SwitchConnectionProvider::new();
    let (recorder, mut events) = Recorder::new();
    let addr = start(&provider, loopback(IDLE), recorder.clone()).await;
    stop(&provider).await;

    let again = ConnectionConfig::new(addr.ip(), addr.port(), IDLE);
    let rebound = start(&provider, again, recorder).await;
    assert_eq!(rebound, addr);

    let _client = SwitchClient::connect(rebound).await;
    events.connected().await;

    stop(&provider).await;
}

#[tokio::test]
async fn test_shutdown_closes_open_connections() {
    let provider = SwitchConnectionProvider::new();
    let (recorder, mut events) = Recorder::new();
    let addr = start(&provider, loopback(IDLE), recorder).await;

    let mut client = SwitchClient::connect(addr).await;
    let id = events.connected().await;

    stop(&provider).await;

    // Every close callback has run by the time the shutdown signal resolves.
    let (closed, reason) = events.closed().await;
    assert_eq!(closed, id);
    assert_eq!(reason, CloseReason::Shutdown);
    assert!(client.closed().await);
}

#[tokio::test]
async fn test_stalled_connection_is_reported_after_abort() {
    let provider = SwitchConnectionProvider::new();
    let (recorder, mut events) = Recorder::new();
    let mut config = loopback(IDLE);
    config.shutdown_timeout = Duration::from_millis(100);
    let addr = start(&provider, config, recorder.clone()).await;

    // The switch never reads, so the socket fills and the connection task
    // cannot finish writing before the shutdown timeout.
    let _client = SwitchClient::connect(addr).await;
    let id = events.connected().await;
    let handle = recorder.handle(id);
    let flood = tokio::spawn(async move {
        let echo = Message::new(
            OFP_VERSION_1_3,
            1,
            MessageBody::EchoRequest {
                data: Bytes::from(vec![0x5A; 60_000]),
            },
        );
        while handle.send(&echo).await.is_ok() {}
    });
    tokio::time::sleep(Duration::from_millis(300)).await;

    stop(&provider).await;

    let (closed, reason) = events.closed().await;
    assert_eq!(closed, id);
    assert_eq!(reason, CloseReason::Shutdown);
    assert!(events.quiet_for(Duration::from_millis(200)).await);
    flood.await.unwrap();
}

#[tokio::test]
async fn test_dropping_provider_stops_server() {
    let provider = SwitchConnectionProvider::new();
    let (recorder, mut events) = Recorder::new();
    let addr = start(&provider, loopback(IDLE), recorder).await;

    let mut client = SwitchClient::connect(addr).await;
    events.connected().await;

    drop(provider);

    let (_, reason) = events.closed().await;
    assert_eq!(reason, CloseReason::Shutdown);
    assert!(client.closed().await);
}
