//! Integration tests for switch connections: delivery order, outbound
//! messages, idle timeout, protocol errors, TLS and connection limits

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use std::time::Duration;

use bytes::Bytes;
use common::{isolated_metrics, loopback, self_signed, start, stop, Recorder, SwitchClient};
use openflow_protocol::protocol::message::MessageBody;
use openflow_protocol::protocol::{Message, OFP_VERSION_1_0, OFP_VERSION_1_3};
use openflow_protocol::service::{CloseReason, SwitchConnectionProvider};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

const IDLE: Duration = Duration::from_secs(30);

fn echo_request(version: u8, xid: u32, data: &'static [u8]) -> Message {
    Message::new(
        version,
        xid,
        MessageBody::EchoRequest {
            data: Bytes::from_static(data),
        },
    )
}

fn hello(version: u8, xid: u32) -> Message {
    Message::new(
        version,
        xid,
        MessageBody::Hello {
            elements: Bytes::new(),
        },
    )
}

#[tokio::test]
async fn test_messages_delivered_in_arrival_order() {
    let provider = SwitchConnectionProvider::new();
    let (recorder, mut events) = Recorder::new();
    let addr = start(&provider, loopback(IDLE), recorder).await;

    let mut client = SwitchClient::connect(addr).await;
    let id = events.connected().await;

    for xid in 0..50u32 {
        client.send(&echo_request(OFP_VERSION_1_3, xid, b"seq")).await;
    }
    for xid in 0..50u32 {
        let (from, message) = events.message().await;
        assert_eq!(from, id);
        assert_eq!(message.xid, xid);
    }

    stop(&provider).await;
}

#[tokio::test]
async fn test_echo_reply_through_connection_handle() {
    let provider = SwitchConnectionProvider::new();
    let (recorder, mut events) = Recorder::echoing();
    let addr = start(&provider, loopback(IDLE), recorder).await;

    let mut client = SwitchClient::connect(addr).await;
    events.connected().await;

    client
        .send(&echo_request(OFP_VERSION_1_0, 0xCAFE, b"ping"))
        .await;
    let reply = client.recv().await;

    assert_eq!(reply.version, OFP_VERSION_1_0);
    assert_eq!(reply.xid, 0xCAFE);
    assert_eq!(
        reply.body,
        MessageBody::EchoReply {
            data: Bytes::from_static(b"ping")
        }
    );

    stop(&provider).await;
}

#[tokio::test]
async fn test_handle_sends_are_written_in_order() {
    let provider = SwitchConnectionProvider::new();
    let (recorder, mut events) = Recorder::new();
    let addr = start(&provider, loopback(IDLE), recorder.clone()).await;

    let mut client = SwitchClient::connect(addr).await;
    let id = events.connected().await;
    let handle = recorder.handle(id);

    for xid in 1..=20u32 {
        handle
            .send(&Message::new(OFP_VERSION_1_3, xid, MessageBody::BarrierRequest))
            .await
            .unwrap();
    }
    for xid in 1..=20u32 {
        let message = client.recv().await;
        assert_eq!(message.xid, xid);
        assert_eq!(message.body, MessageBody::BarrierRequest);
    }

    stop(&provider).await;
    assert!(handle.is_closed());
}

#[tokio::test]
async fn test_send_after_close_is_connection_closed() {
    let provider = SwitchConnectionProvider::new();
    let (recorder, mut events) = Recorder::new();
    let addr = start(&provider, loopback(IDLE), recorder.clone()).await;

    let client = SwitchClient::connect(addr).await;
    let id = events.connected().await;
    let handle = recorder.handle(id);

    drop(client);
    let (_, reason) = events.closed().await;
    assert_eq!(reason, CloseReason::RemoteClosed);

    let result = handle.send(&hello(OFP_VERSION_1_3, 1)).await;
    assert!(matches!(
        result,
        Err(openflow_protocol::ProtocolError::ConnectionClosed)
    ));

    stop(&provider).await;
}

#[tokio::test]
async fn test_unencodable_message_fails_at_send() {
    let provider = SwitchConnectionProvider::new();
    let (recorder, mut events) = Recorder::new();
    let addr = start(&provider, loopback(IDLE), recorder.clone()).await;

    let _client = SwitchClient::connect(addr).await;
    let id = events.connected().await;
    let handle = recorder.handle(id);

    let vendor = Message::new(
        OFP_VERSION_1_3,
        1,
        MessageBody::Custom {
            code: 200,
            payload: Bytes::new(),
        },
    );
    assert!(matches!(
        handle.try_send(&vendor),
        Err(openflow_protocol::ProtocolError::UnsupportedMessage { .. })
    ));
    assert!(!handle.is_closed());

    stop(&provider).await;
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let provider = SwitchConnectionProvider::new();
    let (recorder, mut events) = Recorder::new();
    let addr = start(&provider, loopback(Duration::from_millis(200)), recorder).await;

    let mut client = SwitchClient::connect(addr).await;
    let id = events.connected().await;

    let (closed, reason) = events.closed().await;
    assert_eq!(closed, id);
    assert_eq!(reason, CloseReason::IdleTimeout);
    assert!(client.closed().await);

    stop(&provider).await;
}

#[tokio::test]
async fn test_traffic_keeps_connection_alive() {
    let provider = SwitchConnectionProvider::new();
    let (recorder, mut events) = Recorder::new();
    let addr = start(&provider, loopback(Duration::from_millis(300)), recorder).await;

    let mut client = SwitchClient::connect(addr).await;
    events.connected().await;

    for xid in 0..6u32 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        client.send(&hello(OFP_VERSION_1_3, xid)).await;
        let (_, message) = events.message().await;
        assert_eq!(message.xid, xid);
    }

    let (_, reason) = events.closed().await;
    assert_eq!(reason, CloseReason::IdleTimeout);

    stop(&provider).await;
}

#[tokio::test]
async fn test_unknown_type_closes_after_prior_frames() {
    let provider = SwitchConnectionProvider::new();
    let (recorder, mut events) = Recorder::new();
    let addr = start(&provider, loopback(IDLE), recorder).await;

    let mut client = SwitchClient::connect(addr).await;
    let id = events.connected().await;

    client.send(&hello(OFP_VERSION_1_3, 1)).await;
    client.send(&echo_request(OFP_VERSION_1_3, 2, b"ok")).await;
    // type 99 has no deserializer
    client.send_raw(&[0x04, 99, 0, 8, 0, 0, 0, 3]).await;
    client.send(&hello(OFP_VERSION_1_3, 4)).await;

    assert_eq!(events.message().await.1.xid, 1);
    assert_eq!(events.message().await.1.xid, 2);

    let (closed, reason) = events.closed().await;
    assert_eq!(closed, id);
    assert!(matches!(reason, CloseReason::ProtocolError(_)));
    assert!(client.closed().await);

    stop(&provider).await;
}

#[tokio::test]
async fn test_bad_length_field_is_protocol_error() {
    let metrics = isolated_metrics();
    let provider = SwitchConnectionProvider::new().with_metrics(metrics);
    let (recorder, mut events) = Recorder::new();
    let addr = start(&provider, loopback(IDLE), recorder).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    events.connected().await;

    // declared length 4 is shorter than the header
    stream.write_all(&[0x04, 0, 0, 4, 0, 0, 0, 0]).await.unwrap();

    let (_, reason) = events.closed().await;
    assert!(matches!(reason, CloseReason::ProtocolError(_)));
    assert_eq!(metrics.snapshot().protocol_errors, 1);

    stop(&provider).await;
}

#[tokio::test]
async fn test_frame_split_across_writes_is_reassembled() {
    let provider = SwitchConnectionProvider::new();
    let (recorder, mut events) = Recorder::new();
    let addr = start(&provider, loopback(IDLE), recorder).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    events.connected().await;

    let frame = [0x04, 2, 0, 12, 0, 0, 0, 9, b'a', b'b', b'c', b'd'];
    for byte in frame {
        stream.write_all(&[byte]).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let (_, message) = events.message().await;
    assert_eq!(message, echo_request(OFP_VERSION_1_3, 9, b"abcd"));

    stop(&provider).await;
}

#[tokio::test]
async fn test_tls_connection_exchanges_messages() {
    let (cert, key) = self_signed("exchange");
    let provider = SwitchConnectionProvider::new();
    let (recorder, mut events) = Recorder::echoing();
    let addr = start(&provider, loopback(IDLE).with_tls(cert, key), recorder).await;

    let mut client = SwitchClient::connect_tls(addr).await;
    events.connected().await;

    client.send(&echo_request(OFP_VERSION_1_3, 77, b"secure")).await;
    let reply = client.recv().await;
    assert_eq!(reply.xid, 77);
    assert_eq!(
        reply.body,
        MessageBody::EchoReply {
            data: Bytes::from_static(b"secure")
        }
    );

    stop(&provider).await;
}

#[tokio::test]
async fn test_plain_client_against_tls_server_fails_handshake() {
    let (cert, key) = self_signed("plain");
    let metrics = isolated_metrics();
    let provider = SwitchConnectionProvider::new().with_metrics(metrics);
    let (recorder, mut events) = Recorder::new();
    let addr = start(&provider, loopback(IDLE).with_tls(cert, key), recorder).await;

    let mut client = SwitchClient::connect(addr).await;
    client.send(&hello(OFP_VERSION_1_3, 1)).await;

    // No connection event precedes the close.
    let (_, reason) = events.closed().await;
    assert!(matches!(reason, CloseReason::HandshakeFailed(_)));
    assert_eq!(metrics.snapshot().handshakes_failed, 1);

    stop(&provider).await;
}

#[tokio::test]
async fn test_connections_beyond_limit_are_refused() {
    let metrics = isolated_metrics();
    let provider = SwitchConnectionProvider::new().with_metrics(metrics);
    let (recorder, mut events) = Recorder::new();
    let mut config = loopback(IDLE);
    config.max_connections = 1;
    let addr = start(&provider, config, recorder).await;

    let _first = SwitchClient::connect(addr).await;
    events.connected().await;

    let mut second = SwitchClient::connect(addr).await;
    assert!(second.closed().await);
    assert!(events.quiet_for(Duration::from_millis(100)).await);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.connections_refused, 1);
    assert_eq!(snapshot.connections_active, 1);

    stop(&provider).await;
    assert_eq!(metrics.snapshot().connections_active, 0);
}
