//! Chunked-Delivery Simulator Tests
//!
//! Covers the client-side double:
//! - Fragment reassembly for every buffer size
//! - Strict message ordering across fragmented deliveries
//! - Connect/close state bookkeeping, unreachable sentinel
//! - Blocking receive semantics and mid-session injection
//! - Loud failure of the legacy calling convention

use std::time::Duration;

use hearth_mock::{MockMessage, MockSocket, MockSocketFactory, UNREACHABLE_URL};
use hearth_transport::{
    ClientSocket, CloseCode, FrameKind, SocketFactory, SocketState, TransportError,
};
use tokio::time::timeout;

/// Drain one logical message, fragment by fragment.
async fn recv_logical(socket: &mut MockSocket, buf_size: usize) -> Vec<u8> {
    let mut buf = vec![0u8; buf_size];
    let mut out = Vec::new();
    loop {
        let received = socket.receive(&mut buf).await.expect("receive failed");
        assert_eq!(received.kind, FrameKind::Text);
        assert!(received.count <= buf_size, "fragment exceeds buffer");
        out.extend_from_slice(&buf[..received.count]);
        if received.end_of_message {
            return out;
        }
    }
}

// ============================================================================
// Fragmentation
// ============================================================================

#[tokio::test]
async fn every_fixture_reassembles_at_every_buffer_size() {
    for kind in MockMessage::ALL {
        let payload = kind.payload();
        // Small payloads get the full sweep; large fixtures a sparse one.
        let sizes: Vec<usize> = if payload.len() <= 64 {
            (1..payload.len() + 10).collect()
        } else {
            vec![1, 7, 64, payload.len() - 1, payload.len(), payload.len() + 10]
        };
        for buf_size in sizes {
            let mut socket = MockSocket::new([kind]);
            let out = recv_logical(&mut socket, buf_size).await;
            assert_eq!(out, payload, "{:?} at buffer size {}", kind, buf_size);
        }
    }
}

#[tokio::test]
async fn exactly_one_fragment_is_marked_final() {
    let payload = MockMessage::AuthRequired.payload();
    let mut socket = MockSocket::new([MockMessage::AuthRequired]);
    let mut buf = [0u8; 10];
    let mut finals = 0;
    let mut total = 0;
    while total < payload.len() {
        let received = socket.receive(&mut buf).await.unwrap();
        total += received.count;
        if received.end_of_message {
            finals += 1;
        }
    }
    assert_eq!(finals, 1);
    assert_eq!(total, payload.len());
}

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test]
async fn messages_drain_in_enqueue_order_without_interleaving() {
    let seed = [MockMessage::NewEvent, MockMessage::AuthOk, MockMessage::Pong];
    let mut socket = MockSocket::new(seed);
    // NewEvent is far larger than 16 bytes, so it takes many calls.
    for kind in seed {
        let out = recv_logical(&mut socket, 16).await;
        assert_eq!(out, kind.payload(), "{:?} out of order", kind);
    }
}

#[tokio::test]
async fn continuation_takes_priority_over_queued_messages() {
    let mut socket = MockSocket::new([MockMessage::AuthOk, MockMessage::Pong]);
    let mut buf = [0u8; 8];

    let first = socket.receive(&mut buf).await.unwrap();
    assert!(!first.end_of_message);
    let head = buf[..first.count].to_vec();

    // The next fragment continues AuthOk rather than starting Pong.
    let second = socket.receive(&mut buf).await.unwrap();
    let expected = &MockMessage::AuthOk.payload()[head.len()..head.len() + second.count];
    assert_eq!(&buf[..second.count], expected);
}

// ============================================================================
// Connection state
// ============================================================================

#[tokio::test]
async fn connect_to_unreachable_sentinel_aborts() {
    let mut socket = MockSocket::new([]);
    socket.connect(UNREACHABLE_URL).await.unwrap();
    assert_eq!(socket.state(), SocketState::Aborted);
}

#[tokio::test]
async fn connect_elsewhere_opens() {
    let mut socket = MockSocket::new([]);
    socket.connect("ws://localhost:8123/api/websocket").await.unwrap();
    assert_eq!(socket.state(), SocketState::Open);
}

#[tokio::test]
async fn close_output_records_normal_closure() {
    let mut socket = MockSocket::new([]);
    let probe = socket.probe();
    socket.connect("ws://localhost:8123/api/websocket").await.unwrap();
    socket
        .close_output(CloseCode::Normal, "bye")
        .await
        .unwrap();
    assert_eq!(probe.state(), SocketState::Closed);
    assert_eq!(probe.close_status(), Some(CloseCode::Normal));
    assert!(probe.close_output_run());
}

// ============================================================================
// Blocking receive and injection
// ============================================================================

#[tokio::test]
async fn receive_parks_until_a_message_is_injected() {
    let mut socket = MockSocket::new([]);
    let injector = socket.injector();

    // Nothing queued: the receive must stay parked, not return empty.
    let mut buf = [0u8; 64];
    let parked = timeout(Duration::from_millis(100), socket.receive(&mut buf)).await;
    assert!(parked.is_err(), "receive returned with an empty queue");

    // A concurrent producer wakes it.
    let producer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        injector.send(MockMessage::Pong).await.unwrap();
    });
    let out = timeout(Duration::from_secs(1), recv_logical(&mut socket, 1024))
        .await
        .expect("receive did not wake on injection");
    assert_eq!(out, MockMessage::Pong.payload());
    producer.await.unwrap();
}

// ============================================================================
// Legacy calling convention
// ============================================================================

#[tokio::test]
async fn legacy_variants_fail_loudly() {
    let mut socket = MockSocket::new([]);

    let err = socket.close(CloseCode::Normal, "bye").await.unwrap_err();
    assert!(matches!(err, TransportError::Unsupported("close")));

    let mut segment = Vec::new();
    let err = socket.receive_segment(&mut segment).await.unwrap_err();
    assert!(matches!(err, TransportError::Unsupported("receive_segment")));

    let err = socket.send_segment(Vec::new(), true).await.unwrap_err();
    assert!(matches!(err, TransportError::Unsupported("send_segment")));
}

// ============================================================================
// Factory
// ============================================================================

#[tokio::test]
async fn factory_seeds_each_socket_and_keeps_a_probe() {
    let mut factory = MockSocketFactory::new(vec![MockMessage::AuthRequired, MockMessage::AuthOk]);
    assert!(factory.probe().is_none());

    let mut socket = factory.create();
    let probe = factory.probe().expect("probe after create");
    assert_eq!(probe.state(), SocketState::Unstarted);

    socket.connect("ws://localhost:8123/api/websocket").await.unwrap();
    assert_eq!(probe.state(), SocketState::Open);

    let mut buf = vec![0u8; 1024];
    let received = socket.receive(&mut buf).await.unwrap();
    assert!(received.end_of_message);
    assert_eq!(&buf[..received.count], MockMessage::AuthRequired.payload());

    // Mid-session injection through the factory's handle.
    factory
        .injector()
        .expect("injector after create")
        .send(MockMessage::Pong)
        .await
        .unwrap();
}
