//! Chunked-delivery simulator
//!
//! [`MockSocket`] stands in for the production WebSocket on the client side.
//! It serves a pre-programmed queue of canned messages through the normal
//! [`ClientSocket::receive`] contract: each call returns at most one caller
//! buffer's worth of bytes, so reassembly loops in the client get exercised
//! against every fragmentation the transport could produce.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use hearth_transport::{
    ClientSocket, CloseCode, FragmentCursor, FrameKind, Received, Result, SocketFactory,
    SocketState, TransportError,
};

use crate::catalog::MockMessage;

/// Reserved target: connecting here reports `Aborted` instead of `Open`.
pub const UNREACHABLE_URL: &str = "ws://noconnect:9999/";

/// Bound on the pending delivery queue.
const QUEUE_CAPACITY: usize = 10;

/// Short suspension on connect/send/close, so interleavings stay realistic
/// without real I/O latency.
const FAKE_LATENCY: Duration = Duration::from_millis(2);

#[derive(Debug)]
struct Shared {
    state: SocketState,
    close_status: Option<CloseCode>,
    close_output_run: bool,
}

/// Read-only view of a [`MockSocket`]'s connection state, usable after the
/// socket itself has been handed to the client under test.
#[derive(Clone)]
pub struct MockProbe {
    shared: Arc<Mutex<Shared>>,
}

impl MockProbe {
    pub fn state(&self) -> SocketState {
        self.shared.lock().state
    }

    pub fn close_status(&self) -> Option<CloseCode> {
        self.shared.lock().close_status
    }

    /// Whether `close_output` ran on this socket.
    pub fn close_output_run(&self) -> bool {
        self.shared.lock().close_output_run
    }
}

/// Client-side double serving canned messages with deterministic
/// fragmentation.
pub struct MockSocket {
    rx: mpsc::Receiver<MockMessage>,
    tx: mpsc::Sender<MockMessage>,
    in_flight: Option<MockMessage>,
    cursor: FragmentCursor,
    shared: Arc<Mutex<Shared>>,
}

impl MockSocket {
    /// Build a socket pre-loaded with `seed`, in order.
    ///
    /// Panics if `seed` exceeds the queue bound; that is a test-author error
    /// and should fail the test immediately.
    pub fn new(seed: impl IntoIterator<Item = MockMessage>) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        for msg in seed {
            tx.try_send(msg).expect("pending delivery queue over capacity");
        }
        Self {
            rx,
            tx,
            in_flight: None,
            cursor: FragmentCursor::new(),
            shared: Arc::new(Mutex::new(Shared {
                state: SocketState::Unstarted,
                close_status: None,
                close_output_run: false,
            })),
        }
    }

    /// Producer handle for enqueueing further messages mid-session.
    pub fn injector(&self) -> mpsc::Sender<MockMessage> {
        self.tx.clone()
    }

    /// Observable connection state, detached from the socket's lifetime.
    pub fn probe(&self) -> MockProbe {
        MockProbe {
            shared: self.shared.clone(),
        }
    }
}

#[async_trait]
impl ClientSocket for MockSocket {
    fn state(&self) -> SocketState {
        self.shared.lock().state
    }

    fn close_status(&self) -> Option<CloseCode> {
        self.shared.lock().close_status
    }

    async fn connect(&mut self, url: &str) -> Result<()> {
        let state = if url == UNREACHABLE_URL {
            SocketState::Aborted
        } else {
            SocketState::Open
        };
        self.shared.lock().state = state;
        tokio::time::sleep(FAKE_LATENCY).await;
        Ok(())
    }

    async fn send(&mut self, _data: &[u8], _end_of_message: bool) -> Result<()> {
        tokio::time::sleep(FAKE_LATENCY).await;
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8]) -> Result<Received> {
        // A partially drained message takes priority over the queue, so its
        // fragments are never interleaved with the next message's.
        let msg = match self.in_flight.take() {
            Some(msg) => msg,
            // Parks until a producer enqueues; never fabricates data.
            None => self
                .rx
                .recv()
                .await
                .ok_or(TransportError::ConnectionClosed)?,
        };
        let (count, end_of_message) = self.cursor.drain_into(msg.payload(), buf);
        if !end_of_message {
            self.in_flight = Some(msg);
        }
        Ok(Received {
            count,
            end_of_message,
            kind: FrameKind::Text,
        })
    }

    async fn close_output(&mut self, _code: CloseCode, _reason: &str) -> Result<()> {
        {
            let mut shared = self.shared.lock();
            shared.close_output_run = true;
            shared.close_status = Some(CloseCode::Normal);
            shared.state = SocketState::Closed;
        }
        tokio::time::sleep(FAKE_LATENCY).await;
        Ok(())
    }

    async fn close(&mut self, _code: CloseCode, _reason: &str) -> Result<()> {
        Err(TransportError::Unsupported("close"))
    }
}

/// Factory seeding every created socket with the same ordered message list,
/// keeping a probe and injector for the most recent one.
pub struct MockSocketFactory {
    seed: Vec<MockMessage>,
    last_probe: Option<MockProbe>,
    last_injector: Option<mpsc::Sender<MockMessage>>,
}

impl MockSocketFactory {
    pub fn new(seed: Vec<MockMessage>) -> Self {
        Self {
            seed,
            last_probe: None,
            last_injector: None,
        }
    }

    /// Probe of the most recently created socket.
    pub fn probe(&self) -> Option<MockProbe> {
        self.last_probe.clone()
    }

    /// Injector of the most recently created socket.
    pub fn injector(&self) -> Option<mpsc::Sender<MockMessage>> {
        self.last_injector.clone()
    }
}

impl SocketFactory for MockSocketFactory {
    fn create(&mut self) -> Box<dyn ClientSocket> {
        let socket = MockSocket::new(self.seed.iter().copied());
        self.last_probe = Some(socket.probe());
        self.last_injector = Some(socket.injector());
        Box::new(socket)
    }
}
