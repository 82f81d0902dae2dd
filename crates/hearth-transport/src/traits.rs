//! Socket capability trait definitions

use async_trait::async_trait;

use crate::error::{Result, TransportError};

/// Connection state of a socket, real or simulated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    /// Never connected
    Unstarted,
    /// Connected and usable
    Open,
    /// Closed after a close handshake
    Closed,
    /// Connect failed or the connection was torn down abnormally
    Aborted,
}

/// Close status code carried by a close frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    /// Normal closure (1000)
    Normal,
    /// Any other code
    Other(u16),
}

impl CloseCode {
    pub fn as_u16(self) -> u16 {
        match self {
            CloseCode::Normal => 1000,
            CloseCode::Other(code) => code,
        }
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        match code {
            1000 => CloseCode::Normal,
            other => CloseCode::Other(other),
        }
    }
}

/// Kind of frame a receive call delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Application data (UTF-8 JSON in the Hearth protocol)
    Text,
    /// The peer initiated a close handshake
    Close,
}

/// Outcome of one [`ClientSocket::receive`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Received {
    /// Bytes written into the caller's buffer
    pub count: usize,
    /// Whether this fragment completed the logical message
    pub end_of_message: bool,
    /// Frame kind
    pub kind: FrameKind,
}

/// The capability any transport must expose to the protocol layer.
///
/// A logical message may arrive split across several `receive` calls, each
/// bounded by the caller's buffer. Callers MUST loop, concatenating
/// fragments, until [`Received::end_of_message`] is true.
#[async_trait]
pub trait ClientSocket: Send {
    /// Current connection state
    fn state(&self) -> SocketState;

    /// Close status recorded by a completed close handshake, if any
    fn close_status(&self) -> Option<CloseCode>;

    /// Establish the connection. Call at most once per socket.
    async fn connect(&mut self, url: &str) -> Result<()>;

    /// Send application bytes. `end_of_message` marks the final fragment.
    async fn send(&mut self, data: &[u8], end_of_message: bool) -> Result<()>;

    /// Fill at most `buf.len()` bytes of the next pending logical message.
    async fn receive(&mut self, buf: &mut [u8]) -> Result<Received>;

    /// Half-close: send a close frame without awaiting the peer's reply.
    async fn close_output(&mut self, code: CloseCode, reason: &str) -> Result<()>;

    /// Full close handshake.
    async fn close(&mut self, code: CloseCode, reason: &str) -> Result<()>;

    /// Legacy segment-based receive. Predates the buffer-slice surface and
    /// exists only so accidental use in tests fails loudly.
    async fn receive_segment(&mut self, _buf: &mut Vec<u8>) -> Result<Received> {
        Err(TransportError::Unsupported("receive_segment"))
    }

    /// Legacy segment-based send. Same story as [`Self::receive_segment`].
    async fn send_segment(&mut self, _data: Vec<u8>, _end_of_message: bool) -> Result<()> {
        Err(TransportError::Unsupported("send_segment"))
    }
}

/// Hands fresh sockets to the client so reconnects get a clean instance and
/// tests can substitute a double.
pub trait SocketFactory: Send {
    fn create(&mut self) -> Box<dyn ClientSocket>;
}
