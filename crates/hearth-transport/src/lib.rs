//! Hearth Transport Layer
//!
//! This crate defines the capability contract between the Hearth protocol
//! client and whatever carries its frames:
//! - [`ClientSocket`]: the minimal full-duplex socket surface
//! - [`FragmentCursor`]: buffer-driven fragmentation of logical messages
//! - [`WebSocketClient`]: the production implementation over tokio-tungstenite
//!
//! Code above this crate is transport-agnostic: it only ever sees a
//! `Box<dyn ClientSocket>` handed out by a [`SocketFactory`], so tests can
//! substitute a double without touching the protocol layer.

pub mod cursor;
pub mod error;
pub mod traits;
pub mod websocket;

pub use cursor::FragmentCursor;
pub use error::{Result, TransportError};
pub use traits::{ClientSocket, CloseCode, FrameKind, Received, SocketFactory, SocketState};
pub use websocket::{WebSocketClient, WebSocketFactory, RECEIVE_BUFFER_SIZE};
