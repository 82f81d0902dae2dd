//! Hearth Test Doubles
//!
//! In-process fakes for exercising the Hearth WebSocket client without a
//! live peer:
//! - [`MockSocket`]: client-side double serving canned messages with
//!   deterministic, buffer-driven fragmentation
//! - [`MockServer`]: server-side double that plays the remote peer's
//!   protocol state machine over a real loopback WebSocket
//! - [`MockMessage`]: the catalog of canned payloads both doubles draw from
//!
//! The two doubles are independent halves of one simulated connection; they
//! compose only through the byte channel, never through shared state.

pub mod catalog;
pub mod error;
pub mod protocol;
pub mod server;
pub mod socket;

pub use catalog::MockMessage;
pub use error::{MockServerError, Result};
pub use protocol::{classify, Request, ResultResponse, ACCEPTED_ACCESS_TOKEN};
pub use server::{MockServer, DISCONNECT_ACK_TIMEOUT, WEBSOCKET_PATH};
pub use socket::{MockProbe, MockSocket, MockSocketFactory, UNREACHABLE_URL};
