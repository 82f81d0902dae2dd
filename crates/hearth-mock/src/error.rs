//! Mock server error types

use thiserror::Error;
use tokio_tungstenite::tungstenite;

pub type Result<T> = std::result::Result<T, MockServerError>;

#[derive(Error, Debug)]
pub enum MockServerError {
    #[error("failed to bind mock server: {0}")]
    Bind(#[from] std::io::Error),

    #[error("websocket handshake failed: {0}")]
    Handshake(String),

    #[error("malformed request frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The session ended for any reason other than the two expected
    /// terminations (peer-initiated close, disconnect-timeout path).
    #[error("peer closed unexpectedly: {0}")]
    PeerClosedUnexpectedly(#[source] tungstenite::Error),
}
