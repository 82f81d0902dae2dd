//! Protocol responder: an in-process fake of the remote peer
//!
//! [`MockServer`] exposes the WebSocket API and fakes responses to requests.
//! Each accepted connection gets its own responder task: push the
//! auth-required message first, then answer classified requests per the
//! protocol, including the controlled-disconnect path used to test
//! client-side disconnect detection.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        handshake::server::{ErrorResponse, Request as HsRequest, Response as HsResponse},
        protocol::{
            frame::{coding::CloseCode as WsCloseCode, CloseFrame},
            Message as WsMessage,
        },
    },
    WebSocketStream,
};
use tracing::{debug, error, info, warn};

use crate::catalog::MockMessage;
use crate::error::{MockServerError, Result};
use crate::protocol::{classify, Request, ResultResponse, ACCEPTED_ACCESS_TOKEN};

/// Path the responder serves, as the real peer does.
pub const WEBSOCKET_PATH: &str = "/api/websocket";

/// How long the responder waits for the peer's close acknowledgment during
/// the controlled-disconnect path before giving up silently.
pub const DISCONNECT_ACK_TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<TcpStream>;

/// In-process fake peer. Start with [`MockServer::start`], point the client
/// under test at [`MockServer::url`], inspect session failures through
/// [`MockServer::take_errors`].
pub struct MockServer {
    local_addr: SocketAddr,
    accept_task: JoinHandle<()>,
    sessions: Arc<Mutex<Vec<JoinHandle<()>>>>,
    errors: Arc<Mutex<Vec<MockServerError>>>,
}

impl MockServer {
    /// Bind an ephemeral port and start accepting connections.
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "mock server listening");

        let sessions: Arc<Mutex<Vec<JoinHandle<()>>>> = Arc::new(Mutex::new(Vec::new()));
        let errors: Arc<Mutex<Vec<MockServerError>>> = Arc::new(Mutex::new(Vec::new()));

        let sessions_accept = sessions.clone();
        let errors_accept = errors.clone();
        let accept_task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        debug!(%addr, "accepted connection");
                        let errors = errors_accept.clone();
                        let handle = tokio::spawn(async move {
                            if let Err(e) = serve_connection(stream).await {
                                error!(error = %e, "responder session ended unexpectedly");
                                errors.lock().push(e);
                            }
                        });
                        sessions_accept.lock().push(handle);
                    }
                    Err(e) => {
                        warn!(error = %e, "accept failed, stopping");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            local_addr,
            accept_task,
            sessions,
            errors,
        })
    }

    /// WebSocket URI clients should connect to.
    pub fn url(&self) -> String {
        format!("ws://{}{}", self.local_addr, WEBSOCKET_PATH)
    }

    /// Drain session errors recorded so far. Expected terminations never
    /// appear here.
    pub fn take_errors(&self) -> Vec<MockServerError> {
        std::mem::take(&mut *self.errors.lock())
    }

    /// Stop accepting and tear down in-flight sessions.
    pub fn stop(self) {
        self.accept_task.abort();
        for handle in self.sessions.lock().drain(..) {
            handle.abort();
        }
    }
}

fn text_frame(payload: &[u8]) -> WsMessage {
    WsMessage::Text(String::from_utf8_lossy(payload).into_owned())
}

async fn send_payload(ws: &mut WsStream, payload: &[u8]) -> Result<()> {
    ws.send(text_frame(payload))
        .await
        .map_err(MockServerError::PeerClosedUnexpectedly)
}

/// Run the responder state machine for one connection.
async fn serve_connection(stream: TcpStream) -> Result<()> {
    let mut ws = accept_hdr_async(stream, check_path)
        .await
        .map_err(|e| MockServerError::Handshake(e.to_string()))?;

    // The peer pushes auth-required before reading anything.
    send_payload(&mut ws, MockMessage::AuthRequired.payload()).await?;

    while let Some(frame) = ws.next().await {
        let raw = match frame {
            Ok(WsMessage::Text(text)) => text.into_bytes(),
            Ok(WsMessage::Binary(data)) => data,
            Ok(WsMessage::Close(frame)) => {
                debug!(?frame, "peer initiated close");
                // Acknowledge with a matching close frame and finish.
                let _ = ws.close(frame).await;
                return Ok(());
            }
            Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_)) => continue,
            Err(e) => return Err(MockServerError::PeerClosedUnexpectedly(e)),
        };

        match classify(&raw)? {
            Request::Auth { access_token } => {
                if access_token == ACCEPTED_ACCESS_TOKEN {
                    send_payload(&mut ws, MockMessage::AuthOk.payload()).await?;
                } else {
                    // The real peer would close here; stay open so
                    // negative-path tests can keep observing the channel.
                    debug!("rejected credential, keeping connection open");
                    send_payload(&mut ws, MockMessage::AuthFail.payload()).await?;
                }
            }
            Request::SubscribeEvents { id } => {
                let result = ResultResponse::ok(id).to_pretty_bytes()?;
                send_payload(&mut ws, &result).await?;
                // Unsolicited event follows the result, strictly in order.
                send_payload(&mut ws, MockMessage::NewEvent.payload()).await?;
            }
            Request::GetStates { id: _ } => {
                send_payload(&mut ws, MockMessage::States.payload()).await?;
            }
            Request::Ping { id: _ } => {
                send_payload(&mut ws, MockMessage::Pong.payload()).await?;
            }
            Request::FakeDisconnect => {
                // Not a real protocol message; drives a controlled
                // disconnect so the client's detection can be tested.
                let frame = CloseFrame {
                    code: WsCloseCode::Normal,
                    reason: "Closing".into(),
                };
                ws.send(WsMessage::Close(Some(frame)))
                    .await
                    .map_err(MockServerError::PeerClosedUnexpectedly)?;
                match timeout(DISCONNECT_ACK_TIMEOUT, ws.next()).await {
                    Ok(_) => debug!("close acknowledged by peer"),
                    // Expected when the peer deliberately stays silent.
                    Err(_) => debug!("no close acknowledgment within timeout"),
                }
                return Ok(());
            }
            Request::Unknown => {}
        }
    }

    Ok(())
}

fn check_path(
    req: &HsRequest,
    response: HsResponse,
) -> std::result::Result<HsResponse, ErrorResponse> {
    if req.uri().path() == WEBSOCKET_PATH {
        Ok(response)
    } else {
        debug!(path = req.uri().path(), "rejecting unknown path");
        let mut resp = ErrorResponse::new(Some("not found".to_string()));
        *resp.status_mut() = tokio_tungstenite::tungstenite::http::StatusCode::NOT_FOUND;
        Err(resp)
    }
}
