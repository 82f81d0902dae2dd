//! Production WebSocket implementation of [`ClientSocket`]

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::protocol::{
        frame::{coding::CloseCode as WsCloseCode, CloseFrame},
        Message as WsMessage,
    },
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info};

use crate::cursor::FragmentCursor;
use crate::error::{Result, TransportError};
use crate::traits::{ClientSocket, CloseCode, FrameKind, Received, SocketFactory, SocketState};

use async_trait::async_trait;

/// Receive buffer size the Hearth client configures against a real peer.
/// The transport itself handles any caller-chosen size.
pub const RECEIVE_BUFFER_SIZE: usize = 4096;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// What one read of the underlying stream produced.
enum NextFrame {
    Data(Bytes),
    Close(Received),
}

/// [`ClientSocket`] over tokio-tungstenite.
///
/// Tungstenite yields whole messages; arriving payloads are parked and doled
/// out through a [`FragmentCursor`] so `receive` honours arbitrary caller
/// buffer sizes, exactly as the raw socket API would.
pub struct WebSocketClient {
    stream: Option<WsStream>,
    state: SocketState,
    close_status: Option<CloseCode>,
    pending: Option<Bytes>,
    cursor: FragmentCursor,
    send_buf: Vec<u8>,
}

impl WebSocketClient {
    pub fn new() -> Self {
        Self {
            stream: None,
            state: SocketState::Unstarted,
            close_status: None,
            pending: None,
            cursor: FragmentCursor::new(),
            send_buf: Vec::new(),
        }
    }

    fn stream_mut(&mut self) -> Result<&mut WsStream> {
        self.stream.as_mut().ok_or(TransportError::NotConnected)
    }

    /// Read the next data payload, or the peer's close.
    async fn next_frame(&mut self) -> Result<NextFrame> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        loop {
            match stream.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    return Ok(NextFrame::Data(Bytes::from(text.into_bytes())));
                }
                Some(Ok(WsMessage::Binary(data))) => {
                    return Ok(NextFrame::Data(Bytes::from(data)));
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    let code = frame
                        .map(|f| CloseCode::from(u16::from(f.code)))
                        .unwrap_or(CloseCode::Normal);
                    debug!(?code, "peer initiated close");
                    self.close_status = Some(code);
                    self.state = SocketState::Closed;
                    return Ok(NextFrame::Close(Received {
                        count: 0,
                        end_of_message: true,
                        kind: FrameKind::Close,
                    }));
                }
                // Tungstenite answers pings internally on the next flush.
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => continue,
                Some(Err(e)) => {
                    self.state = SocketState::Aborted;
                    return Err(e.into());
                }
                None => {
                    self.state = SocketState::Aborted;
                    return Err(TransportError::ConnectionClosed);
                }
            }
        }
    }
}

impl Default for WebSocketClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientSocket for WebSocketClient {
    fn state(&self) -> SocketState {
        self.state
    }

    fn close_status(&self) -> Option<CloseCode> {
        self.close_status
    }

    async fn connect(&mut self, url: &str) -> Result<()> {
        info!(url, "connecting");
        match connect_async(url).await {
            Ok((stream, response)) => {
                debug!(status = ?response.status(), "websocket connected");
                self.stream = Some(stream);
                self.state = SocketState::Open;
                Ok(())
            }
            Err(e) => {
                self.state = SocketState::Aborted;
                Err(TransportError::ConnectionFailed(e.to_string()))
            }
        }
    }

    async fn send(&mut self, data: &[u8], end_of_message: bool) -> Result<()> {
        self.send_buf.extend_from_slice(data);
        if !end_of_message {
            return Ok(());
        }
        let payload = std::mem::take(&mut self.send_buf);
        let text = String::from_utf8(payload)
            .map_err(|e| TransportError::SendFailed(format!("payload not utf-8: {}", e)))?;
        self.stream_mut()?
            .send(WsMessage::Text(text))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn receive(&mut self, buf: &mut [u8]) -> Result<Received> {
        let payload = match self.pending.take() {
            Some(payload) => payload,
            None => match self.next_frame().await? {
                NextFrame::Data(payload) => payload,
                NextFrame::Close(close) => return Ok(close),
            },
        };
        let (count, end_of_message) = self.cursor.drain_into(&payload, buf);
        if !end_of_message {
            self.pending = Some(payload);
        }
        Ok(Received {
            count,
            end_of_message,
            kind: FrameKind::Text,
        })
    }

    async fn close_output(&mut self, code: CloseCode, reason: &str) -> Result<()> {
        let frame = CloseFrame {
            code: WsCloseCode::from(code.as_u16()),
            reason: reason.to_string().into(),
        };
        self.stream_mut()?
            .send(WsMessage::Close(Some(frame)))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        self.close_status = Some(code);
        self.state = SocketState::Closed;
        Ok(())
    }

    async fn close(&mut self, code: CloseCode, reason: &str) -> Result<()> {
        let frame = CloseFrame {
            code: WsCloseCode::from(code.as_u16()),
            reason: reason.to_string().into(),
        };
        let stream = self.stream_mut()?;
        stream.close(Some(frame)).await?;
        // Drain until the peer's close comes back so the handshake finishes.
        while let Some(msg) = stream.next().await {
            if matches!(msg, Ok(WsMessage::Close(_)) | Err(_)) {
                break;
            }
        }
        self.close_status = Some(code);
        self.state = SocketState::Closed;
        Ok(())
    }
}

/// Factory handing out fresh production sockets.
pub struct WebSocketFactory;

impl SocketFactory for WebSocketFactory {
    fn create(&mut self) -> Box<dyn ClientSocket> {
        Box::new(WebSocketClient::new())
    }
}
