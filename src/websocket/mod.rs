//! WebSocket sessions over an upgraded connection.
//!
//! ```text
//! HandshakePending ──accept()──▶ Open ──close() / peer close / error──▶ Closed
//! ```
//!
//! Only single-frame messages are supported. Inbound frames are unmasked
//! per RFC 6455; outbound frames are never masked and top out at 65535
//! payload bytes.

pub mod frame;
pub mod handshake;

use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info};

use crate::server::BoxedStream;
pub use frame::{Frame, OpCode};

#[derive(Debug, thiserror::Error)]
pub enum WsError {
    #[error("connection closed")]
    Closed,

    #[error("session is not open")]
    NotOpen,

    #[error("message of {0} bytes is too long")]
    MessageTooLong(usize),

    #[error("unknown opcode {0:#x}")]
    InvalidOpcode(u8),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsState {
    HandshakePending,
    Open,
    Closed,
}

/// One upgraded connection.
pub struct WebSocket {
    path: String,
    headers: HashMap<String, String>,
    version: String,
    key: String,
    peer: SocketAddr,
    stream: BoxedStream,
    buffer: BytesMut,
    state: WsState,
    max_message_bytes: usize,
}

impl WebSocket {
    /// Wraps an upgraded stream. `buffered` holds bytes read past the
    /// request head.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stream: BoxedStream,
        buffered: BytesMut,
        path: String,
        headers: HashMap<String, String>,
        version: String,
        key: String,
        peer: SocketAddr,
        max_message_bytes: usize,
    ) -> Self {
        Self {
            path,
            headers,
            version,
            key,
            peer,
            stream,
            buffer: buffered,
            state: WsState::HandshakePending,
            max_message_bytes,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// HTTP version of the upgrade request.
    pub fn protocol_version(&self) -> &str {
        &self.version
    }

    pub fn connection_key(&self) -> &str {
        &self.key
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn state(&self) -> WsState {
        self.state
    }

    /// Completes the opening handshake with `101 Switching Protocols`.
    pub async fn accept(&mut self) -> Result<(), WsError> {
        if self.state != WsState::HandshakePending {
            return Err(WsError::NotOpen);
        }
        let version = self
            .headers
            .get("Sec-WebSocket-Version")
            .map(String::as_str)
            .unwrap_or(handshake::DEFAULT_VERSION);
        let response = handshake::switching_protocols(&self.key, version);
        self.stream.write_all(&response).await?;
        self.stream.flush().await?;
        self.state = WsState::Open;

        info!(
            client = %self.peer,
            method = "GET",
            path = %self.path,
            status = 101,
            "websocket accepted"
        );
        Ok(())
    }

    /// Reads the next data frame, answering pings on the way.
    pub async fn recv_frame(&mut self) -> Result<Frame, WsError> {
        self.ensure_open()?;
        loop {
            match frame::decode_frame(&mut self.buffer, self.max_message_bytes) {
                Ok(Some(frame)) => match frame.opcode {
                    OpCode::Close => {
                        self.state = WsState::Closed;
                        return Err(WsError::Closed);
                    }
                    OpCode::Ping => {
                        let pong = frame::encode_frame(OpCode::Pong, &frame.payload)?;
                        self.stream.write_all(&pong).await?;
                    }
                    OpCode::Pong => {}
                    _ => return Ok(frame),
                },
                Ok(None) => {}
                Err(err) => {
                    self.state = WsState::Closed;
                    return Err(err);
                }
            }

            let n = self.stream.read_buf(&mut self.buffer).await?;
            if n == 0 {
                self.state = WsState::Closed;
                return Err(WsError::Closed);
            }
        }
    }

    /// Receives a text message.
    ///
    /// A frame that is not valid UTF-8 yields `Ok(None)` and leaves the
    /// session open.
    pub async fn recv(&mut self) -> Result<Option<String>, WsError> {
        let frame = self.recv_frame().await?;
        match String::from_utf8(frame.payload) {
            Ok(text) => Ok(Some(text)),
            Err(_) => {
                debug!(client = %self.peer, "skipped websocket frame with invalid utf-8");
                Ok(None)
            }
        }
    }

    /// Sends `message` as a single text frame.
    pub async fn send(&mut self, message: &str) -> Result<(), WsError> {
        self.send_frame(OpCode::Text, message.as_bytes()).await
    }

    pub async fn send_binary(&mut self, data: &[u8]) -> Result<(), WsError> {
        self.send_frame(OpCode::Binary, data).await
    }

    async fn send_frame(&mut self, opcode: OpCode, payload: &[u8]) -> Result<(), WsError> {
        self.ensure_open()?;
        let frame = frame::encode_frame(opcode, payload)?;
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Shuts the stream down. No close frame is exchanged.
    pub async fn close(&mut self) -> Result<(), WsError> {
        if self.state == WsState::Closed {
            return Ok(());
        }
        self.state = WsState::Closed;
        self.stream.shutdown().await?;
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), WsError> {
        match self.state {
            WsState::Open => Ok(()),
            WsState::HandshakePending => Err(WsError::NotOpen),
            WsState::Closed => Err(WsError::Closed),
        }
    }
}
