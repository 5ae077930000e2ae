use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::app::Service;
use crate::app::handler::RouteEndpoint;
use crate::error::is_transport;
use crate::http::parser::{ParseError, parse_http_request_limited};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::http::writer::ResponseWriter;
use crate::server::{AsyncStream, BoxedStream};
use crate::websocket::{WebSocket, WsError};

const READ_CHUNK: usize = 4096;

pub struct Connection {
    stream: Option<BoxedStream>,
    peer: SocketAddr,
    secure: bool,
    buffer: BytesMut,
    state: ConnectionState,
    service: Arc<Service>,
    /// Method and path of the request in flight, for the access log.
    current: Option<(String, String)>,
    /// The request was `HEAD`: responses go out without body bytes.
    head_only: bool,
    /// Response bytes may already be on the wire.
    responding: bool,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Upgrading(Request),
    Writing(ResponseWriter),
    /// The stream now belongs to a WebSocket session.
    Upgraded,
    Closed,
}

enum ReadError {
    Parse(ParseError),
    Io(std::io::Error),
}

impl Connection {
    pub fn new(stream: impl AsyncStream + 'static, peer: SocketAddr, secure: bool, service: Arc<Service>) -> Self {
        Self {
            stream: Some(Box::new(stream)),
            peer,
            secure,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            state: ConnectionState::Reading,
            service,
            current: None,
            head_only: false,
            responding: false,
        }
    }

    /// Serves one request (or one WebSocket session), then closes.
    ///
    /// Handler failures are answered with 500 while the connection is still
    /// speaking HTTP. The returned error only reports that the stream broke
    /// underneath us.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let outcome = self.drive().await;
        let result = match outcome {
            Ok(()) => Ok(()),
            Err(err) => self.recover(err).await,
        };
        if let Some(stream) = self.stream.as_mut() {
            let _ = stream.shutdown().await;
        }
        result
    }

    async fn drive(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await {
                        Ok(Some(req)) => {
                            self.current = Some((req.method.to_string(), req.path.clone()));
                            self.head_only = req.method == Method::HEAD;
                            if req.is_websocket_upgrade() {
                                ConnectionState::Upgrading(req)
                            } else {
                                ConnectionState::Processing(req)
                            }
                        }
                        Ok(None) => ConnectionState::Closed,
                        Err(ReadError::Parse(e)) => {
                            warn!(client = %self.peer, error = %e, "rejecting malformed request");
                            let response = Response::status_text(e.status());
                            ConnectionState::Writing(ResponseWriter::new(response, self.service.banner())?)
                        }
                        Err(ReadError::Io(e)) => return Err(e.into()),
                    };
                }

                ConnectionState::Processing(req) => {
                    let service = self.service.clone();
                    let response = dispatch(&service, req).await?;
                    let writer = ResponseWriter::new(response, self.service.banner())?;
                    self.state = ConnectionState::Writing(writer);
                }

                ConnectionState::Upgrading(req) => {
                    self.state = match self.upgrade(req).await? {
                        Some(response) => {
                            ConnectionState::Writing(ResponseWriter::new(response, self.service.banner())?)
                        }
                        None => ConnectionState::Upgraded,
                    };
                }

                ConnectionState::Writing(mut writer) => {
                    if self.head_only {
                        writer.omit_body();
                    }
                    self.responding = true;
                    let stream = self.stream()?;
                    writer.write_to_stream(stream).await?;
                    self.log_request(writer.status());
                    // No keep-alive: one response per connection.
                    self.state = ConnectionState::Closed;
                }

                state @ (ConnectionState::Upgraded | ConnectionState::Closed) => {
                    self.state = state;
                    break;
                }
            }
        }

        Ok(())
    }

    async fn read_request(&mut self) -> Result<Option<Request>, ReadError> {
        let limits = self.service.limits().parse_limits();
        loop {
            // Try parsing whatever we already have
            match parse_http_request_limited(&self.buffer, limits) {
                Ok((mut request, consumed)) => {
                    // Whatever follows the request stays buffered for an upgrade
                    self.buffer.advance(consumed);
                    request.secure = self.secure;
                    return Ok(Some(request));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(e) => return Err(ReadError::Parse(e)),
            }

            let stream = self
                .stream
                .as_mut()
                .ok_or_else(|| ReadError::Io(std::io::ErrorKind::NotConnected.into()))?;
            let n = stream
                .read_buf(&mut self.buffer)
                .await
                .map_err(ReadError::Io)?;

            if n == 0 {
                if self.buffer.is_empty() {
                    // Client closed connection
                    return Ok(None);
                }
                return Err(ReadError::Io(std::io::ErrorKind::UnexpectedEof.into()));
            }
        }
    }

    /// Hands the stream to a WebSocket route.
    ///
    /// Returns a response to write instead when the upgrade is refused.
    async fn upgrade(&mut self, request: Request) -> anyhow::Result<Option<Response>> {
        let Some(key) = request.header("Sec-WebSocket-Key").map(str::to_string) else {
            return Ok(Some(Response::bad_request()));
        };
        let path = request.route_path().to_string();
        let Some(found) = self.service.ws_router().resolve(request.method, &path) else {
            return Ok(Some(self.service.status_response(StatusCode::NOT_FOUND, Some(request)).await));
        };
        let handler = found.handler.clone();
        let params = found.params;

        let stream = self.stream.take().ok_or(WsError::Closed)?;
        self.state = ConnectionState::Upgraded;
        let ws = WebSocket::new(
            stream,
            self.buffer.split(),
            request.path,
            request.headers,
            request.version,
            key,
            self.peer,
            self.service.limits().max_message_bytes,
        );

        match handler.call(ws, params).await {
            Ok(()) => Ok(None),
            Err(err) if matches!(err.downcast_ref::<WsError>(), Some(WsError::Closed)) => {
                debug!(client = %self.peer, "websocket closed by peer");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn recover(&mut self, err: anyhow::Error) -> anyhow::Result<()> {
        if is_transport(&err) {
            debug!(client = %self.peer, "connection dropped: {}", err);
            return Ok(());
        }

        error!(client = %self.peer, "request failed: {:?}", err);
        // A half-written response cannot be followed by another one
        if self.responding || matches!(self.state, ConnectionState::Upgraded) || self.stream.is_none() {
            return Ok(());
        }

        let response = self
            .service
            .status_response(StatusCode::INTERNAL_SERVER_ERROR, None)
            .await;
        let mut writer = ResponseWriter::new(response, self.service.banner())?;
        if self.head_only {
            writer.omit_body();
        }
        self.responding = true;
        writer.write_to_stream(self.stream()?).await?;
        self.log_request(writer.status());
        Ok(())
    }

    fn stream(&mut self) -> std::io::Result<&mut BoxedStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| std::io::ErrorKind::NotConnected.into())
    }

    fn log_request(&self, status: u16) {
        let (method, path) = match &self.current {
            Some((method, path)) => (method.as_str(), path.as_str()),
            None => ("-", "-"),
        };
        info!(client = %self.peer, method, path, status, "request completed");
    }
}

async fn dispatch(service: &Service, request: Request) -> anyhow::Result<Response> {
    let Some(found) = service.router().resolve(request.method, request.route_path()) else {
        return Ok(service.status_response(StatusCode::NOT_FOUND, Some(request)).await);
    };

    let pipeline = service.pipeline();
    if pipeline.is_empty() {
        let request = found.handler.takes_request().then_some(request);
        let reply = found.handler.call(request, found.params).await?;
        return Ok(reply.into_response()?);
    }

    let endpoint = Arc::new(RouteEndpoint {
        handler: found.handler.clone(),
        params: found.params,
    });
    pipeline.run(request, endpoint).await
}
