use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::error::{Error, Result};

/// Numeric HTTP status code.
///
/// Any code in `100..=999` is representable; [`StatusCode::reason_phrase`]
/// only knows the registered ones and the status line falls back to
/// `UNKNOWN` for the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const SWITCHING_PROTOCOLS: StatusCode = StatusCode(101);
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    pub const PAYLOAD_TOO_LARGE: StatusCode = StatusCode(413);
    pub const REQUEST_HEADER_FIELDS_TOO_LARGE: StatusCode = StatusCode(431);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    /// Accepts any three-digit code.
    pub fn from_u16(code: u16) -> Option<Self> {
        (100..=999).contains(&code).then_some(StatusCode(code))
    }

    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use nocturne::http::response::StatusCode;
    /// assert_eq!(StatusCode::OK.as_u16(), 200);
    /// assert_eq!(StatusCode::NOT_FOUND.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns the standard reason phrase, if the code is registered.
    ///
    /// # Example
    ///
    /// ```
    /// # use nocturne::http::response::StatusCode;
    /// assert_eq!(StatusCode::OK.reason_phrase(), Some("OK"));
    /// assert_eq!(StatusCode::from_u16(299).unwrap().reason_phrase(), None);
    /// ```
    pub fn reason_phrase(&self) -> Option<&'static str> {
        let phrase = match self.0 {
            100 => "Continue",
            101 => "Switching Protocols",
            102 => "Processing",
            103 => "Early Hints",
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            203 => "Non-Authoritative Information",
            204 => "No Content",
            205 => "Reset Content",
            206 => "Partial Content",
            207 => "Multi-Status",
            208 => "Already Reported",
            226 => "IM Used",
            300 => "Multiple Choices",
            301 => "Moved Permanently",
            302 => "Found",
            303 => "See Other",
            304 => "Not Modified",
            305 => "Use Proxy",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            402 => "Payment Required",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            406 => "Not Acceptable",
            407 => "Proxy Authentication Required",
            408 => "Request Timeout",
            409 => "Conflict",
            410 => "Gone",
            411 => "Length Required",
            412 => "Precondition Failed",
            413 => "Payload Too Large",
            414 => "URI Too Long",
            415 => "Unsupported Media Type",
            416 => "Range Not Satisfiable",
            417 => "Expectation Failed",
            418 => "I'm a Teapot",
            421 => "Misdirected Request",
            422 => "Unprocessable Entity",
            423 => "Locked",
            424 => "Failed Dependency",
            425 => "Too Early",
            426 => "Upgrade Required",
            428 => "Precondition Required",
            429 => "Too Many Requests",
            431 => "Request Header Fields Too Large",
            451 => "Unavailable For Legal Reasons",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            505 => "HTTP Version Not Supported",
            506 => "Variant Also Negotiates",
            507 => "Insufficient Storage",
            508 => "Loop Detected",
            510 => "Not Extended",
            511 => "Network Authentication Required",
            _ => return None,
        };
        Some(phrase)
    }

    /// Reason phrase as written on the status line.
    pub fn status_line_reason(&self) -> &'static str {
        self.reason_phrase().unwrap_or("UNKNOWN")
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.status_line_reason())
    }
}

/// Response payload before it is put on the wire.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    #[default]
    Empty,
    Text(String),
    Bytes(Vec<u8>),
    /// Mappings and sequences, encoded as JSON.
    Json(Value),
    Int(i64),
    Float(f64),
}

impl Body {
    fn default_content_type(&self) -> &'static str {
        match self {
            Body::Json(_) => "application/json",
            Body::Text(_) | Body::Int(_) | Body::Float(_) => "text/plain",
            Body::Bytes(_) | Body::Empty => "application/octet-stream",
        }
    }

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(match self {
            Body::Empty => Vec::new(),
            Body::Text(text) => text.as_bytes().to_vec(),
            Body::Bytes(bytes) => bytes.clone(),
            Body::Json(value) => serde_json::to_vec(value)?,
            Body::Int(n) => n.to_string().into_bytes(),
            Body::Float(n) => n.to_string().into_bytes(),
        })
    }

    /// Encoded bytes, if the body has already been encoded.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Body::Bytes(bytes) => Some(bytes),
            Body::Empty => Some(&[]),
            _ => None,
        }
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl From<i64> for Body {
    fn from(n: i64) -> Self {
        Body::Int(n)
    }
}

impl From<f64> for Body {
    fn from(n: f64) -> Self {
        Body::Float(n)
    }
}

impl From<()> for Body {
    fn from(_: ()) -> Self {
        Body::Empty
    }
}

/// An HTTP response as produced by handlers and middleware.
///
/// Header names keep the case they were inserted with, and lookups are
/// case-sensitive.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// HTTP headers as key-value pairs
    pub headers: HashMap<String, String>,
    /// Response body
    pub body: Body,
    /// Content-Type to use when no explicit header is set
    pub content_type: Option<String>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::OK)
///     .header("Cache-Control", "no-cache")
///     .body(serde_json::json!({"ok": true}))
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HashMap<String, String>,
    body: Body,
    content_type: Option<String>,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Body::Empty,
            content_type: None,
        }
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Overrides the Content-Type derived from the body kind.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Builds the final Response.
    ///
    /// Content-Length is left to the writer, since middleware may still
    /// replace the body.
    pub fn build(self) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
            content_type: self.content_type,
        }
    }
}

impl Response {
    /// Creates a response with the given body and status 200.
    pub fn new(body: impl Into<Body>) -> Self {
        ResponseBuilder::new(StatusCode::OK).body(body).build()
    }

    /// Creates a simple 200 OK response with the given body.
    pub fn ok(body: impl Into<Body>) -> Self {
        Self::new(body)
    }

    /// Creates a plain-text response whose body is the status reason phrase.
    pub fn status_text(status: StatusCode) -> Self {
        ResponseBuilder::new(status)
            .header("Content-Type", "text/plain")
            .body(status.status_line_reason())
            .build()
    }

    /// Creates a 400 Bad Request response.
    pub fn bad_request() -> Self {
        Self::status_text(StatusCode::BAD_REQUEST)
    }

    /// Creates a 404 Not Found response.
    pub fn not_found() -> Self {
        Self::status_text(StatusCode::NOT_FOUND)
    }

    /// Creates a 500 Internal Server Error response.
    pub fn internal_error() -> Self {
        Self::status_text(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// Encodes the body to bytes and settles the Content-Type header.
    ///
    /// An explicit `Content-Type` header wins over [`Response::content_type`],
    /// which wins over the default for the body kind. After the first call
    /// the body is `Body::Bytes` and the header is set, so calling again
    /// changes nothing.
    pub fn prepare(&mut self) -> Result<()> {
        if !self.headers.contains_key("Content-Type") {
            let content_type = match &self.content_type {
                Some(content_type) => content_type.clone(),
                None => self.body.default_content_type().to_string(),
            };
            self.headers.insert("Content-Type".to_string(), content_type);
        }
        if !matches!(self.body, Body::Bytes(_)) {
            self.body = Body::Bytes(self.body.encode()?);
        }
        Ok(())
    }
}

/// What a handler may hand back before coercion.
#[derive(Debug)]
pub enum Reply {
    Response(Response),
    /// A body together with a numeric status.
    WithStatus(Body, u16),
    /// A bare body, answered with 200.
    Body(Body),
}

impl Reply {
    /// Coerces into a prepared [`Response`], defaulting bare bodies to
    /// `default_status`.
    pub fn into_response_with(self, default_status: StatusCode) -> Result<Response> {
        let mut response = match self {
            Reply::Response(response) => response,
            Reply::WithStatus(body, code) => {
                let status = StatusCode::from_u16(code).ok_or_else(|| {
                    Error::UnsupportedResponse(format!("status code {code} is out of range"))
                })?;
                ResponseBuilder::new(status).body(body).build()
            }
            Reply::Body(body) => ResponseBuilder::new(default_status).body(body).build(),
        };
        response.prepare()?;
        Ok(response)
    }

    pub fn into_response(self) -> Result<Response> {
        self.into_response_with(StatusCode::OK)
    }
}

/// Conversion from handler return values into a [`Reply`].
pub trait IntoReply {
    fn into_reply(self) -> anyhow::Result<Reply>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(self)
    }
}

impl IntoReply for Response {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::Response(self))
    }
}

impl<B: Into<Body>> IntoReply for (B, u16) {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::WithStatus(self.0.into(), self.1))
    }
}

impl<T, E> IntoReply for std::result::Result<T, E>
where
    T: IntoReply,
    E: Into<anyhow::Error>,
{
    fn into_reply(self) -> anyhow::Result<Reply> {
        self.map_err(Into::into)?.into_reply()
    }
}

macro_rules! body_reply {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoReply for $ty {
                fn into_reply(self) -> anyhow::Result<Reply> {
                    Ok(Reply::Body(self.into()))
                }
            }
        )*
    };
}

body_reply!(Body, String, &'static str, Vec<u8>, Value, i64, f64, ());
