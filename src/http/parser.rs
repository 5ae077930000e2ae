use crate::http::request::{Method, Request};
use crate::http::response::StatusCode;
use std::collections::HashMap;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("request line needs a method, a target and a version")]
    InvalidRequest,
    #[error("unknown request method")]
    InvalidMethod,
    #[error("header line is not `Key: Value`")]
    InvalidHeader,
    #[error("Content-Length is not a number")]
    InvalidContentLength,
    #[error("request head exceeds {0} bytes")]
    HeadTooLarge(usize),
    #[error("request body exceeds {0} bytes")]
    BodyTooLarge(usize),
    #[error("request is incomplete")]
    Incomplete,
}

impl ParseError {
    /// Status used when answering a request that failed to parse.
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::HeadTooLarge(_) => StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
            ParseError::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Size ceilings applied while a request is still being buffered.
#[derive(Debug, Clone, Copy)]
pub struct ParseLimits {
    pub max_head_bytes: usize,
    pub max_body_bytes: usize,
}

impl ParseLimits {
    pub const UNBOUNDED: ParseLimits = ParseLimits {
        max_head_bytes: usize::MAX,
        max_body_bytes: usize::MAX,
    };
}

pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    parse_http_request_limited(buf, ParseLimits::UNBOUNDED)
}

/// Parses one request from the front of `buf`.
///
/// Returns the request and the number of bytes it occupied. Anything past
/// that (e.g. the first WebSocket frame) is left for the caller.
pub fn parse_http_request_limited(
    buf: &[u8],
    limits: ParseLimits,
) -> Result<(Request, usize), ParseError> {
    // Look for header/body separator
    let headers_end = match find_headers_end(buf) {
        Some(end) if end > limits.max_head_bytes => {
            return Err(ParseError::HeadTooLarge(limits.max_head_bytes));
        }
        Some(end) => end,
        None if buf.len() > limits.max_head_bytes => {
            return Err(ParseError::HeadTooLarge(limits.max_head_bytes));
        }
        None => return Err(ParseError::Incomplete),
    };
    let header_bytes = &buf[..headers_end];
    let body_bytes = &buf[headers_end + 4..];

    let headers_str =
        std::str::from_utf8(header_bytes).map_err(|_| ParseError::InvalidRequest)?;

    let mut lines = headers_str.split("\r\n");

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let mut parts = request_line.split_whitespace();

    let method_str = parts.next().ok_or(ParseError::InvalidRequest)?;
    let path = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;

    let method = Method::from_str(method_str).ok_or(ParseError::InvalidMethod)?;

    // Headers
    let mut headers = HashMap::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line.split_once(": ").ok_or(ParseError::InvalidHeader)?;

        headers.insert(key.to_string(), value.to_string());
    }

    // Body
    // Framing is read regardless of the case the client used for the name
    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("Content-Length"))
        .map(|(_, v)| {
            v.trim()
                .parse::<usize>()
                .map_err(|_| ParseError::InvalidContentLength)
        })
        .transpose()?
        .unwrap_or(0);

    if content_length > limits.max_body_bytes {
        return Err(ParseError::BodyTooLarge(limits.max_body_bytes));
    }

    if body_bytes.len() < content_length {
        return Err(ParseError::Incomplete);
    }

    let body = body_bytes[..content_length].to_vec();

    let request = Request {
        method,
        path: path.to_string(),
        version: version.to_string(),
        headers,
        body,
        secure: false,
    };

    let total_consumed = headers_end + 4 + content_length;
    Ok((request, total_consumed))
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}
