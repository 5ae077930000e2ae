//! Library error types.
//!
//! Wire and configuration failures are typed so the connection handler can
//! decide between a status response, a silent drop, or a fatal startup error.
//! Handler and middleware code works in `anyhow::Result` and lands here only
//! through [`Error::UnsupportedResponse`] when a reply cannot be coerced.

use std::io;

use tokio_rustls::rustls;

pub use crate::http::parser::ParseError;
pub use crate::router::RouteError;
pub use crate::websocket::WsError;

/// Umbrella error for the server core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed request: {0}")]
    Parse(#[from] ParseError),

    #[error("invalid route: {0}")]
    Route(#[from] RouteError),

    #[error("websocket: {0}")]
    WebSocket(#[from] WsError),

    #[error("unsupported response: {0}")]
    UnsupportedResponse(String),

    #[error("body encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("tls setup failed: {0}")]
    Tls(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns true for failures caused by the peer going away mid-exchange,
/// including a TLS session that broke underneath the HTTP exchange.
///
/// These are logged quietly and never answered, since there is nobody left
/// to read the answer.
pub fn is_transport(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return is_transport_io(io_err);
        }
        if let Some(Error::Io(io_err)) = cause.downcast_ref::<Error>() {
            return is_transport_io(io_err);
        }
        if cause.downcast_ref::<rustls::Error>().is_some() {
            return true;
        }
        matches!(
            cause.downcast_ref::<WsError>(),
            Some(WsError::Closed) | Some(WsError::Io(_))
        )
    })
}

fn is_transport_io(err: &io::Error) -> bool {
    // tokio-rustls reports alerts, bad records and close_notify races as
    // InvalidData with the rustls error inside
    if err.get_ref().is_some_and(|inner| inner.is::<rustls::Error>()) {
        return true;
    }
    matches!(
        err.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::InvalidData
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls_failures_are_transport() {
        let wrapped = io::Error::new(io::ErrorKind::InvalidData, rustls::Error::DecryptError);

        assert!(is_transport(&anyhow::Error::new(wrapped)));
        assert!(is_transport(&anyhow::Error::new(rustls::Error::DecryptError)));
    }

    #[test]
    fn handler_failures_are_not_transport() {
        assert!(!is_transport(&anyhow::anyhow!("boom")));
        assert!(!is_transport(&anyhow::Error::new(io::Error::other("disk full"))));
        assert!(!is_transport(&Error::UnsupportedResponse("x".into()).into()));
    }
}
