//! Listening socket and transport plumbing.

pub mod listener;
pub mod tls;

use tokio::io::{AsyncRead, AsyncWrite};

/// Anything a connection can run over: plain TCP, TLS, or an in-memory pipe.
pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncStream for T {}

pub type BoxedStream = Box<dyn AsyncStream>;
