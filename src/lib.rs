//! Nocturne - a small HTTP/1.1 and WebSocket application server
//!
//! Requests are parsed straight off the socket, routed through a compiled
//! path router, run through an onion-model middleware pipeline and written
//! back with a hand-rolled serializer. `Upgrade: websocket` requests are
//! handed to a WebSocket session on the same stream.

pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod router;
pub mod server;
pub mod websocket;

pub use app::{App, Gear, Handler, Lifespan, WsHandler};
pub use config::Config;
pub use error::{Error, Result};
pub use http::request::{Method, Request};
pub use http::response::{Body, IntoReply, Reply, Response, StatusCode};
pub use middleware::{Middleware, Next};
pub use router::Params;
pub use websocket::WebSocket;
