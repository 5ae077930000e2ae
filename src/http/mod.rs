//! HTTP protocol implementation.
//!
//! A deliberately small HTTP/1.1: one request per connection, bodies framed
//! only by `Content-Length`, no chunked encoding and no pipelining.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`connection`**: The per-connection state machine, routing and upgrade hand-off
//! - **`parser`**: Parses incoming HTTP requests from byte buffers
//! - **`request`**: HTTP request representation and accessors
//! - **`response`**: Response model, body encoding and reply coercion
//! - **`writer`**: Serializes and writes HTTP responses to the client
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Buffer until the head (and body) is complete
//!        └──────┬──────┘
//!               │ Request parsed
//!        ┌──────┴─────────────────────────┐
//!        ▼                                ▼
//!  ┌──────────────┐              ┌─────────────────┐
//!  │  Processing  │ ← route,     │    Upgrading    │ ← Upgrade: websocket
//!  └──────┬───────┘   middleware └───┬─────────┬───┘
//!         │ Response ready            │ refused │ handed to session
//!         ▼                           ▼         ▼
//!  ┌──────────────┐◀──────────────────┘   ┌──────────┐
//!  │   Writing    │                       │ Upgraded │
//!  └──────┬───────┘                       └──────────┘
//!         │ Response sent
//!         ▼
//!      Closed
//! ```
//!
//! A malformed request goes straight from `Reading` to `Writing` with a 4xx.
//!
//! # Example
//!
//! ```ignore
//! use nocturne::{App, Config, Handler};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mut app = App::new();
//!     app.get("/", Handler::no_args(|| async { "Hello, World!" }))?;
//!     app.serve(Config::load()?).await
//! }
//! ```

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
