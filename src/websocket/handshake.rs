use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha1::{Digest, Sha1};

/// GUID appended to the client key before hashing (RFC 6455, section 1.3).
pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Protocol version announced when the client did not name one.
pub const DEFAULT_VERSION: &str = "13";

/// Derives `Sec-WebSocket-Accept` from the client's `Sec-WebSocket-Key`.
///
/// ```
/// use nocturne::websocket::handshake::accept_key;
///
/// assert_eq!(accept_key("dGhlIHNhbXBsZSBub25jZQ=="), "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
/// ```
pub fn accept_key(client_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(client_key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// The `101 Switching Protocols` response completing the handshake.
pub fn switching_protocols(client_key: &str, version: &str) -> Vec<u8> {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\
         Sec-WebSocket-Version: {}\r\n\
         \r\n",
        accept_key(client_key),
        version
    )
    .into_bytes()
}
