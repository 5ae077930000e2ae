use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, warn};

use crate::app::Service;
use crate::http::connection::Connection;

/// Accepts connections forever, one task per connection.
///
/// A failed accept is logged and skipped; it never stops the loop.
pub async fn run(
    listener: &TcpListener,
    service: Arc<Service>,
    acceptor: Option<TlsAcceptor>,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Accept failed: {}", e);
                continue;
            }
        };
        debug!("Accepted connection from {}", peer);

        let service = Arc::clone(&service);
        let acceptor = acceptor.clone();
        tokio::spawn(async move {
            let result = match acceptor {
                Some(acceptor) => match acceptor.accept(socket).await {
                    Ok(stream) => Connection::new(stream, peer, true, service).run().await,
                    Err(e) => {
                        debug!("TLS handshake with {} failed: {}", peer, e);
                        return;
                    }
                },
                None => Connection::new(socket, peer, false, service).run().await,
            };
            if let Err(e) = result {
                debug!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
