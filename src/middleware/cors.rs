use async_trait::async_trait;

use super::{Middleware, Next};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};

/// Cross-origin headers for browser clients.
///
/// Headers are only added when the request carries an `Origin`. Preflight
/// (`OPTIONS`) requests still run the chain and are answered with 204.
#[derive(Debug, Clone)]
pub struct Cors {
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
}

impl Default for Cors {
    fn default() -> Self {
        Self {
            allow_origins: vec!["*".to_string()],
            allow_methods: vec!["GET".to_string(), "POST".to_string(), "OPTIONS".to_string()],
            allow_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
        }
    }
}

#[async_trait]
impl Middleware for Cors {
    async fn handle(&self, request: Request, next: Next) -> anyhow::Result<Response> {
        let has_origin = request.header("Origin").is_some();
        let preflight = request.method == Method::OPTIONS;

        let mut response = next.run(request).await?;

        if has_origin {
            response.headers.insert(
                "Access-Control-Allow-Origin".to_string(),
                self.allow_origins.join(", "),
            );
            response.headers.insert(
                "Access-Control-Allow-Methods".to_string(),
                self.allow_methods.join(", "),
            );
            response.headers.insert(
                "Access-Control-Allow-Headers".to_string(),
                self.allow_headers.join(", "),
            );
        }
        if preflight {
            response.status = StatusCode::NO_CONTENT;
        }
        Ok(response)
    }
}
