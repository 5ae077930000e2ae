//! Onion-model middleware.
//!
//! Middleware registered as `[m1, m2, ..., mn]` runs as
//! `mn(req, next = m(n-1)(req, ... m1(req, next = endpoint)))`: the last one
//! registered sees the request first and the response last.
//!
//! A middleware may rewrite the request before calling [`Next::run`], edit
//! the response afterwards, or return without calling it at all. The
//! endpoint coerces the handler's reply into a prepared [`Response`], so
//! every layer gets a well-formed response back from `next`.
//!
//! Plain async closures are middleware too:
//!
//! ```ignore
//! app.add_middleware(|request: Request, next: Next| async move {
//!     let mut response = next.run(request).await?;
//!     response.headers.insert("X-Powered-By".into(), "nocturne".into());
//!     Ok(response)
//! });
//! ```

pub mod cors;

pub use cors::Cors;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::http::request::Request;
use crate::http::response::Response;

#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn handle(&self, request: Request, next: Next) -> anyhow::Result<Response>;
}

#[async_trait]
impl<F, Fut> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Response>> + Send + 'static,
{
    async fn handle(&self, request: Request, next: Next) -> anyhow::Result<Response> {
        (self)(request, next).await
    }
}

/// The innermost call of a chain: runs the routed handler.
#[async_trait]
pub trait Endpoint: Send + Sync + 'static {
    async fn call(&self, request: Request) -> anyhow::Result<Response>;
}

/// Continuation handed to each middleware.
#[derive(Clone)]
pub struct Next {
    chain: Arc<[Arc<dyn Middleware>]>,
    depth: usize,
    endpoint: Arc<dyn Endpoint>,
}

impl Next {
    /// Runs the rest of the chain with `request`.
    pub async fn run(self, request: Request) -> anyhow::Result<Response> {
        match self.depth.checked_sub(1) {
            Some(inner) => {
                let middleware = Arc::clone(&self.chain[inner]);
                let next = Next {
                    chain: self.chain,
                    depth: inner,
                    endpoint: self.endpoint,
                };
                middleware.handle(request, next).await
            }
            None => self.endpoint.call(request).await,
        }
    }
}

/// Ordered list of middleware, frozen once serving starts.
#[derive(Clone)]
pub struct Pipeline {
    chain: Arc<[Arc<dyn Middleware>]>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            chain: Arc::from(Vec::new()),
        }
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `middleware` as the new outermost layer.
    pub fn push(&mut self, middleware: impl Middleware) {
        self.push_arc(Arc::new(middleware));
    }

    fn push_arc(&mut self, middleware: Arc<dyn Middleware>) {
        let mut chain = self.chain.to_vec();
        chain.push(middleware);
        self.chain = chain.into();
    }

    /// Appends every layer of `other`, keeping its order.
    pub fn extend(&mut self, other: &Pipeline) {
        for middleware in other.chain.iter() {
            self.push_arc(Arc::clone(middleware));
        }
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Sends `request` through every layer down to `endpoint`.
    pub async fn run(&self, request: Request, endpoint: Arc<dyn Endpoint>) -> anyhow::Result<Response> {
        let next = Next {
            chain: Arc::clone(&self.chain),
            depth: self.chain.len(),
            endpoint,
        };
        next.run(request).await
    }
}
