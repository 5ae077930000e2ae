//! Handler descriptors.
//!
//! The shape of a handler's arguments is fixed when it is registered, so the
//! connection never has to inspect a handler to decide what to pass it. The
//! request is only handed to handlers that take one.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::http::request::Request;
use crate::http::response::{IntoReply, Reply, Response};
use crate::middleware::Endpoint;
use crate::router::Params;
use crate::websocket::WebSocket;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type HandlerResult = anyhow::Result<Reply>;

/// A route handler, tagged by the arguments it takes.
#[derive(Clone)]
pub enum Handler {
    /// Takes nothing.
    NoArgs(Arc<dyn Fn() -> BoxFuture<'static, HandlerResult> + Send + Sync>),
    /// Takes the path parameters only.
    Params(Arc<dyn Fn(Params) -> BoxFuture<'static, HandlerResult> + Send + Sync>),
    /// Takes the request only.
    Request(Arc<dyn Fn(Request) -> BoxFuture<'static, HandlerResult> + Send + Sync>),
    /// Takes the request and the path parameters.
    RequestParams(Arc<dyn Fn(Request, Params) -> BoxFuture<'static, HandlerResult> + Send + Sync>),
}

impl Handler {
    pub fn no_args<F, Fut, R>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        Handler::NoArgs(Arc::new(move || -> BoxFuture<'static, HandlerResult> {
            let fut = f();
            Box::pin(async move { fut.await.into_reply() })
        }))
    }

    pub fn with_params<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        Handler::Params(Arc::new(move |params| -> BoxFuture<'static, HandlerResult> {
            let fut = f(params);
            Box::pin(async move { fut.await.into_reply() })
        }))
    }

    pub fn with_request<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        Handler::Request(Arc::new(move |request| -> BoxFuture<'static, HandlerResult> {
            let fut = f(request);
            Box::pin(async move { fut.await.into_reply() })
        }))
    }

    pub fn with_request_and_params<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Request, Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        Handler::RequestParams(Arc::new(move |request, params| -> BoxFuture<'static, HandlerResult> {
            let fut = f(request, params);
            Box::pin(async move { fut.await.into_reply() })
        }))
    }

    /// A plain function of the path parameters, run inline.
    pub fn sync<F, R>(f: F) -> Self
    where
        F: Fn(Params) -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        Handler::Params(Arc::new(move |params| -> BoxFuture<'static, HandlerResult> {
            let reply = f(params).into_reply();
            Box::pin(std::future::ready(reply))
        }))
    }

    pub fn takes_request(&self) -> bool {
        matches!(self, Handler::Request(_) | Handler::RequestParams(_))
    }

    /// Invokes the handler.
    ///
    /// `request` may be `None` only for handlers that do not take one.
    pub async fn call(&self, request: Option<Request>, params: Params) -> anyhow::Result<Reply> {
        match (self, request) {
            (Handler::NoArgs(f), _) => f().await,
            (Handler::Params(f), _) => f(params).await,
            (Handler::Request(f), Some(request)) => f(request).await,
            (Handler::RequestParams(f), Some(request)) => f(request, params).await,
            (_, None) => anyhow::bail!("handler takes a request but none was supplied"),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Handler::NoArgs(_) => "NoArgs",
            Handler::Params(_) => "Params",
            Handler::Request(_) => "Request",
            Handler::RequestParams(_) => "RequestParams",
        };
        f.debug_tuple("Handler").field(&kind).finish()
    }
}

/// Terminal of the middleware chain for one routed request.
pub(crate) struct RouteEndpoint {
    pub handler: Handler,
    pub params: Params,
}

#[async_trait]
impl Endpoint for RouteEndpoint {
    async fn call(&self, request: Request) -> anyhow::Result<Response> {
        let reply = self.handler.call(Some(request), self.params.clone()).await?;
        Ok(reply.into_response()?)
    }
}

/// Handler for an upgraded WebSocket route.
///
/// It receives the session in `HandshakePending` state and decides whether
/// to `accept()` it.
#[derive(Clone)]
pub struct WsHandler(Arc<dyn Fn(WebSocket, Params) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>);

impl WsHandler {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(WebSocket, Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        WsHandler(Arc::new(move |ws, params| -> BoxFuture<'static, anyhow::Result<()>> {
            Box::pin(f(ws, params))
        }))
    }

    pub async fn call(&self, ws: WebSocket, params: Params) -> anyhow::Result<()> {
        (self.0)(ws, params).await
    }
}

impl fmt::Debug for WsHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WsHandler")
    }
}
