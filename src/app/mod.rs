//! Application facade.
//!
//! A [`Gear`] collects routes, WebSocket routes, status handlers and
//! middleware. An [`App`] is the root gear plus the lifespan hook, and is the
//! only thing that can be served. Sub-gears are merged into the app before
//! serving; serving consumes the app, so the tables are read-only from then
//! on and shared by every connection without locking.

pub mod handler;
pub mod lifespan;

pub use handler::{BoxFuture, Handler, WsHandler};
pub use lifespan::Lifespan;

use std::collections::HashMap;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::{Config, Limits};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::http::writer::server_banner;
use crate::middleware::{Middleware, Pipeline};
use crate::router::{Params, RouteError, Router};
use crate::server::{listener, tls};

/// A mountable set of routes and middleware.
#[derive(Default)]
pub struct Gear {
    router: Router<Handler>,
    ws_router: Router<WsHandler>,
    status_handlers: HashMap<u16, Handler>,
    pipeline: Pipeline,
}

impl Gear {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gear whose patterns all live under `root_path`.
    pub fn with_root(root_path: &str) -> Self {
        Self {
            router: Router::with_prefix(root_path),
            ws_router: Router::with_prefix(root_path),
            ..Self::default()
        }
    }

    pub fn add_route(&mut self, method: Method, pattern: &str, handler: Handler) -> Result<&mut Self, RouteError> {
        self.router.add_route(method, pattern, handler)?;
        Ok(self)
    }

    /// Registers `handler` under each of `methods`.
    pub fn route(&mut self, methods: &[Method], pattern: &str, handler: Handler) -> Result<&mut Self, RouteError> {
        for method in methods {
            self.router.add_route(*method, pattern, handler.clone())?;
        }
        Ok(self)
    }

    pub fn get(&mut self, pattern: &str, handler: Handler) -> Result<&mut Self, RouteError> {
        self.add_route(Method::GET, pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: Handler) -> Result<&mut Self, RouteError> {
        self.add_route(Method::POST, pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: Handler) -> Result<&mut Self, RouteError> {
        self.add_route(Method::PUT, pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: Handler) -> Result<&mut Self, RouteError> {
        self.add_route(Method::PATCH, pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: Handler) -> Result<&mut Self, RouteError> {
        self.add_route(Method::DELETE, pattern, handler)
    }

    /// Registers a WebSocket endpoint.
    pub fn ws(&mut self, pattern: &str, handler: WsHandler) -> Result<&mut Self, RouteError> {
        self.ws_router.add_route(Method::GET, pattern, handler)?;
        Ok(self)
    }

    /// Replaces the default body the server sends with `code`.
    ///
    /// Used for 404 (with the request available) and 500 (without).
    pub fn status(&mut self, code: u16, handler: Handler) -> &mut Self {
        self.status_handlers.insert(code, handler);
        self
    }

    /// Appends `middleware` as the new outermost layer.
    pub fn add_middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.pipeline.push(middleware);
        self
    }

    /// Pulls every route, status handler and middleware of `other` into
    /// this gear. Existing entries win on conflict.
    pub fn merge(&mut self, other: Gear) -> Result<&mut Self, RouteError> {
        self.router.combine(&other.router)?;
        self.ws_router.combine(&other.ws_router)?;
        for (code, handler) in other.status_handlers {
            self.status_handlers.entry(code).or_insert(handler);
        }
        self.pipeline.extend(&other.pipeline);
        Ok(self)
    }

    pub fn router(&self) -> &Router<Handler> {
        &self.router
    }

    pub fn ws_router(&self) -> &Router<WsHandler> {
        &self.ws_router
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

/// The root application.
#[derive(Default)]
pub struct App {
    gear: Gear,
    lifespan: Option<Arc<dyn Lifespan>>,
}

impl Deref for App {
    type Target = Gear;

    fn deref(&self) -> &Gear {
        &self.gear
    }
}

impl DerefMut for App {
    fn deref_mut(&mut self) -> &mut Gear {
        &mut self.gear
    }
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_lifespan(&mut self, lifespan: impl Lifespan) -> &mut Self {
        self.lifespan = Some(Arc::new(lifespan));
        self
    }

    /// Freezes the application into the state shared by all connections.
    pub fn into_service(self, config: &Config) -> Arc<Service> {
        Arc::new(Service {
            gear: self.gear,
            banner: server_banner(config.hide_server_version),
            limits: config.limits,
        })
    }

    /// Binds `config.listen_addr` and serves until Ctrl-C.
    pub async fn serve(self, config: Config) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&config.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", config.listen_addr))?;
        self.serve_with_shutdown(listener, config, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// Serves on `listener` until `shutdown` resolves.
    ///
    /// In-flight connections are left to finish on their own.
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, config: Config, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let acceptor = if config.tls.enabled {
            Some(tls::load_acceptor(&config.tls)?)
        } else {
            None
        };

        let lifespan = self.lifespan.clone();
        if let Some(lifespan) = &lifespan {
            lifespan.startup().await.context("lifespan startup failed")?;
        }

        let service = self.into_service(&config);
        let scheme = if acceptor.is_some() { "https" } else { "http" };
        info!("Listening on {}://{}", scheme, listener.local_addr()?);

        let result = tokio::select! {
            res = listener::run(&listener, service, acceptor) => res,
            _ = shutdown => {
                info!("Shutdown signal received");
                Ok(())
            }
        };

        if let Some(lifespan) = &lifespan {
            if let Err(err) = lifespan.shutdown().await {
                error!("lifespan shutdown failed: {:?}", err);
            }
        }
        drop(listener);

        result
    }
}

/// Read-only state shared by every connection once serving starts.
pub struct Service {
    gear: Gear,
    banner: String,
    limits: Limits,
}

impl Service {
    pub fn router(&self) -> &Router<Handler> {
        &self.gear.router
    }

    pub fn ws_router(&self) -> &Router<WsHandler> {
        &self.gear.ws_router
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.gear.pipeline
    }

    pub fn banner(&self) -> &str {
        &self.banner
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// The response sent for `status` when the server itself answers,
    /// using a registered status handler when there is one.
    pub async fn status_response(&self, status: StatusCode, request: Option<Request>) -> Response {
        let Some(handler) = self.gear.status_handlers.get(&status.as_u16()) else {
            return Response::status_text(status);
        };
        if handler.takes_request() && request.is_none() {
            return Response::status_text(status);
        }

        let custom = async {
            let reply = handler.call(request, Params::new()).await?;
            anyhow::Ok(reply.into_response_with(status)?)
        };
        match custom.await {
            Ok(response) => response,
            Err(err) => {
                error!("status handler for {} failed: {:?}", status.as_u16(), err);
                Response::status_text(status)
            }
        }
    }
}
