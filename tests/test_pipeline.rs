use async_trait::async_trait;
use nocturne::http::request::{Method, Request, RequestBuilder};
use nocturne::http::response::{Body, Response, StatusCode};
use nocturne::middleware::{Cors, Endpoint, Middleware, Next, Pipeline};
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<String>>>;

struct Echo(Log);

#[async_trait]
impl Endpoint for Echo {
    async fn call(&self, request: Request) -> anyhow::Result<Response> {
        self.0.lock().unwrap().push("endpoint".to_string());
        Ok(Response::new(request.path))
    }
}

fn tagger(name: &'static str, log: Log) -> impl Middleware {
    move |request: Request, next: Next| {
        let log = log.clone();
        async move {
            log.lock().unwrap().push(format!("{name} in"));
            let result = next.run(request).await;
            log.lock().unwrap().push(format!("{name} out"));
            result
        }
    }
}

fn request(method: Method, path: &str) -> Request {
    RequestBuilder::new().method(method).path(path).build().unwrap()
}

#[tokio::test]
async fn test_last_registered_middleware_is_outermost() {
    let log: Log = Arc::default();
    let mut pipeline = Pipeline::new();
    pipeline.push(tagger("A", log.clone()));
    pipeline.push(tagger("B", log.clone()));

    let response = pipeline
        .run(request(Method::GET, "/"), Arc::new(Echo(log.clone())))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["B in", "A in", "endpoint", "A out", "B out"]
    );
}

#[tokio::test]
async fn test_empty_pipeline_calls_endpoint() {
    let log: Log = Arc::default();
    let pipeline = Pipeline::new();

    let response = pipeline
        .run(request(Method::GET, "/plain"), Arc::new(Echo(log.clone())))
        .await
        .unwrap();

    assert!(pipeline.is_empty());
    assert_eq!(response.body, Body::Text("/plain".to_string()));
    assert_eq!(*log.lock().unwrap(), vec!["endpoint"]);
}

#[tokio::test]
async fn test_middleware_can_short_circuit() {
    let log: Log = Arc::default();
    let mut pipeline = Pipeline::new();
    pipeline.push(tagger("inner", log.clone()));
    pipeline.push(|_request: Request, _next: Next| async {
        anyhow::Ok(Response::status_text(StatusCode::from_u16(403).unwrap()))
    });

    let response = pipeline
        .run(request(Method::GET, "/"), Arc::new(Echo(log.clone())))
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 403);
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_middleware_can_rewrite_request_and_response() {
    let log: Log = Arc::default();
    let mut pipeline = Pipeline::new();
    pipeline.push(|mut request: Request, next: Next| async move {
        request.path = format!("/v2{}", request.path);
        let response = next.run(request).await?;
        anyhow::Ok(response.with_header("X-Rewritten", "yes"))
    });

    let response = pipeline
        .run(request(Method::GET, "/users"), Arc::new(Echo(log)))
        .await
        .unwrap();

    assert_eq!(response.body, Body::Text("/v2/users".to_string()));
    assert_eq!(response.header("X-Rewritten"), Some("yes"));
}

#[tokio::test]
async fn test_extend_appends_layers_in_order() {
    let log: Log = Arc::default();
    let mut child = Pipeline::new();
    child.push(tagger("child", log.clone()));
    let mut pipeline = Pipeline::new();
    pipeline.push(tagger("root", log.clone()));
    pipeline.extend(&child);

    pipeline
        .run(request(Method::GET, "/"), Arc::new(Echo(log.clone())))
        .await
        .unwrap();

    assert_eq!(pipeline.len(), 2);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["child in", "root in", "endpoint", "root out", "child out"]
    );
}

#[tokio::test]
async fn test_cors_headers_only_with_origin() {
    let log: Log = Arc::default();
    let mut pipeline = Pipeline::new();
    pipeline.push(Cors::default());

    let with_origin = RequestBuilder::new()
        .method(Method::GET)
        .path("/")
        .header("Origin", "http://example.com")
        .build()
        .unwrap();
    let response = pipeline
        .run(with_origin, Arc::new(Echo(log.clone())))
        .await
        .unwrap();
    let bare = pipeline
        .run(request(Method::GET, "/"), Arc::new(Echo(log)))
        .await
        .unwrap();

    assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
    assert_eq!(
        response.header("Access-Control-Allow-Methods"),
        Some("GET, POST, OPTIONS")
    );
    assert_eq!(
        response.header("Access-Control-Allow-Headers"),
        Some("Content-Type, Authorization")
    );
    assert_eq!(bare.header("Access-Control-Allow-Origin"), None);
}

#[tokio::test]
async fn test_cors_preflight_answers_no_content() {
    let log: Log = Arc::default();
    let mut pipeline = Pipeline::new();
    pipeline.push(Cors::default());

    let preflight = RequestBuilder::new()
        .method(Method::OPTIONS)
        .path("/")
        .header("Origin", "http://example.com")
        .build()
        .unwrap();
    let response = pipeline.run(preflight, Arc::new(Echo(log))).await.unwrap();

    assert_eq!(response.status, StatusCode::NO_CONTENT);
}
