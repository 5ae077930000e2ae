use nocturne::middleware::Cors;
use nocturne::{App, Config, Gear, Handler, Params, Request, Response, WebSocket, WsHandler};
use serde_json::json;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    let mut app = App::new();
    app.get(
        "/",
        Handler::with_request(|_req: Request| async { Response::new("Hello, World!") }),
    )?
    .get("/noreq", Handler::no_args(|| async { ("Hello, World2!", 201u16) }))?
    .get(
        "/users/:id",
        Handler::with_params(|params: Params| async move { json!({ "id": params["id"] }) }),
    )?
    .ws("/ws", WsHandler::new(echo))?;
    app.add_middleware(Cors::default());

    let mut child = Gear::new();
    child.get("/gear", Handler::no_args(|| async { Response::new("From Gear!") }))?;
    app.merge(child)?;

    app.serve(cfg).await
}

async fn echo(mut ws: WebSocket, _params: Params) -> anyhow::Result<()> {
    ws.accept().await?;
    ws.send("Test").await?;
    loop {
        if let Some(msg) = ws.recv().await? {
            ws.send(&msg).await?;
        }
    }
}
