use async_trait::async_trait;

/// Startup and shutdown notifications around the accept loop.
///
/// `startup` is awaited once before the first connection is accepted and
/// `shutdown` once after the listener stops; a startup error aborts serving.
#[async_trait]
pub trait Lifespan: Send + Sync + 'static {
    async fn startup(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn shutdown(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
