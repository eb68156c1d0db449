use async_trait::async_trait;
use axum::Router;

use crate::settings::Settings;

/// Borrowed view of process state handed to lifecycle hooks.
pub struct InitCtx<'a> {
    pub settings: &'a Settings,
}

/// A feature area of the API: its routes and docs fragment, plus optional
/// lifecycle hooks.
///
/// Hooks run in registration order (`init`, then `start`) once migrations
/// have been applied; `stop` runs in reverse order at shutdown.
#[async_trait]
pub trait Module: Sync + Send {
    /// Stable name, also the mount point: routes live under `/api/{name}`.
    fn name(&self) -> &'static str;

    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI `paths` and `components` with module-relative paths.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
