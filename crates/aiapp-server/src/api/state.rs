use crate::api::error::RelayFailure;
use crate::registry::AppRegistry;
use aiapp_relay::{AppKind, AppProfile, DifyClient};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AppRegistry>,
    pub dify: DifyClient,
}

impl AppState {
    pub fn new(registry: AppRegistry, dify: DifyClient) -> Self {
        Self {
            registry: Arc::new(registry),
            dify,
        }
    }

    /// Resolve the required `appId` to a profile of the expected kind.
    /// Rejected before any upstream call is made.
    pub fn resolve(
        &self,
        app_id: Option<&str>,
        kind: AppKind,
    ) -> Result<AppProfile, RelayFailure> {
        let id = app_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(RelayFailure::missing_app_id)?;

        let app = self
            .registry
            .get(id)
            .ok_or_else(|| RelayFailure::unknown_app(id))?;

        if app.kind != kind {
            let expected = match kind {
                AppKind::Chat => "chat",
                AppKind::Completion => "completion",
                AppKind::Workflow => "workflow",
            };
            return Err(RelayFailure::kind_mismatch(id, expected));
        }

        Ok(app.clone())
    }
}
