use axum::extract::FromRef;
use lead_importer::ImportConfig;
use storage::Database;

use crate::middleware::auth::ApiKeys;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub api_keys: ApiKeys,
    pub import_config: ImportConfig,
}

impl FromRef<AppState> for ApiKeys {
    fn from_ref(state: &AppState) -> Self {
        state.api_keys.clone()
    }
}
