use lead_importer::{
    ImportConfig, ImportLeadsRequest, ImportSummary, LeadImporter, Principal, Result,
};
use sqlx::PgPool;
use storage::repository::LeadRepository;

use crate::middleware::auth::ApiKeys;

/// Run a bulk import against the leads table
pub async fn import_leads(
    pool: &PgPool,
    api_keys: &ApiKeys,
    config: &ImportConfig,
    principal: &Principal,
    request: ImportLeadsRequest,
) -> Result<ImportSummary> {
    let repo = LeadRepository::new(pool);
    LeadImporter::new(&repo, api_keys, config.clone())
        .import_leads(principal, request.into())
        .await
}
