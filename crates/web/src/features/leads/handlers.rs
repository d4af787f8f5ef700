use axum::{
    Extension, Json,
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
};
use lead_importer::{AdminAuthorizer, ImportLeadsRequest, ImportSummary, ImporterError, Principal};
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    post,
    path = "/api/leads/import",
    request_body = ImportLeadsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Every record accounted for", body = ImportSummary),
        (status = 400, description = "Empty or oversized request"),
        (status = 401, description = "Missing or unknown API key"),
        (status = 403, description = "API key is not an admin key"),
        (status = 422, description = "Body does not match the request schema"),
        (status = 502, description = "Existing leads could not be looked up; nothing imported")
    ),
    tag = "leads"
)]
pub async fn import_leads(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Bytes,
) -> Result<Response, WebError> {
    // Non-admin keys are turned away before the body is parsed.
    if !state.api_keys.is_authorized_admin(&principal) {
        return Err(ImporterError::Unauthorized.into());
    }

    let Json(req) = Json::<ImportLeadsRequest>::from_bytes(&body)?;
    req.validate()?;

    let summary = services::import_leads(
        state.db.pool(),
        &state.api_keys,
        &state.import_config,
        &principal,
        req,
    )
    .await?;

    Ok(Json(summary).into_response())
}
