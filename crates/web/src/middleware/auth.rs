use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use lead_importer::{AdminAuthorizer, Principal};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::WebError;

/// Configured API keys. Each key maps to a label such as `admin-key-1`; the
/// label, never the key itself, becomes the request principal.
#[derive(Clone)]
pub struct ApiKeys {
    labels: Arc<HashMap<String, String>>,
    admins: Arc<HashSet<String>>,
}

impl ApiKeys {
    pub fn from_comma_separated(keys_str: &str, admin_keys_str: &str) -> Self {
        let mut labels = HashMap::new();
        let mut admins = HashSet::new();

        for (idx, key) in split_keys(keys_str).enumerate() {
            labels.insert(key.to_string(), format!("api-key-{}", idx + 1));
        }
        for (idx, key) in split_keys(admin_keys_str).enumerate() {
            let label = format!("admin-key-{}", idx + 1);
            admins.insert(label.clone());
            labels.insert(key.to_string(), label);
        }

        Self {
            labels: Arc::new(labels),
            admins: Arc::new(admins),
        }
    }

    pub fn principal_for(&self, key: &str) -> Option<Principal> {
        self.labels.get(key).map(Principal::new)
    }
}

fn split_keys(keys_str: &str) -> impl Iterator<Item = &str> {
    keys_str.split(',').map(str::trim).filter(|s| !s.is_empty())
}

impl AdminAuthorizer for ApiKeys {
    fn is_authorized_admin(&self, principal: &Principal) -> bool {
        self.admins.contains(&principal.subject)
    }
}

/// Requires a known bearer key and attaches its [`Principal`] to the request.
pub async fn require_auth(
    State(api_keys): State<ApiKeys>,
    mut request: Request,
    next: Next,
) -> Result<Response, WebError> {
    let principal = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| api_keys.principal_for(token.trim()));

    match principal {
        Some(principal) => {
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        None => {
            tracing::warn!("Invalid API key attempt");
            Err(WebError::Unauthorized)
        }
    }
}
