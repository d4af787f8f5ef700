use axum::{Router, middleware, routing::post};

use super::handlers::import_leads;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/import", post(import_leads))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::ApiKeys;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use lead_importer::ImportConfig;
    use serde_json::{Value, json};
    use sqlx::postgres::PgPoolOptions;
    use storage::Database;
    use tower::ServiceExt;

    // The pool never connects: every request below is answered before the
    // pipeline reaches the store.
    fn app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/leads_test")
            .unwrap();
        let state = AppState {
            db: Database::from_pool(pool),
            api_keys: ApiKeys::from_comma_separated("viewer", "root"),
            import_config: ImportConfig::default(),
        };

        Router::new()
            .nest("/api/leads", routes(&state))
            .with_state(state)
    }

    fn import_request(key: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/leads/import")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = key {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", key));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_key_is_unauthorized() {
        let response = app()
            .oneshot(import_request(None, json!({"records": [{"email": "a@x.com"}]})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_admin_key_is_forbidden() {
        let response = app()
            .oneshot(import_request(
                Some("viewer"),
                json!({"records": [{"email": "a@x.com"}]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["error"], "Admin access required");
    }

    #[tokio::test]
    async fn test_non_admin_key_is_forbidden_before_body_checks() {
        let records: Vec<Value> = (0..10_001).map(|i| json!({"email": format!("u{}@x.com", i)})).collect();
        let bodies = vec![
            json!({"records": []}),
            json!({"records": records}),
            json!({"records": [{"email": "a@x.com"}], "default_strategy": "overwrite"}),
        ];

        for body in bodies {
            let response = app()
                .oneshot(import_request(Some("viewer"), body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/leads/import")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, "Bearer root")
            .body(Body::from("{\"records\": ["))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_records_are_rejected() {
        let response = app()
            .oneshot(import_request(Some("root"), json!({"records": []})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid input"));
    }

    #[tokio::test]
    async fn test_oversized_request_fails_validation() {
        let records: Vec<Value> = (0..10_001).map(|i| json!({"email": format!("u{}@x.com", i)})).collect();
        let response = app()
            .oneshot(import_request(Some("root"), json!({"records": records})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(body["details"][0], "records: at most 10000 records per request");
    }

    #[tokio::test]
    async fn test_unknown_strategy_is_rejected_by_json_extractor() {
        let response = app()
            .oneshot(import_request(
                Some("root"),
                json!({"records": [{"email": "a@x.com"}], "default_strategy": "overwrite"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
