//! HTTP API
//!
//! JSON endpoints under `/api`. Every failure answers `{"error": ...}`.

pub mod handlers;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route(
            "/api/recipes",
            get(handlers::list_recipes).post(handlers::create_recipe),
        )
        .route(
            "/api/recipes/{id}",
            get(handlers::get_recipe).delete(handlers::delete_recipe),
        )
        .route("/api/stores", get(handlers::list_stores))
        .route("/api/initialize-stores", post(handlers::initialize_stores))
        .route(
            "/api/calculate-shopping-list",
            post(handlers::calculate_shopping_list),
        )
        .route("/api/search-recipes", post(handlers::search_recipes))
        .route("/api/generate-recipe", post(handlers::generate_recipe))
        .route("/api/find-nearest-stores", post(handlers::find_nearest_stores))
        .route("/api/status", get(handlers::status))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::db::testing::temp_database;
    use crate::error::{AppError, AppResult};
    use crate::services::Geocoder;

    /// Knows a single postcode in Whitley Bay
    struct WhitleyBay;

    #[async_trait]
    impl Geocoder for WhitleyBay {
        async fn locate(&self, postcode: &str) -> AppResult<(f64, f64)> {
            if postcode == "NE26 1AA" {
                Ok((55.0450, -1.4470))
            } else {
                Err(AppError::ValidationFailure(
                    "Could not find location for the provided postcode".to_string(),
                ))
            }
        }
    }

    fn app() -> (tempfile::TempDir, Router) {
        let (dir, db) = temp_database();
        let state = AppState::new(db, Arc::new(WhitleyBay), None, 3);
        (dir, router(state))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn add_recipe(app: &Router, name: &str, ingredients: Value) -> i64 {
        let (status, body) = send(
            app,
            "POST",
            "/api/recipes",
            Some(json!({ "name": name, "ingredients": ingredients, "instructions": "Mix." })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["recipe"]["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_recipe_crud() {
        let (_dir, app) = app();
        let id = add_recipe(&app, "Pancakes", json!({ "flour": 100, "milk": 250 })).await;

        let (status, body) = send(&app, "GET", "/api/recipes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = send(&app, "GET", &format!("/api/recipes/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ingredients"]["milk"], 250.0);

        let (status, body) = send(&app, "DELETE", &format!("/api/recipes/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted_id"], id);
        assert!(body.get("shopping_list").is_none());

        let (status, body) = send(&app, "GET", &format!("/api/recipes/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], format!("Recipe not found with id: {}", id));
    }

    #[tokio::test]
    async fn test_create_recipe_validation() {
        let (_dir, app) = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/recipes",
            Some(json!({ "name": "Bad", "ingredients": { "flour": -1 } })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_error() {
        let (_dir, app) = app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/calculate-shopping-list")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Malformed request body"));
    }

    #[tokio::test]
    async fn test_invalid_recipe_id() {
        let (_dir, app) = app();
        let (status, body) = send(&app, "GET", "/api/recipes/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid recipe id"));
    }

    #[tokio::test]
    async fn test_calculate_shopping_list() {
        let (_dir, app) = app();
        let (status, body) = send(&app, "POST", "/api/initialize-stores", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stores_created"], 6);

        let eggs = add_recipe(&app, "Omelette", json!({ "eggs": 2, "salt": 1 })).await;
        let cookies = add_recipe(&app, "Cookies", json!({ "eggs": 1, "brown sugar": 1 })).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/calculate-shopping-list",
            Some(json!({ "recipe_ids": [eggs, cookies] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["shopping_list"]["eggs"], 3.0);
        assert_eq!(body["store_costs"].as_object().unwrap().len(), 6);
        assert_eq!(body["cheapest_store"], "Morrisons Whitley Bay");
        // 3 * 2.35 + 0.55 + 1.15
        let total = body["total_cost"].as_f64().unwrap();
        assert!((total - 8.75).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_calculate_error_statuses() {
        let (_dir, app) = app();

        let (status, body) = send(
            &app,
            "POST",
            "/api/calculate-shopping-list",
            Some(json!({ "recipe_ids": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No recipes selected");

        let (status, _) = send(
            &app,
            "POST",
            "/api/calculate-shopping-list",
            Some(json!({ "recipe_ids": [404] })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let id = add_recipe(&app, "Toast", json!({ "bread": 1 })).await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/calculate-shopping-list",
            Some(json!({ "recipe_ids": [id] })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_find_nearest_stores() {
        let (_dir, app) = app();
        send(&app, "POST", "/api/initialize-stores", None).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/find-nearest-stores",
            Some(json!({ "postcode": "NE26 1AA" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let stores = body["stores"].as_array().unwrap();
        assert_eq!(stores.len(), 6);
        assert_eq!(stores[5]["name"], "Waitrose London");

        let (status, body) = send(
            &app,
            "POST",
            "/api/find-nearest-stores",
            Some(json!({ "postcode": "ZZ1 1ZZ" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Could not find location for the provided postcode"
        );
    }

    #[tokio::test]
    async fn test_generate_without_generator() {
        let (_dir, app) = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/generate-recipe",
            Some(json!({ "name": "Shortbread" })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Recipe generator is not configured");
    }

    #[tokio::test]
    async fn test_search_falls_back_to_local() {
        let (_dir, app) = app();
        add_recipe(&app, "Victoria Sponge", json!({ "caster sugar": 200 })).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/search-recipes",
            Some(json!({ "query": "sugar" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recipes"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_status() {
        let (_dir, app) = app();
        add_recipe(&app, "Toast", json!({ "bread": 1 })).await;

        let (status, body) = send(&app, "GET", "/api/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recipe_count"], 1);
        assert_eq!(body["store_count"], 0);
        assert_eq!(body["recipe_generation_enabled"], false);
    }
}
