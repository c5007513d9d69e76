//! HTTP handlers
//!
//! Thin adapters from JSON requests to the operations in `tools`.

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    Json,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::{Recipe, RecipeCreate, Store};
use crate::state::AppState;
use crate::tools::recipes::{
    self, CreateRecipeResponse, DeleteRecipeResponse, SearchRecipesResponse,
};
use crate::tools::shopping::{self, ShoppingListResponse};
use crate::tools::status::BasketStatus;
use crate::tools::stores::{self, InitializeStoresResponse, NearestStoresResponse};

#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    #[serde(default)]
    pub recipe_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct NearestStoresRequest {
    #[serde(default)]
    pub postcode: String,
}

/// Run SQLite work on the blocking pool
async fn blocking<F, T>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
}

fn recipe_id(path: Result<Path<i64>, PathRejection>) -> AppResult<i64> {
    path.map(|Path(id)| id)
        .map_err(|e| AppError::ValidationFailure(format!("Invalid recipe id: {}", e.body_text())))
}

pub async fn list_recipes(State(state): State<AppState>) -> AppResult<Json<Vec<Recipe>>> {
    let db = state.database.clone();
    Ok(Json(blocking(move || recipes::list_recipes(&db)).await?))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Recipe>> {
    let id = recipe_id(path)?;
    let db = state.database.clone();
    Ok(Json(blocking(move || recipes::get_recipe(&db, id)).await?))
}

pub async fn create_recipe(
    State(state): State<AppState>,
    body: Result<Json<RecipeCreate>, JsonRejection>,
) -> AppResult<Json<CreateRecipeResponse>> {
    let Json(data) = body?;
    let db = state.database.clone();
    Ok(Json(blocking(move || recipes::create_recipe(&db, data)).await?))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<DeleteRecipeResponse>> {
    let id = recipe_id(path)?;
    let db = state.database.clone();
    Ok(Json(blocking(move || recipes::delete_recipe(&db, id)).await?))
}

pub async fn list_stores(State(state): State<AppState>) -> AppResult<Json<Vec<Store>>> {
    let db = state.database.clone();
    Ok(Json(blocking(move || stores::list_stores(&db)).await?))
}

pub async fn initialize_stores(
    State(state): State<AppState>,
) -> AppResult<Json<InitializeStoresResponse>> {
    let db = state.database.clone();
    Ok(Json(blocking(move || stores::initialize_stores(&db)).await?))
}

pub async fn calculate_shopping_list(
    State(state): State<AppState>,
    body: Result<Json<CalculateRequest>, JsonRejection>,
) -> AppResult<Json<ShoppingListResponse>> {
    let Json(request) = body?;
    let db = state.database.clone();
    let response =
        blocking(move || shopping::calculate_shopping_list(&db, &request.recipe_ids)).await?;
    Ok(Json(response))
}

pub async fn search_recipes(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> AppResult<Json<SearchRecipesResponse>> {
    let Json(request) = body?;
    Ok(Json(recipes::search_recipes(&state, &request.query).await?))
}

pub async fn generate_recipe(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> AppResult<Json<CreateRecipeResponse>> {
    let Json(request) = body?;
    Ok(Json(recipes::generate_recipe(&state, &request.name).await?))
}

pub async fn find_nearest_stores(
    State(state): State<AppState>,
    body: Result<Json<NearestStoresRequest>, JsonRejection>,
) -> AppResult<Json<NearestStoresResponse>> {
    let Json(request) = body?;
    let response =
        stores::find_nearest_stores(&state.database, state.geocoder.as_ref(), &request.postcode)
            .await?;
    Ok(Json(response))
}

pub async fn status(State(state): State<AppState>) -> AppResult<Json<BasketStatus>> {
    let generator_enabled = state.generator.is_some();
    let status = blocking(move || state.status.get_status(&state.database, generator_enabled)).await?;
    Ok(Json(status))
}
