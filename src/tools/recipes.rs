//! Recipe Tools
//!
//! Tools for listing, creating, deleting, searching and generating recipes.

use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Recipe, RecipeCreate};
use crate::selection::Selection;
use crate::state::AppState;

use super::shopping::{selection_shopping_list, SelectionShoppingList};

/// Response for create_recipe and generate_recipe
#[derive(Debug, Serialize)]
pub struct CreateRecipeResponse {
    pub message: String,
    pub recipe: Recipe,
}

/// Response for delete_recipe
#[derive(Debug, Serialize)]
pub struct DeleteRecipeResponse {
    pub message: String,
    pub deleted_id: i64,
    /// Recomputed list when the deleted recipe was part of the selection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shopping_list: Option<SelectionShoppingList>,
    /// Other selected recipes found to be deleted while recomputing
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_recipe_ids: Vec<i64>,
}

/// Response for search_recipes
#[derive(Debug, Serialize)]
pub struct SearchRecipesResponse {
    pub message: String,
    pub recipes: Vec<Recipe>,
}

pub fn list_recipes(db: &Database) -> AppResult<Vec<Recipe>> {
    Ok(db.with_conn(Recipe::list)?)
}

pub fn get_recipe(db: &Database, id: i64) -> AppResult<Recipe> {
    db.with_conn(|conn| Recipe::get_by_id(conn, id))?
        .ok_or(AppError::UnknownRecipe(id))
}

/// Validate and store a new recipe
pub fn create_recipe(db: &Database, data: RecipeCreate) -> AppResult<CreateRecipeResponse> {
    data.validate().map_err(AppError::ValidationFailure)?;

    let recipe = db.with_conn_mut(|conn| Recipe::create(conn, &data))?;
    info!(id = recipe.id, name = %recipe.name, "Recipe added");

    Ok(CreateRecipeResponse {
        message: "Recipe added successfully".to_string(),
        recipe,
    })
}

pub fn delete_recipe(db: &Database, id: i64) -> AppResult<DeleteRecipeResponse> {
    if !db.with_conn(|conn| Recipe::delete(conn, id))? {
        return Err(AppError::UnknownRecipe(id));
    }
    info!(id, "Recipe deleted");

    Ok(DeleteRecipeResponse {
        message: "Recipe deleted successfully".to_string(),
        deleted_id: id,
        shopping_list: None,
        removed_recipe_ids: Vec::new(),
    })
}

/// Delete a recipe and drop it from the selection. If it was selected, the
/// shopping list is recomputed without it.
pub fn delete_selected_recipe(
    db: &Database,
    selection: &mut Selection,
    id: i64,
) -> AppResult<DeleteRecipeResponse> {
    let mut response = delete_recipe(db, id)?;

    if selection.deselect(id) {
        let outcome = selection_shopping_list(db, selection)?;
        response.shopping_list = Some(outcome.shopping_list);
        response.removed_recipe_ids = outcome.removed_recipe_ids;
    }

    Ok(response)
}

/// With a generator, ask it for suggestions and store them; otherwise search
/// the local collection
pub async fn search_recipes(state: &AppState, query: &str) -> AppResult<SearchRecipesResponse> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::ValidationFailure("Search query is required".to_string()));
    }

    let Some(generator) = &state.generator else {
        let recipes = state.database.with_conn(|conn| Recipe::search(conn, query))?;
        return Ok(SearchRecipesResponse {
            message: format!("Found {} matching recipes", recipes.len()),
            recipes,
        });
    };

    let suggestions = generator.suggest(query, state.suggestion_count).await?;

    let mut recipes = Vec::with_capacity(suggestions.len());
    for suggestion in suggestions {
        if let Err(reason) = suggestion.validate() {
            tracing::warn!(name = %suggestion.name, %reason, "Skipping generated recipe");
            continue;
        }
        recipes.push(
            state
                .database
                .with_conn_mut(|conn| Recipe::create(conn, &suggestion))?,
        );
    }
    info!(query, saved = recipes.len(), "Stored generated suggestions");

    Ok(SearchRecipesResponse {
        message: "Recipes found successfully".to_string(),
        recipes,
    })
}

/// Generate a recipe by name and store it
pub async fn generate_recipe(state: &AppState, name: &str) -> AppResult<CreateRecipeResponse> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::ValidationFailure("Recipe name is required".to_string()));
    }

    let generator = state
        .generator
        .as_ref()
        .ok_or(AppError::NotConfigured("Recipe generator"))?;

    let data = generator.generate(name).await?;
    let mut response = create_recipe(&state.database, data)?;
    response.message = "Recipe generated successfully".to_string();
    Ok(response)
}
