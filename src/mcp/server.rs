//! Basket MCP Server Implementation
//!
//! Exposes the Basket operations as MCP tools and keeps the session's recipe
//! selection.

use std::sync::{Arc, MutexGuard};

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Ingredients, RecipeCreate};
use crate::selection::Selection;
use crate::state::AppState;
use crate::tools::recipes;
use crate::tools::shopping::{self, SelectionShoppingList};
use crate::tools::stores;

/// Basket MCP Service
#[derive(Clone)]
pub struct BasketService {
    state: AppState,
    tool_router: ToolRouter<BasketService>,
    /// Recipes ticked in this session
    selection: Arc<std::sync::Mutex<Selection>>,
}

impl BasketService {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
            selection: Arc::new(std::sync::Mutex::new(Selection::new())),
        }
    }

    fn selection(&self) -> Result<MutexGuard<'_, Selection>, McpError> {
        self.selection
            .lock()
            .map_err(|_| McpError::internal_error("Selection lock poisoned", None))
    }

    /// Apply `change` to a copy of the selection and recompute its list. The
    /// session's selection is only replaced once the recompute succeeds.
    fn change_selection<F>(&self, change: F) -> Result<CallToolResult, McpError>
    where
        F: FnOnce(&mut Selection) -> String,
    {
        let mut selection = self.selection()?;
        let mut next = selection.clone();
        let message = change(&mut next);

        let outcome = shopping::selection_shopping_list(&self.state.database, &mut next)
            .map_err(tool_error)?;
        *selection = next;

        to_result(&SelectionResponse {
            message,
            recipe_ids: selection.ids(),
            removed_recipe_ids: outcome.removed_recipe_ids,
            shopping_list: outcome.shopping_list,
        })
    }
}

/// Client mistakes become invalid_params, everything else internal_error
fn tool_error(e: AppError) -> McpError {
    match e {
        AppError::UnknownRecipe(_)
        | AppError::EmptySelection
        | AppError::NoComparableStore
        | AppError::ValidationFailure(_) => McpError::invalid_params(e.to_string(), None),
        _ => {
            tracing::error!(error = %e, "Tool failed");
            McpError::internal_error(e.public_message(), None)
        }
    }
}

fn to_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Response Structs
// ============================================================================

#[derive(Debug, Serialize)]
struct SelectionResponse {
    message: String,
    recipe_ids: Vec<i64>,
    /// Selected recipes that were deleted in the meantime
    #[serde(skip_serializing_if = "Vec::is_empty")]
    removed_recipe_ids: Vec<i64>,
    shopping_list: SelectionShoppingList,
}

// ============================================================================
// Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecipeIdParams {
    /// Recipe ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRecipeParams {
    /// Name of the recipe
    pub name: String,
    /// Ingredient name to quantity, e.g. {"flour": 200, "eggs": 2}
    #[serde(default)]
    pub ingredients: Ingredients,
    #[serde(default)]
    pub instructions: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CalculateShoppingListParams {
    /// Recipes to combine; duplicates are ignored
    pub recipe_ids: Vec<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PostcodeParams {
    /// UK postcode, e.g. "NE26 1AA"
    pub postcode: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRecipesParams {
    pub query: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GenerateRecipeParams {
    /// Name of the dish to generate
    pub name: String,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl BasketService {
    // --- Status ---

    #[tool(description = "Get the current status of the Basket service including build info, database status and recipe/store counts")]
    fn basket_status(&self) -> Result<CallToolResult, McpError> {
        let status = self
            .state
            .status
            .get_status(&self.state.database, self.state.generator.is_some())
            .map_err(tool_error)?;
        to_result(&status)
    }

    // --- Recipes ---

    #[tool(description = "List every stored recipe with its ingredients")]
    fn list_recipes(&self) -> Result<CallToolResult, McpError> {
        let result = recipes::list_recipes(&self.state.database).map_err(tool_error)?;
        to_result(&result)
    }

    #[tool(description = "Get a recipe by ID")]
    fn get_recipe(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::get_recipe(&self.state.database, p.id).map_err(tool_error)?;
        to_result(&result)
    }

    #[tool(description = "Create a recipe from a name, an ingredient map of name to quantity, and instructions")]
    fn create_recipe(&self, Parameters(p): Parameters<CreateRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeCreate {
            name: p.name,
            ingredients: p.ingredients,
            instructions: p.instructions,
        };
        let result = recipes::create_recipe(&self.state.database, data).map_err(tool_error)?;
        to_result(&result)
    }

    #[tool(description = "Delete a recipe. If it was selected, it is dropped from the selection and the shopping list is recomputed without it.")]
    fn delete_recipe(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        let mut selection = self.selection()?;
        let result = recipes::delete_selected_recipe(&self.state.database, &mut selection, p.id)
            .map_err(tool_error)?;
        to_result(&result)
    }

    #[tool(description = "Search recipes. With a recipe generator configured, new suggestions are generated and stored; otherwise stored recipes are matched by recipe or ingredient name.")]
    async fn search_recipes(&self, Parameters(p): Parameters<SearchRecipesParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::search_recipes(&self.state, &p.query)
            .await
            .map_err(tool_error)?;
        to_result(&result)
    }

    #[tool(description = "Generate a recipe by name with the configured recipe generator and store it")]
    async fn generate_recipe(&self, Parameters(p): Parameters<GenerateRecipeParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::generate_recipe(&self.state, &p.name)
            .await
            .map_err(tool_error)?;
        to_result(&result)
    }

    // --- Stores ---

    #[tool(description = "List every store with its address, coordinates and price list")]
    fn list_stores(&self) -> Result<CallToolResult, McpError> {
        let result = stores::list_stores(&self.state.database).map_err(tool_error)?;
        to_result(&result)
    }

    #[tool(description = "Replace all stores with the built-in sample stores and their prices")]
    fn initialize_stores(&self) -> Result<CallToolResult, McpError> {
        let result = stores::initialize_stores(&self.state.database).map_err(tool_error)?;
        to_result(&result)
    }

    #[tool(description = "Find stores nearest to a UK postcode, sorted by distance in km")]
    async fn find_nearest_stores(&self, Parameters(p): Parameters<PostcodeParams>) -> Result<CallToolResult, McpError> {
        let result = stores::find_nearest_stores(
            &self.state.database,
            self.state.geocoder.as_ref(),
            &p.postcode,
        )
        .await
        .map_err(tool_error)?;
        to_result(&result)
    }

    // --- Shopping List ---

    #[tool(description = "Merge the ingredients of the given recipes and price the list at every store, naming the cheapest")]
    fn calculate_shopping_list(&self, Parameters(p): Parameters<CalculateShoppingListParams>) -> Result<CallToolResult, McpError> {
        let result = shopping::calculate_shopping_list(&self.state.database, &p.recipe_ids)
            .map_err(tool_error)?;
        to_result(&result)
    }

    #[tool(description = "Add a recipe to this session's selection and return the recomputed shopping list")]
    fn select_recipe(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        let recipe = recipes::get_recipe(&self.state.database, p.id).map_err(tool_error)?;
        self.change_selection(|selection| {
            if selection.select(recipe.id) {
                format!("Selected {}", recipe.name)
            } else {
                format!("{} was already selected", recipe.name)
            }
        })
    }

    #[tool(description = "Remove a recipe from this session's selection and return the recomputed shopping list")]
    fn deselect_recipe(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        self.change_selection(|selection| {
            if selection.deselect(p.id) {
                format!("Deselected recipe {}", p.id)
            } else {
                format!("Recipe {} was not selected", p.id)
            }
        })
    }

    #[tool(description = "Tick or untick a recipe, like a checkbox, and return the recomputed shopping list")]
    fn toggle_recipe(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        let recipe = recipes::get_recipe(&self.state.database, p.id).map_err(tool_error)?;
        self.change_selection(|selection| {
            if selection.toggle(recipe.id) {
                format!("Selected {}", recipe.name)
            } else {
                format!("Deselected {}", recipe.name)
            }
        })
    }

    #[tool(description = "Clear this session's recipe selection")]
    fn clear_selection(&self) -> Result<CallToolResult, McpError> {
        self.change_selection(|selection| {
            selection.clear();
            "Selection cleared".to_string()
        })
    }

    #[tool(description = "Shopping list for the recipes selected in this session, or a prompt when none are selected. Recipes deleted since they were selected are dropped.")]
    fn selection_shopping_list(&self) -> Result<CallToolResult, McpError> {
        self.change_selection(|selection| format!("{} recipes selected", selection.len()))
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for BasketService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "basket".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Basket".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Basket - recipe shopping lists priced across stores. \
                 Recipes: list/get/create/delete_recipe, search_recipes, generate_recipe. \
                 Stores: list_stores, initialize_stores (loads sample stores), find_nearest_stores. \
                 Shopping: calculate_shopping_list for explicit recipe IDs, or build a selection with \
                 select_recipe/deselect_recipe/toggle_recipe/clear_selection and read it with selection_shopping_list. \
                 Stores missing an ingredient are left out of the comparison and listed under unpriced_stores."
                    .into(),
            ),
        }
    }
}
