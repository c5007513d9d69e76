//! Shopping List Tools
//!
//! Resolves recipe ids, runs the aggregator and shapes its result for clients.

use std::collections::{BTreeMap, BTreeSet};

use rusqlite::Connection;
use serde::Serialize;

use crate::db::{Database, DbResult};
use crate::error::{AppError, AppResult};
use crate::models::{Recipe, Store};
use crate::pricing::{self, round2, Aggregate, ShoppingList};
use crate::selection::Selection;

/// Message shown instead of a shopping list when nothing is selected
pub const EMPTY_SELECTION_PROMPT: &str = "Please select at least one recipe";

/// Cost of the list at one store, money rounded to pennies
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreCostSummary {
    pub store_id: i64,
    pub items: BTreeMap<String, f64>,
    pub total: f64,
}

/// Response for calculate_shopping_list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingListResponse {
    pub shopping_list: ShoppingList,
    /// Stores that can price every ingredient, keyed by store name
    pub store_costs: BTreeMap<String, StoreCostSummary>,
    /// Stores left out of the comparison, with the ingredients they lack
    pub unpriced_stores: BTreeMap<String, Vec<String>>,
    pub cheapest_store: String,
    pub total_cost: f64,
}

impl From<Aggregate> for ShoppingListResponse {
    fn from(aggregate: Aggregate) -> Self {
        let mut store_costs = BTreeMap::new();
        let mut unpriced_stores = BTreeMap::new();
        let mut cheapest_store = aggregate.cheapest.store_name;

        for cost in aggregate.store_costs {
            let key = unique_key(&store_costs, &unpriced_stores, &cost.store_name, cost.store_id);
            if cost.store_id == aggregate.cheapest.store_id {
                cheapest_store = key.clone();
            }
            if cost.is_comparable() {
                store_costs.insert(
                    key,
                    StoreCostSummary {
                        store_id: cost.store_id,
                        items: cost.items.into_iter().map(|(k, v)| (k, round2(v))).collect(),
                        total: round2(cost.total),
                    },
                );
            } else {
                unpriced_stores.insert(key, cost.missing);
            }
        }

        Self {
            shopping_list: aggregate.shopping_list,
            store_costs,
            unpriced_stores,
            cheapest_store,
            total_cost: round2(aggregate.cheapest.total),
        }
    }
}

/// Store names are not unique; a repeated name gets its id appended
fn unique_key<A, B>(
    costs: &BTreeMap<String, A>,
    unpriced: &BTreeMap<String, B>,
    name: &str,
    store_id: i64,
) -> String {
    if costs.contains_key(name) || unpriced.contains_key(name) {
        format!("{} (#{})", name, store_id)
    } else {
        name.to_string()
    }
}

/// Shopping list for the current selection, or a prompt when it is empty
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SelectionShoppingList {
    Calculated(ShoppingListResponse),
    Prompt { message: String },
    Unavailable { error: String },
}

/// Load each distinct id; the first id that does not exist fails the request
pub fn resolve_recipes(conn: &Connection, recipe_ids: &[i64]) -> AppResult<Vec<Recipe>> {
    let distinct: BTreeSet<i64> = recipe_ids.iter().copied().collect();

    distinct
        .into_iter()
        .map(|id| Recipe::get_by_id(conn, id)?.ok_or(AppError::UnknownRecipe(id)))
        .collect()
}

/// Aggregate the given recipes and compare every store
pub fn calculate_shopping_list(db: &Database, recipe_ids: &[i64]) -> AppResult<ShoppingListResponse> {
    if recipe_ids.is_empty() {
        return Err(AppError::EmptySelection);
    }

    let conn = db.get_conn()?;
    let recipes = resolve_recipes(&conn, recipe_ids)?;
    let stores = Store::list(&conn)?;
    drop(conn);

    let aggregate = pricing::calculate(&recipes, &stores)?;
    tracing::debug!(
        recipes = recipes.len(),
        stores = stores.len(),
        cheapest = %aggregate.cheapest.store_name,
        "Calculated shopping list"
    );

    Ok(aggregate.into())
}

/// Selection list together with the ids dropped because their recipes are gone
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionOutcome {
    pub shopping_list: SelectionShoppingList,
    pub removed_recipe_ids: Vec<i64>,
}

/// Deselect recipes that no longer exist, returning their ids
pub fn prune_selection(db: &Database, selection: &mut Selection) -> AppResult<Vec<i64>> {
    let missing = db.with_conn(|conn| {
        selection
            .ids()
            .into_iter()
            .filter_map(|id| match Recipe::exists(conn, id) {
                Ok(true) => None,
                Ok(false) => Some(Ok(id)),
                Err(e) => Some(Err(e)),
            })
            .collect::<DbResult<Vec<i64>>>()
    })?;

    for id in &missing {
        selection.deselect(*id);
    }
    if !missing.is_empty() {
        tracing::info!(removed = ?missing, "Dropped deleted recipes from selection");
    }

    Ok(missing)
}

/// Recompute for a selection without turning an empty selection into an error.
/// Recipes deleted since they were selected are dropped first.
pub fn selection_shopping_list(
    db: &Database,
    selection: &mut Selection,
) -> AppResult<SelectionOutcome> {
    let removed_recipe_ids = prune_selection(db, selection)?;

    let shopping_list = if selection.is_empty() {
        SelectionShoppingList::Prompt {
            message: EMPTY_SELECTION_PROMPT.to_string(),
        }
    } else {
        match calculate_shopping_list(db, &selection.ids()) {
            Ok(list) => SelectionShoppingList::Calculated(list),
            Err(AppError::NoComparableStore) => SelectionShoppingList::Unavailable {
                error: AppError::NoComparableStore.to_string(),
            },
            Err(e) => return Err(e),
        }
    };

    Ok(SelectionOutcome {
        shopping_list,
        removed_recipe_ids,
    })
}
