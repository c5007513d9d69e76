//! Shopping-list aggregation
//!
//! Merges ingredient quantities across recipes, prices the merged list at each
//! store and picks the cheapest store. Everything here is pure: callers resolve
//! recipe ids and load stores first.
//!
//! A store that has no price for one of the listed ingredients is excluded from
//! the comparison. Its partial cost is still returned, together with the names
//! it could not price, so the caller can report why it was left out.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::{Recipe, Store};

/// Ingredient name -> total quantity across the selected recipes
pub type ShoppingList = BTreeMap<String, f64>;

/// Cost of a shopping list at one store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreCost {
    pub store_id: i64,
    pub store_name: String,
    /// Ingredient name -> quantity * unit price, priced ingredients only
    pub items: BTreeMap<String, f64>,
    /// Ingredients the store has no price for
    pub missing: Vec<String>,
    pub total: f64,
}

impl StoreCost {
    /// True when every ingredient on the list was priced
    pub fn is_comparable(&self) -> bool {
        self.missing.is_empty()
    }
}

/// The winning store of a comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheapestStore {
    pub store_id: i64,
    pub store_name: String,
    pub total: f64,
}

/// Full result of one aggregation request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub shopping_list: ShoppingList,
    pub store_costs: Vec<StoreCost>,
    pub cheapest: CheapestStore,
}

/// Sum quantities per exact ingredient name across all recipes
pub fn merge_ingredients<'a, I>(recipes: I) -> AppResult<ShoppingList>
where
    I: IntoIterator<Item = &'a Recipe>,
{
    let mut recipes = recipes.into_iter().peekable();
    if recipes.peek().is_none() {
        return Err(AppError::EmptySelection);
    }

    let mut list = ShoppingList::new();
    for recipe in recipes {
        for (ingredient, quantity) in &recipe.ingredients {
            *list.entry(ingredient.clone()).or_insert(0.0) += quantity;
        }
    }

    if let Some((ingredient, _)) = list.iter().find(|(_, quantity)| !quantity.is_finite()) {
        return Err(AppError::ValidationFailure(format!(
            "Combined quantity of {} is too large",
            ingredient
        )));
    }

    Ok(list)
}

/// Price every ingredient of the list against the store's price list
pub fn price_against_store(list: &ShoppingList, store: &Store) -> StoreCost {
    let mut items = BTreeMap::new();
    let mut missing = Vec::new();

    for (ingredient, quantity) in list {
        match store.prices.get(ingredient) {
            Some(unit_price) => {
                items.insert(ingredient.clone(), quantity * unit_price);
            }
            None => missing.push(ingredient.clone()),
        }
    }

    let total = items.values().sum();

    StoreCost {
        store_id: store.id,
        store_name: store.name.clone(),
        items,
        missing,
        total,
    }
}

/// Lowest total among comparable stores; equal totals go to the lower store id
pub fn cheapest_store(costs: &[StoreCost]) -> AppResult<CheapestStore> {
    costs
        .iter()
        .filter(|cost| cost.is_comparable())
        .min_by(|a, b| {
            a.total
                .total_cmp(&b.total)
                .then_with(|| a.store_id.cmp(&b.store_id))
        })
        .map(|cost| CheapestStore {
            store_id: cost.store_id,
            store_name: cost.store_name.clone(),
            total: cost.total,
        })
        .ok_or(AppError::NoComparableStore)
}

/// Merge, price at every store and pick the cheapest.
/// An empty selection fails before any store is priced.
pub fn calculate(recipes: &[Recipe], stores: &[Store]) -> AppResult<Aggregate> {
    let shopping_list = merge_ingredients(recipes)?;

    let store_costs: Vec<StoreCost> = stores
        .iter()
        .map(|store| price_against_store(&shopping_list, store))
        .collect();

    if let Some(cost) = store_costs.iter().find(|cost| !cost.total.is_finite()) {
        return Err(AppError::ValidationFailure(format!(
            "Shopping list is too large to price at {}",
            cost.store_name
        )));
    }

    let cheapest = cheapest_store(&store_costs)?;

    Ok(Aggregate {
        shopping_list,
        store_costs,
        cheapest,
    })
}
