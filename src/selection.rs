//! Recipe selection
//!
//! The set of recipes a session has ticked for its shopping list. A selection
//! is a set: selecting twice is a no-op, and ids come back in ascending order.

use std::collections::BTreeSet;

use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    recipe_ids: BTreeSet<i64>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the recipe was already selected
    pub fn select(&mut self, recipe_id: i64) -> bool {
        self.recipe_ids.insert(recipe_id)
    }

    /// Returns false if the recipe was not selected
    pub fn deselect(&mut self, recipe_id: i64) -> bool {
        self.recipe_ids.remove(&recipe_id)
    }

    /// Flip a recipe in or out; returns whether it is selected afterwards
    pub fn toggle(&mut self, recipe_id: i64) -> bool {
        if self.deselect(recipe_id) {
            false
        } else {
            self.select(recipe_id)
        }
    }

    pub fn clear(&mut self) {
        self.recipe_ids.clear();
    }

    pub fn contains(&self, recipe_id: i64) -> bool {
        self.recipe_ids.contains(&recipe_id)
    }

    pub fn is_empty(&self) -> bool {
        self.recipe_ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.recipe_ids.len()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.recipe_ids.iter().copied().collect()
    }
}
