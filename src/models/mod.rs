//! Data models
//!
//! Rust structs representing database entities.

mod recipe;
mod store;

pub use recipe::{Ingredients, Recipe, RecipeCreate};
pub use store::{PriceList, Store, StoreCreate};
