//! Pricing module
//!
//! Shopping-list aggregation, store distance and amount parsing.

pub mod aggregator;
pub mod amounts;
pub mod geo;

pub use aggregator::{
    calculate, cheapest_store, merge_ingredients, price_against_store, Aggregate, CheapestStore,
    ShoppingList, StoreCost,
};
pub use amounts::parse_amount;
pub use geo::{haversine_km, round2};
