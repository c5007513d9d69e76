//! Basket Library
//!
//! Recipe shopping lists merged across recipes and priced at every store.

pub mod build_info;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod mcp;
pub mod models;
pub mod pricing;
pub mod selection;
pub mod services;
pub mod state;
pub mod tools;
