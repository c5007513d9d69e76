//! Basket Tools module
//!
//! Operations shared by the HTTP API and the MCP server.

pub mod recipes;
pub mod shopping;
pub mod status;
pub mod stores;
