//! MCP server over stdio

mod server;

pub use server::BasketService;
