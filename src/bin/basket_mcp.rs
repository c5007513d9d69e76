//! Basket MCP server
//!
//! Serves the Basket tools over stdio.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use basket::build_info;
use basket::config::Config;
use basket::mcp::BasketService;
use basket::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging must go to stderr; stdout carries the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("basket=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner("MCP");
    eprintln!("Starting MCP server on stdio...");

    let config = Config::from_env()?;
    eprintln!("Database path: {}", config.database_path.display());

    let state = AppState::from_config(&config)?;
    let service = BasketService::new(state);

    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
