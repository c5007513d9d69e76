//! Utility to load the sample stores into the database

use basket::config::Config;
use basket::db::Database;
use basket::tools::stores;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    println!("Database path: {}", config.database_path.display());

    let database = Database::open(&config.database_path)?;
    let result = stores::initialize_stores(&database)?;
    println!("{} ({} stores)", result.message, result.stores_created);

    for store in stores::list_stores(&database)? {
        println!("  #{} {} - {}, {}", store.id, store.name, store.address, store.postcode);
    }

    Ok(())
}
