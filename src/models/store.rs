//! Store model
//!
//! A store has a location and a price list (ingredient name -> unit price).

use std::collections::BTreeMap;

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// Ingredient name -> unit price
pub type PriceList = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub postcode: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub prices: PriceList,
}

impl Store {
    /// Position as (latitude, longitude), if both are known
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// Data for creating a store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreCreate {
    pub name: String,
    pub address: String,
    pub postcode: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub prices: PriceList,
}

impl Store {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            address: row.get("address")?,
            postcode: row.get("postcode")?,
            latitude: row.get("latitude")?,
            longitude: row.get("longitude")?,
            prices: PriceList::new(),
        })
    }

    /// All stores ordered by id, price lists included
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, address, postcode, latitude, longitude FROM stores ORDER BY id ASC",
        )?;
        let mut stores = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut prices = conn.prepare(
            "SELECT store_id, ingredient, price FROM store_prices ORDER BY store_id, ingredient",
        )?;
        let rows = prices.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;

        let mut by_store: BTreeMap<i64, PriceList> = BTreeMap::new();
        for row in rows {
            let (store_id, ingredient, price) = row?;
            by_store.entry(store_id).or_default().insert(ingredient, price);
        }

        for store in &mut stores {
            if let Some(list) = by_store.remove(&store.id) {
                store.prices = list;
            }
        }

        Ok(stores)
    }

    pub fn count(conn: &Connection) -> DbResult<i64> {
        Ok(conn.query_row("SELECT COUNT(*) FROM stores", [], |row| row.get(0))?)
    }

    /// Remove every store and insert the given ones, atomically
    pub fn replace_all(conn: &mut Connection, stores: &[StoreCreate]) -> DbResult<usize> {
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM stores", [])?;

        {
            let mut insert_store = tx.prepare(
                "INSERT INTO stores (name, address, postcode, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            let mut insert_price = tx.prepare(
                "INSERT INTO store_prices (store_id, ingredient, price) VALUES (?1, ?2, ?3)",
            )?;

            for store in stores {
                insert_store.execute(params![
                    store.name,
                    store.address,
                    store.postcode,
                    store.latitude,
                    store.longitude,
                ])?;
                let store_id = tx.last_insert_rowid();

                for (ingredient, price) in &store.prices {
                    insert_price.execute(params![store_id, ingredient, price])?;
                }
            }
        }

        tx.commit()?;
        Ok(stores.len())
    }
}
