//! Store Tools
//!
//! Listing, (re)initialising and distance search over stores.

use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{PriceList, Store, StoreCreate};
use crate::pricing::{haversine_km, round2};
use crate::services::Geocoder;

/// Response for initialize_stores
#[derive(Debug, Serialize)]
pub struct InitializeStoresResponse {
    pub message: String,
    pub stores_created: usize,
}

/// A store with its distance from the searched postcode
#[derive(Debug, Clone, Serialize)]
pub struct NearbyStore {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub postcode: String,
    /// Kilometres, rounded to 2 decimal places
    pub distance: f64,
    pub prices: PriceList,
}

/// Response for find_nearest_stores
#[derive(Debug, Serialize)]
pub struct NearestStoresResponse {
    pub stores: Vec<NearbyStore>,
}

pub fn list_stores(db: &Database) -> AppResult<Vec<Store>> {
    Ok(db.with_conn(Store::list)?)
}

/// Replace every store with the built-in sample set
pub fn initialize_stores(db: &Database) -> AppResult<InitializeStoresResponse> {
    let stores = sample_stores();
    let stores_created = db.with_conn_mut(|conn| Store::replace_all(conn, &stores))?;
    info!(stores_created, "Stores initialized");

    Ok(InitializeStoresResponse {
        message: "Stores initialized successfully".to_string(),
        stores_created,
    })
}

/// Stores with known coordinates, nearest to the postcode first
pub async fn find_nearest_stores(
    db: &Database,
    geocoder: &dyn Geocoder,
    postcode: &str,
) -> AppResult<NearestStoresResponse> {
    let postcode = postcode.trim();
    if postcode.is_empty() {
        return Err(AppError::ValidationFailure("Postcode is required".to_string()));
    }

    let origin = geocoder.locate(postcode).await?;
    let stores = list_stores(db)?;

    Ok(NearestStoresResponse {
        stores: rank_by_distance(origin, stores),
    })
}

/// Drop stores without coordinates and sort the rest by distance from `origin`
pub fn rank_by_distance(origin: (f64, f64), stores: Vec<Store>) -> Vec<NearbyStore> {
    let mut nearby: Vec<NearbyStore> = stores
        .into_iter()
        .filter_map(|store| {
            let position = store.coordinates()?;
            Some(NearbyStore {
                id: store.id,
                name: store.name,
                address: store.address,
                postcode: store.postcode,
                distance: round2(haversine_km(origin, position)),
                prices: store.prices,
            })
        })
        .collect();

    nearby.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.id.cmp(&b.id)));
    nearby
}

/// Ingredients every sample store stocks, in the order prices are given
const STAPLES: [&str; 9] = [
    "all-purpose flour",
    "baking soda",
    "brown sugar",
    "eggs",
    "granulated sugar",
    "salt",
    "chocolate chips",
    "unsalted butter",
    "vanilla extract",
];

/// Price list for the baking staples, in pounds
fn staples(prices: [f64; 9]) -> PriceList {
    STAPLES
        .iter()
        .zip(prices)
        .map(|(ingredient, price)| (ingredient.to_string(), price))
        .collect()
}

fn sample_store(
    name: &str,
    address: &str,
    postcode: &str,
    position: (f64, f64),
    prices: PriceList,
) -> StoreCreate {
    StoreCreate {
        name: name.to_string(),
        address: address.to_string(),
        postcode: postcode.to_string(),
        latitude: Some(position.0),
        longitude: Some(position.1),
        prices,
    }
}

/// Five North East stores and one London store for comparison
pub fn sample_stores() -> Vec<StoreCreate> {
    vec![
        sample_store(
            "Tesco Extra Whitley Bay",
            "Newsteads Drive, Whitley Bay",
            "NE25 9UZ",
            (55.0478, -1.4827),
            staples([1.65, 0.80, 1.20, 2.40, 1.10, 0.60, 2.15, 2.65, 1.40]),
        ),
        sample_store(
            "Sainsbury's Whitley Bay",
            "Newsteads Drive, Whitley Bay",
            "NE25 9UT",
            (55.0475, -1.4830),
            staples([1.75, 0.85, 1.30, 2.60, 1.20, 0.65, 2.25, 2.75, 1.60]),
        ),
        sample_store(
            "Morrisons Whitley Bay",
            "Hillheads Road, Whitley Bay",
            "NE25 9UX",
            (55.0461, -1.4789),
            staples([1.60, 0.75, 1.15, 2.35, 1.05, 0.55, 2.10, 2.60, 1.30]),
        ),
        sample_store(
            "Tesco Metro Newcastle",
            "Clayton Street, Newcastle upon Tyne",
            "NE1 5PB",
            (54.9697, -1.6157),
            staples([1.70, 0.82, 1.22, 2.45, 1.12, 0.62, 2.20, 2.70, 1.45]),
        ),
        sample_store(
            "Sainsbury's Newcastle",
            "John Dobson Street, Newcastle upon Tyne",
            "NE1 8HL",
            (54.9741, -1.6120),
            staples([1.80, 0.87, 1.32, 2.65, 1.22, 0.67, 2.30, 2.80, 1.65]),
        ),
        sample_store(
            "Waitrose London",
            "200 Oxford Street, London",
            "W1D 1NU",
            (51.5152, -0.1449),
            staples([2.25, 1.15, 1.65, 3.25, 1.55, 0.85, 2.85, 3.25, 2.25]),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::temp_database;
    use async_trait::async_trait;

    /// Always answers with the same position
    struct FixedGeocoder((f64, f64));

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn locate(&self, _postcode: &str) -> AppResult<(f64, f64)> {
            Ok(self.0)
        }
    }

    struct UnknownPostcode;

    #[async_trait]
    impl Geocoder for UnknownPostcode {
        async fn locate(&self, _postcode: &str) -> AppResult<(f64, f64)> {
            Err(AppError::ValidationFailure(
                "Could not find location for the provided postcode".to_string(),
            ))
        }
    }

    #[test]
    fn test_sample_stores_price_the_same_staples() {
        let stores = sample_stores();
        assert_eq!(stores.len(), 6);
        for store in &stores {
            assert_eq!(store.prices.len(), 9);
            assert!(store.latitude.is_some() && store.longitude.is_some());
        }
    }

    #[test]
    fn test_initialize_stores_replaces_existing() {
        let (_dir, db) = temp_database();
        initialize_stores(&db).unwrap();
        let response = initialize_stores(&db).unwrap();
        assert_eq!(response.stores_created, 6);
        assert_eq!(list_stores(&db).unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_nearest_stores_sorted_by_distance() {
        let (_dir, db) = temp_database();
        initialize_stores(&db).unwrap();

        // Newcastle city centre
        let geocoder = FixedGeocoder((54.9738, -1.6132));
        let response = find_nearest_stores(&db, &geocoder, "NE1 7RU").await.unwrap();

        assert_eq!(response.stores.len(), 6);
        assert_eq!(response.stores[0].name, "Sainsbury's Newcastle");
        assert_eq!(response.stores[5].name, "Waitrose London");
        for pair in response.stores.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[tokio::test]
    async fn test_nearest_stores_requires_postcode() {
        let (_dir, db) = temp_database();
        let err = find_nearest_stores(&db, &FixedGeocoder((0.0, 0.0)), "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationFailure(_)));
    }

    #[tokio::test]
    async fn test_nearest_stores_unknown_postcode() {
        let (_dir, db) = temp_database();
        let err = find_nearest_stores(&db, &UnknownPostcode, "ZZ99 9ZZ")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not find location for the provided postcode"
        );
    }

    #[test]
    fn test_rank_skips_stores_without_coordinates() {
        let placed = Store {
            id: 1,
            name: "Placed".to_string(),
            address: String::new(),
            postcode: String::new(),
            latitude: Some(0.0),
            longitude: Some(1.0),
            prices: PriceList::new(),
        };
        let mut unplaced = placed.clone();
        unplaced.id = 2;
        unplaced.latitude = None;

        let ranked = rank_by_distance((0.0, 0.0), vec![unplaced, placed]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, 1);
        assert_eq!(ranked[0].distance, 111.19);
    }
}
