//! Recipe model
//!
//! A recipe is a named ingredient -> quantity map plus free-text instructions.
//! Ingredients live in `recipe_ingredients` and are loaded alongside the recipe.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// Ingredient name -> quantity (unit-less)
pub type Ingredients = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub ingredients: Ingredients,
    pub instructions: String,
    pub created_at: String,
}

/// Data for creating a new recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCreate {
    pub name: String,
    #[serde(default)]
    pub ingredients: Ingredients,
    #[serde(default)]
    pub instructions: String,
}

impl RecipeCreate {
    /// Check the submission before it touches the database.
    /// Returns a human readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Recipe name cannot be empty".to_string());
        }

        for (ingredient, quantity) in &self.ingredients {
            if ingredient.trim().is_empty() {
                return Err("Ingredient names cannot be empty".to_string());
            }
            if !quantity.is_finite() || *quantity < 0.0 {
                return Err(format!(
                    "Quantity for '{}' must be a non-negative number",
                    ingredient
                ));
            }
        }

        Ok(())
    }
}

/// Header row without ingredients
struct RecipeRow {
    id: i64,
    name: String,
    instructions: String,
    created_at: String,
}

impl RecipeRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            instructions: row.get("instructions")?,
            created_at: row.get("created_at")?,
        })
    }

    fn with_ingredients(self, conn: &Connection) -> DbResult<Recipe> {
        let ingredients = Recipe::load_ingredients(conn, self.id)?;
        Ok(Recipe {
            id: self.id,
            name: self.name,
            ingredients,
            instructions: self.instructions,
            created_at: self.created_at,
        })
    }
}

impl Recipe {
    /// Insert a new recipe and its ingredients in one transaction
    pub fn create(conn: &mut Connection, data: &RecipeCreate) -> DbResult<Self> {
        let created_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO recipes (name, instructions, created_at) VALUES (?1, ?2, ?3)",
            params![data.name.trim(), data.instructions, created_at],
        )?;
        let id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO recipe_ingredients (recipe_id, name, quantity) VALUES (?1, ?2, ?3)",
            )?;
            for (name, quantity) in &data.ingredients {
                stmt.execute(params![id, name, quantity])?;
            }
        }

        tx.commit()?;

        Self::get_by_id(conn, id)?
            .ok_or_else(|| crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let row = conn
            .query_row(
                "SELECT id, name, instructions, created_at FROM recipes WHERE id = ?1",
                [id],
                RecipeRow::from_row,
            )
            .optional()?;

        match row {
            Some(row) => Ok(Some(row.with_ingredients(conn)?)),
            None => Ok(None),
        }
    }

    /// All recipes, oldest first
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT id, name, instructions, created_at FROM recipes ORDER BY id ASC")?;
        let rows = stmt
            .query_map([], RecipeRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|row| row.with_ingredients(conn))
            .collect()
    }

    /// Case-insensitive substring search over recipe and ingredient names
    pub fn search(conn: &Connection, query: &str) -> DbResult<Vec<Self>> {
        let pattern = format!("%{}%", escape_like(query.trim()));
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT r.id, r.name, r.instructions, r.created_at
            FROM recipes r
            LEFT JOIN recipe_ingredients ri ON ri.recipe_id = r.id
            WHERE r.name LIKE ?1 ESCAPE '\' OR ri.name LIKE ?1 ESCAPE '\'
            ORDER BY r.id ASC
            "#,
        )?;
        let rows = stmt
            .query_map([pattern], RecipeRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|row| row.with_ingredients(conn))
            .collect()
    }

    pub fn count(conn: &Connection) -> DbResult<i64> {
        Ok(conn.query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?)
    }

    pub fn exists(conn: &Connection, id: i64) -> DbResult<bool> {
        Ok(conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM recipes WHERE id = ?1)",
            [id],
            |row| row.get(0),
        )?)
    }

    /// Delete a recipe; ingredients cascade.
    /// Returns Ok(false) if no recipe had that id.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    fn load_ingredients(conn: &Connection, recipe_id: i64) -> DbResult<Ingredients> {
        let mut stmt = conn.prepare(
            "SELECT name, quantity FROM recipe_ingredients WHERE recipe_id = ?1 ORDER BY name",
        )?;
        let ingredients = stmt
            .query_map([recipe_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Ingredients, _>>()?;
        Ok(ingredients)
    }
}

/// Make `%`, `_` and `\` match literally inside a LIKE pattern
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::temp_database;

    fn pancakes() -> RecipeCreate {
        RecipeCreate {
            name: "Pancakes".to_string(),
            ingredients: BTreeMap::from([
                ("flour".to_string(), 200.0),
                ("eggs".to_string(), 2.0),
                ("milk".to_string(), 300.0),
            ]),
            instructions: "Whisk, rest, fry.".to_string(),
        }
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let mut data = pancakes();
        data.name = "   ".to_string();
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_quantity() {
        let mut data = pancakes();
        data.ingredients.insert("sugar".to_string(), -5.0);
        let err = data.validate().unwrap_err();
        assert!(err.contains("sugar"));
    }

    #[test]
    fn test_validate_rejects_nan_quantity() {
        let mut data = pancakes();
        data.ingredients.insert("salt".to_string(), f64::NAN);
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_create_and_get() {
        let (_dir, db) = temp_database();
        let created = db.with_conn_mut(|conn| Recipe::create(conn, &pancakes())).unwrap();

        assert_eq!(created.name, "Pancakes");
        assert_eq!(created.ingredients.len(), 3);
        assert_eq!(created.ingredients["flour"], 200.0);

        let fetched = db
            .with_conn(|conn| Recipe::get_by_id(conn, created.id))
            .unwrap()
            .unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_ingredient_names_keep_their_case() {
        let (_dir, db) = temp_database();
        let data = RecipeCreate {
            name: "Mixed case".to_string(),
            ingredients: BTreeMap::from([("Flour".to_string(), 1.0), ("flour".to_string(), 2.0)]),
            instructions: String::new(),
        };
        let created = db.with_conn_mut(|conn| Recipe::create(conn, &data)).unwrap();
        assert_eq!(created.ingredients.len(), 2);
    }

    #[test]
    fn test_delete_cascades_ingredients() {
        let (_dir, db) = temp_database();
        let created = db.with_conn_mut(|conn| Recipe::create(conn, &pancakes())).unwrap();

        assert!(db.with_conn(|conn| Recipe::delete(conn, created.id)).unwrap());
        assert!(!db.with_conn(|conn| Recipe::delete(conn, created.id)).unwrap());

        let leftover: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM recipe_ingredients", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(leftover, 0);
    }

    #[test]
    fn test_search_matches_recipe_and_ingredient_names() {
        let (_dir, db) = temp_database();
        db.with_conn_mut(|conn| Recipe::create(conn, &pancakes())).unwrap();
        db.with_conn_mut(|conn| {
            Recipe::create(
                conn,
                &RecipeCreate {
                    name: "Omelette".to_string(),
                    ingredients: BTreeMap::from([("eggs".to_string(), 3.0)]),
                    instructions: String::new(),
                },
            )
        })
        .unwrap();

        let by_name = db.with_conn(|conn| Recipe::search(conn, "pancake")).unwrap();
        assert_eq!(by_name.len(), 1);

        let by_ingredient = db.with_conn(|conn| Recipe::search(conn, "EGGS")).unwrap();
        assert_eq!(by_ingredient.len(), 2);

        let none = db.with_conn(|conn| Recipe::search(conn, "saffron")).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let (_dir, db) = temp_database();
        let rye = RecipeCreate {
            name: "100% Rye".to_string(),
            ingredients: BTreeMap::from([("rye_flour".to_string(), 500.0)]),
            instructions: String::new(),
        };
        db.with_conn_mut(|conn| Recipe::create(conn, &rye)).unwrap();
        db.with_conn_mut(|conn| Recipe::create(conn, &pancakes())).unwrap();

        let percent = db.with_conn(|conn| Recipe::search(conn, "%")).unwrap();
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].name, "100% Rye");

        let underscore = db.with_conn(|conn| Recipe::search(conn, "_")).unwrap();
        assert_eq!(underscore.len(), 1);

        let backslash = db.with_conn(|conn| Recipe::search(conn, "\\")).unwrap();
        assert!(backslash.is_empty());
    }

    #[test]
    fn test_exists() {
        let (_dir, db) = temp_database();
        let created = db.with_conn_mut(|conn| Recipe::create(conn, &pancakes())).unwrap();
        assert!(db.with_conn(|conn| Recipe::exists(conn, created.id)).unwrap());
        assert!(!db.with_conn(|conn| Recipe::exists(conn, created.id + 1)).unwrap());
    }
}
