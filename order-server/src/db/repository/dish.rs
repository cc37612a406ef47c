//! Dish Repository (read-only lookups)

use super::RepoResult;
use shared::models::{Dish, Ingredient, split_pictures};
use sqlx::SqlitePool;

/// Raw dish row; pictures are stored as one comma separated column
#[derive(sqlx::FromRow)]
struct DishRow {
    id: i64,
    client_id: i64,
    name: String,
    description: String,
    price: f64,
    available: bool,
    pictures: String,
}

impl DishRow {
    fn into_dish(self, ingredients: Vec<Ingredient>) -> Dish {
        Dish {
            id: self.id,
            client_id: self.client_id,
            name: self.name,
            description: self.description,
            price: self.price,
            available: self.available,
            pictures: split_pictures(&self.pictures),
            ingredients,
        }
    }
}

/// Dish with its ingredients, `None` if the dish does not exist
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Dish>> {
    let row = sqlx::query_as::<_, DishRow>(
        "SELECT id, client_id, name, description, price, available, pictures FROM dish WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let ingredients = find_ingredients(pool, id).await?;
    Ok(Some(row.into_dish(ingredients)))
}

pub async fn find_ingredients(pool: &SqlitePool, dish_id: i64) -> RepoResult<Vec<Ingredient>> {
    let rows = sqlx::query_as::<_, Ingredient>(
        "SELECT id, dish_id, name, active, price FROM ingredient WHERE dish_id = ? ORDER BY id",
    )
    .bind(dish_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_ingredient(pool: &SqlitePool, id: i64) -> RepoResult<Option<Ingredient>> {
    let row = sqlx::query_as::<_, Ingredient>(
        "SELECT id, dish_id, name, active, price FROM ingredient WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support;

    #[tokio::test]
    async fn test_dish_with_pictures_and_ingredients() {
        let pool = test_support::pool().await;
        test_support::insert_dish(&pool, 1, 7, "Soup", "soup.png,soup-2.png").await;
        test_support::insert_ingredient(&pool, 10, 1, "Onion").await;
        test_support::insert_ingredient(&pool, 11, 1, "Garlic").await;

        let dish = find_by_id(&pool, 1).await.unwrap().unwrap();
        assert_eq!(dish.name, "Soup");
        assert_eq!(dish.pictures, vec!["soup.png", "soup-2.png"]);
        assert_eq!(dish.first_picture(), "soup.png");
        let names: Vec<_> = dish.ingredients.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Onion", "Garlic"]);
    }

    #[tokio::test]
    async fn test_missing_dish_and_ingredient() {
        let pool = test_support::pool().await;
        assert!(find_by_id(&pool, 99).await.unwrap().is_none());
        assert!(find_ingredient(&pool, 99).await.unwrap().is_none());
    }
}
