//! Dish Model

use serde::{Deserialize, Serialize};

/// Dish entity (read-only for the order server)
///
/// `pictures` is persisted as a single comma separated column and split on read.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dish {
    pub id: i64,
    pub client_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub available: bool,
    #[serde(default)]
    pub pictures: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

impl Dish {
    /// First picture, or an empty string when the dish has none
    pub fn first_picture(&self) -> &str {
        self.pictures.first().map(String::as_str).unwrap_or_default()
    }
}

/// Ingredient offered on a dish
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Ingredient {
    pub id: i64,
    pub dish_id: i64,
    pub name: String,
    pub active: bool,
    pub price: f64,
}

/// Dish reference carried inside item payloads
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DishRef {
    pub id: i64,
}

/// Split the stored picture column into its entries
pub fn split_pictures(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pictures() {
        assert_eq!(
            split_pictures("soup.png, soup-2.png"),
            vec!["soup.png".to_string(), "soup-2.png".to_string()]
        );
        assert!(split_pictures("").is_empty());
        assert!(split_pictures(" , ").is_empty());
    }

    #[test]
    fn test_first_picture() {
        let mut dish = Dish::default();
        assert_eq!(dish.first_picture(), "");
        dish.pictures = vec!["a.png".into(), "b.png".into()];
        assert_eq!(dish.first_picture(), "a.png");
    }
}
