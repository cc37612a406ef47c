//! Orders, their items and the chosen ingredients
//!
//! An order belongs to one client and one table. Items are appended to it over
//! time; each item records which ingredients of its dish were selected.

use serde::{Deserialize, Serialize};

use super::dining_table::{DiningTable, TableRef};
use super::dish::{Dish, DishRef, Ingredient};

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub client_id: i64,
    pub table_id: i64,
    pub canceled: bool,
    pub created_at: i64,
    pub updated_at: i64,

    // filled in by the store after the row is read
    #[cfg_attr(feature = "db", sqlx(skip))]
    pub table: Option<DiningTable>,
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// One line of an order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub mount: i64,
    pub active: bool,
    pub ready: bool,
    pub dish_id: i64,
    pub takeaway: bool,
    pub created_at: i64,

    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dish: Option<Dish>,
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub selected_ingredients: Vec<IngredientSelection>,
}

/// Ingredient chosen (or explicitly removed) on an item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct IngredientSelection {
    pub id: i64,
    pub item_id: i64,
    pub ingredient_id: i64,
    pub active: bool,

    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredient: Option<Ingredient>,
}

/// Create order payload
///
/// Either `table_id` or an inlined `table` must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderCreate {
    pub client_id: Option<i64>,
    pub table_id: Option<i64>,
    pub table: Option<TableRef>,
}

impl OrderCreate {
    /// Table id after resolving the inlined table reference
    pub fn resolved_table_id(&self) -> Option<i64> {
        self.table.map(|t| t.id).or(self.table_id)
    }
}

/// Update order payload. Only `canceled` is writable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub canceled: Option<bool>,
}

/// Add item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCreate {
    pub dish_id: Option<i64>,
    pub dish: Option<DishRef>,
    #[serde(default = "default_mount")]
    pub mount: i64,
    #[serde(default)]
    pub takeaway: bool,
    #[serde(default)]
    pub ready: bool,
    /// Ingredients of the dish as presented to the guest, with their selection state
    #[serde(default)]
    pub ingredients: Vec<IngredientChoice>,
}

impl ItemCreate {
    /// Dish id after stripping the embedded dish down to its id
    pub fn resolved_dish_id(&self) -> Option<i64> {
        self.dish.map(|d| d.id).or(self.dish_id)
    }
}

fn default_mount() -> i64 {
    1
}

/// Ingredient entry on an add-item payload
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IngredientChoice {
    pub id: i64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}
