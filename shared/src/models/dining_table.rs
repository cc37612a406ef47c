//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Kind of seat a table represents
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum TableKind {
    #[default]
    Table,
    Bar,
}

impl TableKind {
    /// Label used in notification messages
    pub fn label(&self) -> &'static str {
        match self {
            TableKind::Table => "Table",
            TableKind::Bar => "Bar",
        }
    }
}

/// Dining table entity (a table or a bar seat of one client)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiningTable {
    pub id: i64,
    pub client_id: i64,
    pub number: i64,
    #[serde(rename = "type")]
    pub kind: TableKind,
    pub available: bool,
    pub calls_waiter: bool,
    pub asks_for_bill: bool,
}

impl DiningTable {
    /// Stand-in used when an order references a table that no longer exists
    pub fn placeholder(id: i64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// "Table #3", "Bar #1"
    pub fn display_name(&self) -> String {
        format!("{} #{}", self.kind.label(), self.number)
    }
}

/// Table reference carried inside order payloads
///
/// Only the id is used; every other field sent by the client is ignored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TableRef {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_as_type() {
        let table = DiningTable {
            id: 3,
            client_id: 7,
            number: 3,
            kind: TableKind::Bar,
            available: true,
            calls_waiter: false,
            asks_for_bill: false,
        };
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["type"], "bar");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn test_display_name() {
        let mut table = DiningTable::placeholder(1);
        table.number = 12;
        assert_eq!(table.display_name(), "Table #12");
        table.kind = TableKind::Bar;
        assert_eq!(table.display_name(), "Bar #12");
    }

    #[test]
    fn test_table_ref_ignores_extra_fields() {
        let r: TableRef = serde_json::from_str(r#"{"id":4,"number":9,"type":"bar"}"#).unwrap();
        assert_eq!(r.id, 4);
    }
}
