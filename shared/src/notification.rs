//! Realtime notifications pushed to kitchen and floor displays
//!
//! A [`Notification`] is never stored. It is built by an HTTP action, queued on
//! the event bus and delivered to every connection of its target client.
//!
//! Wire shape:
//!
//! ```json
//! {
//!   "type": 0,
//!   "message": "Table #3 calls the waiter",
//!   "picture": "",
//!   "date": "2024-05-01T12:00:00Z",
//!   "clientId": 7,
//!   "active": true,
//!   "table": { "id": 3, "number": 3, "type": "table", ... }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{DiningTable, Dish};

/// Notification kind, serialized as its numeric value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum NotificationType {
    CallWaiter = 0,
    GetCheck = 1,
    MakeOrder = 2,
    Connected = 3,
}

impl From<NotificationType> for u8 {
    fn from(t: NotificationType) -> Self {
        t as u8
    }
}

/// Error when converting from an unknown numeric notification type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidNotificationType(pub u8);

impl fmt::Display for InvalidNotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid notification type: {}", self.0)
    }
}

impl std::error::Error for InvalidNotificationType {}

impl TryFrom<u8> for NotificationType {
    type Error = InvalidNotificationType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::CallWaiter),
            1 => Ok(Self::GetCheck),
            2 => Ok(Self::MakeOrder),
            3 => Ok(Self::Connected),
            _ => Err(InvalidNotificationType(value)),
        }
    }
}

/// A client-scoped realtime event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub message: String,
    pub picture: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "clientId")]
    pub client_id: i64,
    pub active: bool,
    pub table: Option<DiningTable>,
}

impl Notification {
    fn build(
        kind: NotificationType,
        client_id: i64,
        message: String,
        picture: String,
        table: Option<DiningTable>,
    ) -> Self {
        Self {
            kind,
            message,
            picture,
            date: Utc::now(),
            client_id,
            active: true,
            table,
        }
    }

    /// Waiter call from a table, delivered to the table's client
    pub fn call_waiter(table: DiningTable) -> Self {
        let message = format!("{} calls the waiter", table.display_name());
        Self::build(
            NotificationType::CallWaiter,
            table.client_id,
            message,
            String::new(),
            Some(table),
        )
    }

    /// Bill request from a table, delivered to the table's client
    pub fn get_check(table: DiningTable) -> Self {
        let message = format!("{} requests the bill", table.display_name());
        Self::build(
            NotificationType::GetCheck,
            table.client_id,
            message,
            String::new(),
            Some(table),
        )
    }

    /// New item on an order
    ///
    /// The table suffix is only added when the order's table could be resolved.
    pub fn make_order(client_id: i64, dish: &Dish, table: Option<DiningTable>) -> Self {
        let message = match &table {
            Some(t) => format!("Order received, {}, {}", dish.name, t.display_name()),
            None => format!("Order received, {}", dish.name),
        };
        Self::build(
            NotificationType::MakeOrder,
            client_id,
            message,
            dish.first_picture().to_string(),
            table,
        )
    }

    /// Acknowledgement sent to a freshly opened connection
    pub fn connected(client_id: i64) -> Self {
        Self::build(
            NotificationType::Connected,
            client_id,
            "Connected".to_string(),
            String::new(),
            None,
        )
    }
}
