//! Reference Data Model
//!
//! Priced catalogue rows (device, product, installation, room, aging). Managed
//! elsewhere; the order pipeline only reads them.

use serde::{Deserialize, Serialize};

/// A priced catalogue item as seen at lookup time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PricedItem {
    pub id: i64,
    pub name: String,
    /// Unit price in currency unit
    pub price: f64,
}

impl PricedItem {
    pub fn new(id: i64, name: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            name: name.into(),
            price,
        }
    }
}
