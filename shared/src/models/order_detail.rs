//! Order Detail Model (line-item snapshot)

use serde::{Deserialize, Serialize};

/// Priced component kind, also the `order_details.item_type` column
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum ItemType {
    Device,
    Product,
    Installation,
    Room,
    Aging,
}

impl ItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Device => "device",
            ItemType::Product => "product",
            ItemType::Installation => "installation",
            ItemType::Room => "room",
            ItemType::Aging => "aging",
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order detail row (一行 `order_details`)
///
/// `amount` is the unit price at order time. For the room line `quantity` is the
/// raw room quantity, not the priced multiplier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderDetail {
    pub id: i64,
    pub order_id: i64,
    pub item_type: ItemType,
    pub item_id: i64,
    /// Component name at order time
    pub description: String,
    pub amount: f64,
    pub quantity: i64,
    /// 1 = active, 0 = soft-deleted
    pub status: i64,
    pub project_id: i64,
    pub created_at: i64,
    pub created_by: String,
    pub updated_at: i64,
    pub last_update_by: String,
    pub deleted_at: Option<i64>,
}

/// Detail row before persistence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDetailDraft {
    pub item_type: ItemType,
    pub item_id: i64,
    pub description: String,
    pub amount: f64,
    pub quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_type_strings_match_serde() {
        for (kind, expected) in [
            (ItemType::Device, "device"),
            (ItemType::Product, "product"),
            (ItemType::Installation, "installation"),
            (ItemType::Room, "room"),
            (ItemType::Aging, "aging"),
        ] {
            assert_eq!(kind.as_str(), expected);
            assert_eq!(
                serde_json::to_string(&kind).unwrap(),
                format!("\"{expected}\"")
            );
        }
    }
}
