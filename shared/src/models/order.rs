//! Order Model

use serde::{Deserialize, Serialize};

/// Order payment lifecycle status (stored as INTEGER 0..=3)
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[repr(i32)]
pub enum OrderStatus {
    #[default]
    Created = 0,
    Pending = 1,
    Paid = 2,
    Failed = 3,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Created,
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Failed,
    ];

    /// Numeric code as persisted in `orders.status`
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Paid and Failed accept no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Failed)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Order entity (一行 `orders`)
///
/// `total_price` is always the pricing output at last save, never caller input.
/// `pending_at` / `paid_at` / `failed_at` are stamped on the first transition into
/// the matching status and never cleared.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub order_id: i64,
    /// `MN` + YYMMDD + 7-digit daily counter
    pub order_number: String,
    pub buyer_id: String,
    pub venue_id: i64,
    pub device_id: i64,
    pub product_id: i64,
    pub installation_id: i64,
    pub quantity: i64,
    pub aging_id: i64,
    /// 0 = no room component
    pub room_id: i64,
    pub room_quantity: i64,
    pub total_price: f64,
    pub payment_method_id: Option<i64>,
    pub payment_fee: f64,
    pub status: OrderStatus,
    pub email: Option<String>,
    /// Raw status string reported by the payment gateway
    pub open_payment_status: Option<String>,
    /// Tenant partition key
    pub project_id: i64,
    pub created_at: i64,
    pub created_by: String,
    pub updated_at: i64,
    pub last_update_by: String,
    pub deleted_at: Option<i64>,
    pub pending_at: Option<i64>,
    pub paid_at: Option<i64>,
    pub failed_at: Option<i64>,
}

fn default_quantity() -> i64 {
    1
}

/// Create order payload
///
/// Also used as the fully-resolved attribute set when an update is merged onto
/// an existing order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderCreate {
    pub buyer_id: String,
    pub venue_id: i64,
    pub device_id: i64,
    pub product_id: i64,
    pub installation_id: i64,
    #[serde(default)]
    pub room_id: i64,
    #[serde(default)]
    pub room_quantity: i64,
    pub aging_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub payment_method_id: Option<i64>,
    #[serde(default)]
    pub payment_fee: f64,
    pub email: Option<String>,
}

/// Update order payload (`None` = keep current value)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrderUpdate {
    pub buyer_id: Option<String>,
    pub venue_id: Option<i64>,
    pub device_id: Option<i64>,
    pub product_id: Option<i64>,
    pub installation_id: Option<i64>,
    pub room_id: Option<i64>,
    pub room_quantity: Option<i64>,
    pub aging_id: Option<i64>,
    pub quantity: Option<i64>,
    pub payment_method_id: Option<i64>,
    pub payment_fee: Option<f64>,
    pub email: Option<String>,
    pub status: Option<OrderStatus>,
    pub open_payment_status: Option<String>,
}

impl OrderUpdate {
    /// Overlay this patch onto `current`, yielding the complete attribute set
    pub fn merge_onto(&self, current: &Order) -> OrderCreate {
        OrderCreate {
            buyer_id: self
                .buyer_id
                .clone()
                .unwrap_or_else(|| current.buyer_id.clone()),
            venue_id: self.venue_id.unwrap_or(current.venue_id),
            device_id: self.device_id.unwrap_or(current.device_id),
            product_id: self.product_id.unwrap_or(current.product_id),
            installation_id: self.installation_id.unwrap_or(current.installation_id),
            room_id: self.room_id.unwrap_or(current.room_id),
            room_quantity: self.room_quantity.unwrap_or(current.room_quantity),
            aging_id: self.aging_id.unwrap_or(current.aging_id),
            quantity: self.quantity.unwrap_or(current.quantity),
            payment_method_id: self.payment_method_id.or(current.payment_method_id),
            payment_fee: self.payment_fee.unwrap_or(current.payment_fee),
            email: self.email.clone().or_else(|| current.email.clone()),
        }
    }
}

/// Status transition payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
    pub open_payment_status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> Order {
        Order {
            order_id: 7,
            order_number: "MN23100500000042".to_string(),
            buyer_id: "u1".to_string(),
            venue_id: 3,
            device_id: 1,
            product_id: 1,
            installation_id: 1,
            quantity: 1,
            aging_id: 1,
            room_id: 1,
            room_quantity: 4,
            total_price: 240000.0,
            payment_method_id: Some(2),
            payment_fee: 1500.0,
            status: OrderStatus::Created,
            email: Some("buyer@example.com".to_string()),
            open_payment_status: None,
            project_id: 1,
            created_at: 1000,
            created_by: "u1".to_string(),
            updated_at: 1000,
            last_update_by: "u1".to_string(),
            deleted_at: None,
            pending_at: None,
            paid_at: None,
            failed_at: None,
        }
    }

    #[test]
    fn test_status_codes() {
        let codes: Vec<i32> = OrderStatus::ALL.iter().map(|s| s.code()).collect();
        assert_eq!(codes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::Created.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(OrderStatus::Paid.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        let json = serde_json::to_string(&OrderStatus::Paid).unwrap();
        assert_eq!(json, "\"PAID\"");
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let current = sample_order();
        let patch = OrderUpdate {
            venue_id: Some(9),
            room_quantity: Some(10),
            ..Default::default()
        };
        let merged = patch.merge_onto(&current);
        assert_eq!(merged.venue_id, 9);
        assert_eq!(merged.room_quantity, 10);
        assert_eq!(merged.buyer_id, "u1");
        assert_eq!(merged.payment_method_id, Some(2));
        assert_eq!(merged.email.as_deref(), Some("buyer@example.com"));
    }

    #[test]
    fn test_create_payload_defaults() {
        let payload: OrderCreate = serde_json::from_str(
            r#"{"buyer_id":"u1","venue_id":3,"device_id":1,"product_id":2,"installation_id":3,"aging_id":4,"payment_method_id":null,"email":null}"#,
        )
        .unwrap();
        assert_eq!(payload.quantity, 1);
        assert_eq!(payload.room_id, 0);
        assert_eq!(payload.room_quantity, 0);
        assert_eq!(payload.payment_fee, 0.0);
    }
}
