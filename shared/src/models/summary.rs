//! Summary read models
//!
//! Projections joining orders with venue / license / company rows. Never written
//! directly; they are recomputed on read and cached.

use serde::{Deserialize, Serialize};

use super::order::OrderStatus;

/// Per-venue dashboard aggregate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct VenueSummary {
    pub venue_id: i64,
    pub venue_name: String,
    pub license_id: Option<i64>,
    pub license_name: Option<String>,
    pub company_id: Option<i64>,
    pub company_name: Option<String>,
    pub order_count: i64,
    pub paid_count: i64,
    /// Sum of `total_price` over live orders
    pub total_amount: f64,
    /// Sum of `total_price` over paid orders
    pub paid_amount: f64,
    pub last_paid_at: Option<i64>,
}

/// Per-license dashboard aggregate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LicenseSummary {
    pub license_id: i64,
    pub license_name: String,
    pub company_name: Option<String>,
    pub venue_count: i64,
    pub order_count: i64,
    pub paid_count: i64,
    pub paid_amount: f64,
}

/// One order row as shown on a license dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SummaryOrder {
    pub order_id: i64,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_price: f64,
    pub buyer_id: String,
    pub venue_id: i64,
    pub venue_name: String,
    pub company_name: Option<String>,
    /// Number of live detail rows
    pub item_count: i64,
    pub paid_at: Option<i64>,
}
