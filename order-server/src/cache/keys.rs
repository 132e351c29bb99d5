//! Cache key shape
//!
//! `{prefix}:{project_id}:{actor|empty}:{resource}[:{id}]`
//!
//! The actor segment is the owner scope of the read: an owner-scoped caller
//! gets their own keys, a privileged caller reads the tenant-wide (empty) ones.

use std::fmt;

use chrono::NaiveDate;
use shared::models::OrderStatus;

pub const ORDER_PREFIX: &str = "order";
pub const VENUE_PREFIX: &str = "venue";
pub const LICENSE_PREFIX: &str = "license";

/// Cached read model
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheResource {
    /// Order list, all statuses or one
    OrderList(Option<OrderStatus>),
    Order(i64),
    Details(i64),
    VenueOrders(i64),
    BuyerOrders(String),
    PaidOn(NaiveDate),
    VenueSummary(i64),
    LicenseSummary(i64),
    LicenseOrders(i64),
}

impl CacheResource {
    pub fn prefix(&self) -> &'static str {
        match self {
            CacheResource::OrderList(_)
            | CacheResource::Order(_)
            | CacheResource::Details(_)
            | CacheResource::VenueOrders(_)
            | CacheResource::BuyerOrders(_)
            | CacheResource::PaidOn(_) => ORDER_PREFIX,
            CacheResource::VenueSummary(_) => VENUE_PREFIX,
            CacheResource::LicenseSummary(_) | CacheResource::LicenseOrders(_) => LICENSE_PREFIX,
        }
    }
}

impl fmt::Display for CacheResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheResource::OrderList(None) => f.write_str("list"),
            CacheResource::OrderList(Some(status)) => write!(f, "list:{}", status.code()),
            CacheResource::Order(id) => write!(f, "order:{id}"),
            CacheResource::Details(id) => write!(f, "details:{id}"),
            CacheResource::VenueOrders(id) => write!(f, "venue:{id}"),
            CacheResource::BuyerOrders(id) => write!(f, "buyer:{id}"),
            CacheResource::PaidOn(date) => write!(f, "paid:{}", date.format("%Y-%m-%d")),
            CacheResource::VenueSummary(id) => write!(f, "summary:{id}"),
            CacheResource::LicenseSummary(id) => write!(f, "summary:{id}"),
            CacheResource::LicenseOrders(id) => write!(f, "orders:{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub project_id: i64,
    /// `None` = tenant-wide
    pub actor: Option<String>,
    pub resource: CacheResource,
}

impl CacheKey {
    pub fn new(project_id: i64, actor: Option<&str>, resource: CacheResource) -> Self {
        Self {
            project_id,
            actor: actor.map(str::to_string),
            resource,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.resource.prefix(),
            self.project_id,
            self.actor.as_deref().unwrap_or(""),
            self.resource
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shapes() {
        let key = CacheKey::new(1, Some("u1"), CacheResource::Order(7));
        assert_eq!(key.to_string(), "order:1:u1:order:7");

        let key = CacheKey::new(1, None, CacheResource::OrderList(None));
        assert_eq!(key.to_string(), "order:1::list");

        let key = CacheKey::new(1, None, CacheResource::OrderList(Some(OrderStatus::Paid)));
        assert_eq!(key.to_string(), "order:1::list:2");

        let date = NaiveDate::from_ymd_opt(2023, 10, 5).unwrap();
        let key = CacheKey::new(2, Some("u1"), CacheResource::PaidOn(date));
        assert_eq!(key.to_string(), "order:2:u1:paid:2023-10-05");

        let key = CacheKey::new(1, None, CacheResource::VenueSummary(3));
        assert_eq!(key.to_string(), "venue:1::summary:3");

        let key = CacheKey::new(1, None, CacheResource::LicenseOrders(5));
        assert_eq!(key.to_string(), "license:1::orders:5");
    }
}
