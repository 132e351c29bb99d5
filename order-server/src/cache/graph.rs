//! Invalidation dependency graph
//!
//! An order mutation is described by the order's footprint before and after
//! the write. Every read model that depends on any of those attributes is
//! invalidated, in every scope that may have cached it:
//!
//! | order attribute | dependent read models |
//! |-----------------|-----------------------|
//! | (any) | order list (all statuses + each status) |
//! | order_id | order by id, details |
//! | venue_id | venue order list, venue summary |
//! | license_id (via venue) | license summary, license order list |
//! | buyer_id | buyer order list |
//! | paid date | paid-on-date list |
//!
//! Scopes: tenant-wide, the order owner's, and the acting owner's.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use shared::models::{Order, OrderStatus};

use super::keys::{CacheKey, CacheResource};
use crate::orders::Actor;
use crate::utils::time::local_date_of;

/// Attributes of one order state that read models depend on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFootprint {
    pub order_id: i64,
    pub venue_id: i64,
    pub license_id: Option<i64>,
    pub buyer_id: String,
    /// `created_by` of the order
    pub owner: String,
    /// Business date of `paid_at`
    pub paid_date: Option<NaiveDate>,
}

impl OrderFootprint {
    pub fn of(order: &Order, license_id: Option<i64>, tz: chrono_tz::Tz) -> Self {
        Self {
            order_id: order.order_id,
            venue_id: order.venue_id,
            license_id,
            buyer_id: order.buyer_id.clone(),
            owner: order.created_by.clone(),
            paid_date: order.paid_at.map(|ts| local_date_of(ts, tz)),
        }
    }

    fn resources(&self) -> Vec<CacheResource> {
        let mut resources = Vec::with_capacity(OrderStatus::ALL.len() + 9);
        resources.push(CacheResource::OrderList(None));
        for status in OrderStatus::ALL {
            resources.push(CacheResource::OrderList(Some(status)));
        }
        resources.push(CacheResource::Order(self.order_id));
        resources.push(CacheResource::Details(self.order_id));
        resources.push(CacheResource::VenueOrders(self.venue_id));
        resources.push(CacheResource::VenueSummary(self.venue_id));
        resources.push(CacheResource::BuyerOrders(self.buyer_id.clone()));
        if let Some(license_id) = self.license_id {
            resources.push(CacheResource::LicenseSummary(license_id));
            resources.push(CacheResource::LicenseOrders(license_id));
        }
        if let Some(date) = self.paid_date {
            resources.push(CacheResource::PaidOn(date));
        }
        resources
    }
}

/// Expand footprints × scopes into the set of keys to delete
pub fn invalidation_keys(
    project_id: i64,
    actor: &Actor,
    footprints: &[&OrderFootprint],
) -> Vec<String> {
    let mut keys = BTreeSet::new();

    for footprint in footprints {
        let mut scopes: Vec<Option<&str>> = vec![None, Some(footprint.owner.as_str())];
        if let Some(owner) = actor.owner_scope() {
            scopes.push(Some(owner));
        }

        for resource in footprint.resources() {
            for scope in &scopes {
                keys.insert(CacheKey::new(project_id, *scope, resource.clone()));
            }
        }
    }

    keys.into_iter().map(|key| key.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn footprint() -> OrderFootprint {
        OrderFootprint {
            order_id: 7,
            venue_id: 3,
            license_id: Some(5),
            buyer_id: "u1".into(),
            owner: "u1".into(),
            paid_date: None,
        }
    }

    #[test]
    fn test_owner_write_covers_own_and_shared_views() {
        let fp = footprint();
        let keys = invalidation_keys(1, &Actor::Owner("u1".into()), &[&fp]);

        for expected in [
            "order:1:u1:list",
            "order:1::list",
            "order:1:u1:list:1",
            "order:1:u1:order:7",
            "order:1::order:7",
            "order:1:u1:details:7",
            "order:1:u1:venue:3",
            "order:1::venue:3",
            "order:1:u1:buyer:u1",
            "venue:1::summary:3",
            "license:1::summary:5",
            "license:1:u1:orders:5",
        ] {
            assert!(keys.contains(&expected.to_string()), "missing {expected}");
        }
        assert!(!keys.iter().any(|k| k.contains(":paid:")));
    }

    #[test]
    fn test_privileged_write_reaches_owner_scope() {
        let fp = footprint();
        let keys = invalidation_keys(1, &Actor::Privileged("admin".into()), &[&fp]);
        assert!(keys.contains(&"order:1::order:7".to_string()));
        assert!(keys.contains(&"order:1:u1:order:7".to_string()));
        assert!(!keys.iter().any(|k| k.contains(":admin:")));
    }

    #[test]
    fn test_before_and_after_are_both_covered() {
        let before = footprint();
        let after = OrderFootprint {
            venue_id: 4,
            license_id: None,
            paid_date: NaiveDate::from_ymd_opt(2023, 10, 5),
            ..footprint()
        };
        let keys = invalidation_keys(1, &Actor::Owner("u1".into()), &[&before, &after]);
        assert!(keys.contains(&"order:1::venue:3".to_string()));
        assert!(keys.contains(&"order:1::venue:4".to_string()));
        assert!(keys.contains(&"venue:1::summary:4".to_string()));
        assert!(keys.contains(&"order:1::paid:2023-10-05".to_string()));
        assert!(keys.contains(&"order:1:u1:paid:2023-10-05".to_string()));
    }

    #[test]
    fn test_keys_are_deduplicated() {
        let fp = footprint();
        let keys = invalidation_keys(1, &Actor::Owner("u1".into()), &[&fp, &fp]);
        let unique: BTreeSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }
}
