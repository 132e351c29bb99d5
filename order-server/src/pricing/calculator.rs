//! Price Calculator
//!
//! ```text
//! total = device + product + installation
//!       + ceil(room_quantity * 0.3) * room
//!       + aging
//! ```
//!
//! Uses rust_decimal for precise calculations, stores as f64.

use std::sync::Arc;

use rust_decimal::prelude::*;
use shared::models::{ItemType, OrderCreate, PricedItem};

use super::PricingError;
use crate::db::repository::reference::ReferenceLookup;

/// Rounding strategy for monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Room occupancy factor (0.3)
pub const ROOM_OCCUPANCY_FACTOR: Decimal = Decimal::from_parts(3, 0, 0, false, 1);

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// `ceil(room_quantity * 0.3)`; 0 for a non-positive quantity
pub fn room_multiplier(room_quantity: i64) -> Decimal {
    if room_quantity <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(room_quantity) * ROOM_OCCUPANCY_FACTOR).ceil()
}

/// Component ids of an order (`room_id == 0` means no room)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentIds {
    pub device_id: i64,
    pub product_id: i64,
    pub installation_id: i64,
    pub room_id: i64,
    pub room_quantity: i64,
    pub aging_id: i64,
}

impl ComponentIds {
    pub fn of(order: &OrderCreate) -> Self {
        Self {
            device_id: order.device_id,
            product_id: order.product_id,
            installation_id: order.installation_id,
            room_id: order.room_id,
            room_quantity: order.room_quantity,
            aging_id: order.aging_id,
        }
    }

    pub fn validate(&self) -> Result<(), PricingError> {
        for (kind, id) in [
            (ItemType::Device, self.device_id),
            (ItemType::Product, self.product_id),
            (ItemType::Installation, self.installation_id),
            (ItemType::Aging, self.aging_id),
        ] {
            if id <= 0 {
                return Err(PricingError::Invalid(format!("{kind} id must be positive")));
            }
        }
        if self.room_id < 0 {
            return Err(PricingError::Invalid("room id must not be negative".into()));
        }
        if self.room_quantity < 0 {
            return Err(PricingError::Invalid(
                "room quantity must not be negative".into(),
            ));
        }
        if self.room_id == 0 && self.room_quantity > 0 {
            return Err(PricingError::Invalid(
                "room quantity given without a room".into(),
            ));
        }
        Ok(())
    }
}

/// Components as resolved at pricing time
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedComponents {
    pub device: PricedItem,
    pub product: PricedItem,
    pub installation: PricedItem,
    /// `None` when the order has no room
    pub room: Option<PricedItem>,
    pub room_quantity: i64,
    pub aging: PricedItem,
}

impl ResolvedComponents {
    pub fn total_decimal(&self) -> Decimal {
        let room_term = self
            .room
            .as_ref()
            .map(|room| room_multiplier(self.room_quantity) * to_decimal(room.price))
            .unwrap_or(Decimal::ZERO);

        to_decimal(self.device.price)
            + to_decimal(self.product.price)
            + to_decimal(self.installation.price)
            + room_term
            + to_decimal(self.aging.price)
    }

    /// Total rounded for storage
    pub fn total(&self) -> f64 {
        to_f64(self.total_decimal())
    }
}

/// Resolves component ids through [`ReferenceLookup`] and prices them
#[derive(Clone)]
pub struct PriceCalculator {
    lookup: Arc<dyn ReferenceLookup>,
}

impl PriceCalculator {
    pub fn new(lookup: Arc<dyn ReferenceLookup>) -> Self {
        Self { lookup }
    }

    async fn require(
        &self,
        kind: ItemType,
        project_id: i64,
        id: i64,
    ) -> Result<PricedItem, PricingError> {
        self.lookup
            .find(kind, project_id, id)
            .await?
            .ok_or(PricingError::ComponentNotFound { kind, id })
    }

    /// Look every component up for the tenant; fails on the first id that
    /// does not resolve
    pub async fn resolve(
        &self,
        ids: &ComponentIds,
        project_id: i64,
    ) -> Result<ResolvedComponents, PricingError> {
        ids.validate()?;

        let device = self.require(ItemType::Device, project_id, ids.device_id).await?;
        let product = self.require(ItemType::Product, project_id, ids.product_id).await?;
        let installation = self
            .require(ItemType::Installation, project_id, ids.installation_id)
            .await?;
        let room = if ids.room_id != 0 {
            Some(self.require(ItemType::Room, project_id, ids.room_id).await?)
        } else {
            None
        };
        let aging = self.require(ItemType::Aging, project_id, ids.aging_id).await?;

        Ok(ResolvedComponents {
            device,
            product,
            installation,
            room,
            room_quantity: ids.room_quantity,
            aging,
        })
    }

    pub async fn compute_total(
        &self,
        ids: &ComponentIds,
        project_id: i64,
    ) -> Result<f64, PricingError> {
        Ok(self.resolve(ids, project_id).await?.total())
    }
}
