//! Pricing
//!
//! Resolves an order's priced components and composes its total.

pub mod calculator;

pub use calculator::{ComponentIds, PriceCalculator, ResolvedComponents, room_multiplier};

use shared::models::ItemType;
use thiserror::Error;

use crate::db::repository::RepoError;

#[derive(Debug, Error)]
pub enum PricingError {
    /// Component id does not resolve for the tenant
    #[error("{kind} {id} not found")]
    ComponentNotFound { kind: ItemType, id: i64 },

    #[error("Invalid components: {0}")]
    Invalid(String),

    #[error(transparent)]
    Lookup(#[from] RepoError),
}
