//! Shared types for the venue order pipeline
//!
//! Plain data models used by `order-server` and by anything that consumes its
//! repository contract. DB row types derive `sqlx::FromRow` behind the `db` feature.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
