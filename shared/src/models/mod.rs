//! Data models
//!
//! Shared between order-server and its callers.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY); actor identities are strings.

pub mod order;
pub mod order_detail;
pub mod reference;
pub mod summary;

// Re-exports
pub use order::*;
pub use order_detail::*;
pub use reference::*;
pub use summary::*;
