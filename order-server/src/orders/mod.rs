//! 订单流水线
//!
//! - [`OrderService`] - 订单增删改查入口 (pricing → snapshot → transaction → cache)
//! - [`OrderNumberSequencer`] - 每日订单号
//! - [`state_machine`] - 状态迁移规则
//! - [`Actor`] / [`RequestContext`] - 调用者身份与归属策略

pub mod actor;
pub mod error;
pub mod sequencer;
pub mod service;
pub mod snapshot;
pub mod state_machine;

pub use actor::{Actor, RequestContext};
pub use error::{OrderError, OrderResult};
pub use sequencer::OrderNumberSequencer;
pub use service::OrderService;
pub use state_machine::{StatusChange, can_transition};
