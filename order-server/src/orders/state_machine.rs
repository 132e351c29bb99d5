//! Order status lifecycle
//!
//! ```text
//! Created ──► Pending ──► Paid
//!    │           │
//!    │           └──────► Failed
//!    ├──────────────────► Paid
//!    └──────────────────► Failed
//! ```
//!
//! Re-entering the current status is allowed and changes nothing but
//! `updated_at`. Paid and Failed are terminal. Nothing ever returns to Created.

use shared::models::OrderStatus;

use super::error::{OrderError, OrderResult};

pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;

    if from == to {
        return true;
    }
    if from.is_terminal() {
        return false;
    }
    matches!((from, to), (Created, _) | (Pending, Paid | Failed))
}

pub fn check_transition(from: OrderStatus, to: OrderStatus) -> OrderResult<()> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(OrderError::Validation(format!(
            "illegal status transition {from} -> {to}"
        )))
    }
}

/// Lifecycle timestamps offered by one transition
///
/// At most one field is `Some`. Persistence applies each with
/// `COALESCE(column, ?)`, so an already-stamped column keeps its first value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusStamps {
    pub pending_at: Option<i64>,
    pub paid_at: Option<i64>,
    pub failed_at: Option<i64>,
}

impl StatusStamps {
    pub fn for_target(target: OrderStatus, now: i64) -> Self {
        match target {
            OrderStatus::Created => Self::default(),
            OrderStatus::Pending => Self {
                pending_at: Some(now),
                ..Default::default()
            },
            OrderStatus::Paid => Self {
                paid_at: Some(now),
                ..Default::default()
            },
            OrderStatus::Failed => Self {
                failed_at: Some(now),
                ..Default::default()
            },
        }
    }
}

/// A validated transition, ready to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// Status read before the write; the UPDATE is guarded on it
    pub observed: OrderStatus,
    pub target: OrderStatus,
    /// Payment gateway status string, kept when `None`
    pub open_payment_status: Option<String>,
    pub stamps: StatusStamps,
}

impl StatusChange {
    pub fn plan(
        observed: OrderStatus,
        target: OrderStatus,
        open_payment_status: Option<String>,
        now: i64,
    ) -> OrderResult<Self> {
        check_transition(observed, target)?;
        Ok(Self {
            observed,
            target,
            open_payment_status,
            stamps: StatusStamps::for_target(target, now),
        })
    }

    /// Keep the current status (attribute-only update)
    pub fn unchanged(current: OrderStatus) -> Self {
        Self {
            observed: current,
            target: current,
            open_payment_status: None,
            stamps: StatusStamps::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn test_forward_transitions() {
        assert!(can_transition(Created, Pending));
        assert!(can_transition(Created, Paid));
        assert!(can_transition(Created, Failed));
        assert!(can_transition(Pending, Paid));
        assert!(can_transition(Pending, Failed));
    }

    #[test]
    fn test_terminal_and_backward_rejected() {
        assert!(!can_transition(Paid, Failed));
        assert!(!can_transition(Failed, Paid));
        assert!(!can_transition(Paid, Pending));
        assert!(!can_transition(Pending, Created));
        assert!(matches!(
            check_transition(Paid, Created),
            Err(OrderError::Validation(_))
        ));
    }

    #[test]
    fn test_same_status_is_allowed() {
        for status in OrderStatus::ALL {
            assert!(can_transition(status, status));
        }
    }

    #[test]
    fn test_stamps_for_target() {
        assert_eq!(StatusStamps::for_target(Created, 5), StatusStamps::default());
        assert_eq!(StatusStamps::for_target(Paid, 5).paid_at, Some(5));
        assert_eq!(StatusStamps::for_target(Paid, 5).pending_at, None);
        assert_eq!(StatusStamps::for_target(Failed, 5).failed_at, Some(5));
    }

    #[test]
    fn test_plan_rejects_illegal_transition() {
        assert!(StatusChange::plan(Failed, Paid, None, 1).is_err());
        let change = StatusChange::plan(Pending, Paid, Some("OK".into()), 9).unwrap();
        assert_eq!(change.stamps.paid_at, Some(9));
        assert_eq!(StatusChange::unchanged(Paid).stamps, StatusStamps::default());
    }
}
