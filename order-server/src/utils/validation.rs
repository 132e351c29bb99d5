//! Input validation helpers
//!
//! SQLite TEXT has no built-in length enforcement; limits live here.

use crate::orders::OrderError;

/// Short identifiers: buyer id, gateway status strings
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), OrderError> {
    if value.trim().is_empty() {
        return Err(OrderError::Validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(OrderError::Validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: Option<&str>,
    field: &str,
    max_len: usize,
) -> Result<(), OrderError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(OrderError::Validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Validate a monetary amount: finite and not negative.
pub fn validate_amount(value: f64, field: &str) -> Result<(), OrderError> {
    if !value.is_finite() || value < 0.0 {
        return Err(OrderError::Validation(format!(
            "{field} must be a non-negative amount"
        )));
    }
    Ok(())
}

/// Validate a required positive id.
pub fn validate_id(value: i64, field: &str) -> Result<(), OrderError> {
    if value <= 0 {
        return Err(OrderError::Validation(format!("{field} must be positive")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("u1", "buyer_id", 10).is_ok());
        assert!(validate_required_text("   ", "buyer_id", 10).is_err());
        assert!(validate_required_text("abcdefghijk", "buyer_id", 10).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(None, "email", 5).is_ok());
        assert!(validate_optional_text(Some("a@b.c"), "email", 5).is_ok());
        assert!(validate_optional_text(Some("a@b.co"), "email", 5).is_err());
    }

    #[test]
    fn test_amount_and_id() {
        assert!(validate_amount(0.0, "payment_fee").is_ok());
        assert!(validate_amount(-0.01, "payment_fee").is_err());
        assert!(validate_amount(f64::NAN, "payment_fee").is_err());
        assert!(validate_id(1, "venue_id").is_ok());
        assert!(validate_id(0, "venue_id").is_err());
    }
}
