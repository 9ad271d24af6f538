//! Validation utilities and business-rule violations
//!
//! Every rule here is pure so the server and the dashboard (via WASM)
//! reject the same inputs.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// A rejected input, carrying the offending field name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field} cannot be negative")]
    Negative { field: &'static str },

    #[error("{field} cannot exceed {limit}")]
    Exceeds { field: &'static str, limit: Decimal },

    #[error("{field} allows at most {places} decimal places")]
    TooPrecise { field: &'static str, places: u32 },

    #[error("{field} is out of range")]
    OutOfRange { field: &'static str },

    #[error("stock for {item} would drop to {would_be}")]
    InsufficientStock { item: String, would_be: Decimal },
}

impl RuleViolation {
    /// Field the violation refers to
    pub fn field(&self) -> &str {
        match self {
            RuleViolation::Required { field }
            | RuleViolation::NotPositive { field }
            | RuleViolation::Negative { field }
            | RuleViolation::Exceeds { field, .. }
            | RuleViolation::TooPrecise { field, .. }
            | RuleViolation::OutOfRange { field } => field,
            RuleViolation::InsufficientStock { .. } => "current_stock",
        }
    }
}

// ============================================================================
// Field Rules
// ============================================================================

/// Reject blank strings after trimming
pub fn require_text(field: &'static str, value: &str) -> Result<(), RuleViolation> {
    if value.trim().is_empty() {
        return Err(RuleViolation::Required { field });
    }
    Ok(())
}

/// Reject zero and negative amounts
pub fn require_positive(field: &'static str, value: Decimal) -> Result<(), RuleViolation> {
    if value <= Decimal::ZERO {
        return Err(RuleViolation::NotPositive { field });
    }
    Ok(())
}

/// Reject negative amounts, zero allowed
pub fn require_non_negative(field: &'static str, value: Decimal) -> Result<(), RuleViolation> {
    if value < Decimal::ZERO {
        return Err(RuleViolation::Negative { field });
    }
    Ok(())
}

// ============================================================================
// Amounts
// ============================================================================

/// Decimal places kept for money
pub const MONEY_DP: u32 = 2;

/// Decimal places kept for stock quantities
pub const QUANTITY_DP: u32 = 3;

/// Largest stock quantity, `NUMERIC(12, 3)`
pub fn max_quantity() -> Decimal {
    Decimal::new(999_999_999_999, QUANTITY_DP)
}

/// Largest unit price, `NUMERIC(12, 2)`
pub fn max_price() -> Decimal {
    Decimal::new(999_999_999_999, MONEY_DP)
}

/// Largest document total, `NUMERIC(14, 2)`
pub fn max_amount() -> Decimal {
    Decimal::new(99_999_999_999_999, MONEY_DP)
}

/// Reject values carrying more decimal places than are stored
pub fn require_scale(field: &'static str, value: Decimal, places: u32) -> Result<(), RuleViolation> {
    if value.normalize().scale() > places {
        return Err(RuleViolation::TooPrecise { field, places });
    }
    Ok(())
}

/// Reject values above `limit`
pub fn require_at_most(
    field: &'static str,
    value: Decimal,
    limit: Decimal,
) -> Result<(), RuleViolation> {
    if value > limit {
        return Err(RuleViolation::Exceeds { field, limit });
    }
    Ok(())
}

/// A signed stock quantity that fits the ledger columns
pub fn require_quantity(field: &'static str, value: Decimal) -> Result<(), RuleViolation> {
    require_scale(field, value, QUANTITY_DP)?;
    require_at_most(field, value.abs(), max_quantity())
}

/// A unit price that fits the ledger columns
pub fn require_price(field: &'static str, value: Decimal) -> Result<(), RuleViolation> {
    require_scale(field, value, MONEY_DP)?;
    require_at_most(field, value.abs(), max_price())
}

/// Round to the cent, half away from zero as Postgres does
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to the stored quantity precision
pub fn round_quantity(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(QUANTITY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// `a × b` without overflowing
pub fn checked_product(field: &'static str, a: Decimal, b: Decimal) -> Result<Decimal, RuleViolation> {
    a.checked_mul(b).ok_or(RuleViolation::OutOfRange { field })
}

/// Sum of money amounts, bounded by [`max_amount`]
pub fn checked_total(
    field: &'static str,
    values: impl IntoIterator<Item = Decimal>,
) -> Result<Decimal, RuleViolation> {
    let total = values.into_iter().try_fold(Decimal::ZERO, |acc, value| {
        acc.checked_add(value).ok_or(RuleViolation::OutOfRange { field })
    })?;
    require_at_most(field, total, max_amount())?;
    Ok(total)
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate a phone number: 7 to 15 digits, optional leading '+', separators ignored
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    let trimmed = phone.trim();
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || c == '-' || c == ' ' || c == '(' || c == ')')
    {
        return Err("Phone number contains invalid characters");
    }
    let digits = body.chars().filter(|c| c.is_ascii_digit()).count();
    if !(7..=15).contains(&digits) {
        return Err("Phone number must have 7 to 15 digits");
    }
    Ok(())
}
