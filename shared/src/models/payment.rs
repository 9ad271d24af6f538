//! Client payment models

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Local view of a processor payment intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "payment_state", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Succeeded,
    Failed,
    Refunded,
    PartiallyRefunded,
}

impl PaymentState {
    /// Map a processor status string; anything unfamiliar stays pending
    pub fn from_processor(status: &str) -> Self {
        match status {
            "succeeded" => PaymentState::Succeeded,
            "canceled" | "payment_failed" | "requires_payment_method" => PaymentState::Failed,
            _ => PaymentState::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Pending => "pending",
            PaymentState::Succeeded => "succeeded",
            PaymentState::Failed => "failed",
            PaymentState::Refunded => "refunded",
            PaymentState::PartiallyRefunded => "partially_refunded",
        }
    }
}

/// A client payment recorded against an order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: Uuid,
    pub business_id: Uuid,
    pub order_id: Uuid,
    pub processor_intent_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentState,
    pub refunded_amount: Decimal,
    pub description: Option<String>,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn refundable(&self) -> Decimal {
        if self.status == PaymentState::Succeeded || self.status == PaymentState::PartiallyRefunded {
            self.amount - self.refunded_amount
        } else {
            Decimal::ZERO
        }
    }
}

/// Convert a money amount to the processor's integer minor units
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|minor| minor.round_dp(0).to_i64())
}

/// What a new intent may still collect: the balance less intents not yet settled
pub fn collectable_amount(remaining_balance: Decimal, pending: Decimal) -> Decimal {
    (remaining_balance - pending).max(Decimal::ZERO)
}
