//! Purchase order models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{
    checked_product, checked_total, max_amount, require_at_most, require_non_negative,
    require_positive, require_price, require_quantity, require_text, round_money, RuleViolation,
};

/// Settlement state of a supplier invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "payment_status"))]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Partial => "Partial",
            PaymentStatus::Paid => "Paid",
        }
    }
}

/// Fulfilment state of a purchase order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "purchase_status"))]
pub enum PurchaseStatus {
    Ordered,
    Received,
    Cancelled,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Ordered => "Ordered",
            PurchaseStatus::Received => "Received",
            PurchaseStatus::Cancelled => "Cancelled",
        }
    }
}

/// Purchase order header
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Purchase {
    pub id: Uuid,
    pub business_id: Uuid,
    pub purchase_order_number: String,
    pub supplier_id: Option<Uuid>,
    pub supplier_name: Option<String>,
    pub purchase_date: NaiveDate,
    pub total_amount: Decimal,
    pub final_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub status: PurchaseStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One ingredient line on a purchase order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseLine {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub inventory_item_id: Uuid,
    pub ingredient_name: String,
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Purchase header together with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseWithLines {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub items: Vec<PurchaseLine>,
}

/// A requested purchase line, before it is resolved to an inventory item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseLineInput {
    pub ingredient_name: String,
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub unit_price: Decimal,
}

impl PurchaseLineInput {
    pub fn validate(&self) -> Result<(), RuleViolation> {
        require_text("ingredient_name", &self.ingredient_name)?;
        require_positive("quantity", self.quantity)?;
        require_quantity("quantity", self.quantity)?;
        require_non_negative("unit_price", self.unit_price)?;
        require_price("unit_price", self.unit_price)?;
        Ok(())
    }

    pub fn total(&self) -> Result<Decimal, RuleViolation> {
        line_total(self.quantity, self.unit_price)
    }
}

/// `quantity × unit_price`, rounded to the cent the line is stored at
pub fn line_total(quantity: Decimal, unit_price: Decimal) -> Result<Decimal, RuleViolation> {
    let total = round_money(checked_product("total_price", quantity, unit_price)?);
    require_at_most("total_price", total, max_amount())?;
    Ok(total)
}

/// Sum of the rounded line totals; zero for an empty purchase
pub fn purchase_total(lines: &[PurchaseLineInput]) -> Result<Decimal, RuleViolation> {
    let totals = lines
        .iter()
        .map(PurchaseLineInput::total)
        .collect::<Result<Vec<_>, _>>()?;
    checked_total("total_amount", totals)
}
