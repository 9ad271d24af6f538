//! Inventory and stock ledger models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::validation::{max_quantity, require_at_most, require_quantity, RuleViolation};

/// Why a stock level changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "movement_type"))]
pub enum MovementType {
    Purchase,
    Consumption,
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Purchase => "Purchase",
            MovementType::Consumption => "Consumption",
            MovementType::Adjustment => "Adjustment",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Purchase" => Ok(MovementType::Purchase),
            "Consumption" => Ok(MovementType::Consumption),
            "Adjustment" => Ok(MovementType::Adjustment),
            other => Err(format!("unknown movement type: {}", other)),
        }
    }
}

/// A stocked ingredient or consumable
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryItem {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub unit: String,
    pub current_stock: Decimal,
    pub minimum_stock: Decimal,
    pub cost_per_unit: Decimal,
    pub supplier_id: Option<Uuid>,
    pub supplier_name: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.minimum_stock
    }

    /// How far stock sits below the minimum; negative when comfortably above
    pub fn shortage(&self) -> Decimal {
        self.minimum_stock - self.current_stock
    }

    pub fn stock_value(&self) -> Decimal {
        self.current_stock * self.cost_per_unit
    }
}

/// One append-only entry in the stock ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: Uuid,
    pub business_id: Uuid,
    pub inventory_item_id: Uuid,
    pub movement_type: MovementType,
    pub quantity_change: Decimal,
    pub previous_stock: Decimal,
    pub new_stock: Decimal,
    pub reference_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Item at or below its minimum, with the computed shortage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowStockItem {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub shortage: Decimal,
}

/// Apply a signed delta to a stock level.
///
/// Zero deltas are rejected, as is any delta that would leave the level
/// below zero or above what a stock column holds.
pub fn apply_stock_delta(
    item_name: &str,
    previous: Decimal,
    delta: Decimal,
) -> Result<Decimal, RuleViolation> {
    if delta.is_zero() {
        return Err(RuleViolation::NotPositive {
            field: "quantity_change",
        });
    }
    require_quantity("quantity_change", delta)?;
    let next = previous
        .checked_add(delta)
        .ok_or(RuleViolation::OutOfRange { field: "current_stock" })?;
    if next < Decimal::ZERO {
        return Err(RuleViolation::InsufficientStock {
            item: item_name.to_string(),
            would_be: next,
        });
    }
    require_at_most("current_stock", next, max_quantity())?;
    Ok(next)
}

/// Select items at or below minimum, largest shortage first
pub fn low_stock_report(items: impl IntoIterator<Item = InventoryItem>) -> Vec<LowStockItem> {
    let mut low: Vec<LowStockItem> = items
        .into_iter()
        .filter(|item| item.is_active && item.is_low_stock())
        .map(|item| LowStockItem {
            shortage: item.shortage(),
            item,
        })
        .collect();

    low.sort_by(|a, b| {
        b.shortage
            .cmp(&a.shortage)
            .then_with(|| a.item.name.cmp(&b.item.name))
    });
    low
}
