//! Menu and recipe models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{
    checked_product, require_non_negative, require_price, round_quantity, RuleViolation,
};

/// A dish offered on the menu
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MenuItem {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub cost_per_serving: Decimal,
    pub selling_price: Decimal,
    pub margin_percent: Decimal,
    pub is_available: bool,
    pub is_vegetarian: bool,
    pub prep_time_minutes: Option<i32>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Recipe link between a dish and what it uses per serving
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MenuIngredient {
    pub id: Uuid,
    pub menu_item_id: Uuid,
    pub inventory_item_id: Option<Uuid>,
    pub ingredient_name: String,
    pub quantity_required: Decimal,
    pub unit: Option<String>,
}

/// Menu item together with its recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemWithIngredients {
    #[serde(flatten)]
    pub item: MenuItem,
    pub ingredients: Vec<MenuIngredient>,
}

/// `(selling - cost) / selling × 100`, rounded to two places.
///
/// A zero or negative selling price has no meaningful margin and is rejected.
pub fn margin_percent(
    cost_per_serving: Decimal,
    selling_price: Decimal,
) -> Result<Decimal, RuleViolation> {
    require_non_negative("cost_per_serving", cost_per_serving)?;
    require_price("cost_per_serving", cost_per_serving)?;
    if selling_price <= Decimal::ZERO {
        return Err(RuleViolation::NotPositive {
            field: "selling_price",
        });
    }
    require_price("selling_price", selling_price)?;
    let margin = ((selling_price - cost_per_serving) / selling_price * Decimal::ONE_HUNDRED).round_dp(2);
    // margin_percent is NUMERIC(7, 2)
    if margin < min_margin() {
        return Err(RuleViolation::OutOfRange {
            field: "margin_percent",
        });
    }
    Ok(margin)
}

fn min_margin() -> Decimal {
    Decimal::new(-9_999_999, 2)
}

/// Stock drawn for `servings` portions of one ingredient, at stored precision
pub fn ingredient_requirement(
    quantity_required: Decimal,
    servings: Decimal,
) -> Result<Decimal, RuleViolation> {
    checked_product("quantity_required", quantity_required, servings).map(round_quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_margin_percent() {
        assert_eq!(margin_percent(dec("150"), dec("450")), Ok(dec("66.67")));
        assert_eq!(margin_percent(dec("0"), dec("100")), Ok(dec("100")));
        assert_eq!(margin_percent(dec("100"), dec("100")), Ok(dec("0")));
    }

    #[test]
    fn test_negative_margin_when_selling_below_cost() {
        assert_eq!(margin_percent(dec("120"), dec("100")), Ok(dec("-20")));
    }

    #[test]
    fn test_zero_selling_price_rejected() {
        assert_eq!(
            margin_percent(dec("10"), Decimal::ZERO),
            Err(RuleViolation::NotPositive { field: "selling_price" })
        );
    }

    #[test]
    fn test_negative_cost_rejected() {
        assert!(margin_percent(dec("-1"), dec("10")).is_err());
    }

    #[test]
    fn test_ingredient_requirement() {
        assert_eq!(ingredient_requirement(dec("0.25"), dec("40")), Ok(dec("10.00")));
        assert_eq!(ingredient_requirement(dec("0.333"), dec("0.125")), Ok(dec("0.042")));
        assert!(ingredient_requirement(Decimal::MAX, dec("2")).is_err());
    }

    #[test]
    fn test_margin_out_of_column_range() {
        assert_eq!(
            margin_percent(dec("9999999"), dec("0.01")),
            Err(RuleViolation::OutOfRange { field: "margin_percent" })
        );
        assert!(margin_percent(dec("10"), dec("10.005")).is_err());
    }
}
