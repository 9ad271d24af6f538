//! Catering order models and settlement arithmetic

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::purchase::line_total;
use crate::validation::{
    checked_product, checked_total, max_amount, require_at_most, require_non_negative,
    require_positive, require_price, require_quantity, require_scale, require_text, round_money,
    RuleViolation, MONEY_DP,
};

/// Lifecycle of an order, in business order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "order_status"))]
pub enum OrderStatus {
    Inquiry,
    Confirmed,
    #[serde(rename = "In Progress")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "In Progress"))]
    InProgress,
    Delivered,
    Closed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Inquiry,
        OrderStatus::Confirmed,
        OrderStatus::InProgress,
        OrderStatus::Delivered,
        OrderStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Inquiry => "Inquiry",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::InProgress => "In Progress",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Closed => "Closed",
        }
    }

    /// Position in the lifecycle, starting at 0
    pub fn rank(&self) -> u8 {
        match self {
            OrderStatus::Inquiry => 0,
            OrderStatus::Confirmed => 1,
            OrderStatus::InProgress => 2,
            OrderStatus::Delivered => 3,
            OrderStatus::Closed => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Closed)
    }

    pub fn is_backward_from(&self, previous: OrderStatus) -> bool {
        self.rank() < previous.rank()
    }

    /// Kitchen work has started, so ingredients are committed
    pub fn consumes_stock(&self) -> bool {
        self.rank() >= OrderStatus::InProgress.rank()
    }

    /// Counts as a completed event in profit reporting
    pub fn is_completed(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Closed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown order status: {}", s))
    }
}

/// Kind of client placing the order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "client_type"))]
pub enum ClientType {
    Wedding,
    Corporate,
    Family,
    Individual,
}

/// Catering order header
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: Uuid,
    pub business_id: Uuid,
    pub order_number: String,
    pub client_name: String,
    pub client_type: ClientType,
    pub event_date: NaiveDate,
    pub event_type: Option<String>,
    pub event_location: Option<String>,
    pub guest_count: i32,
    pub price_per_head: Decimal,
    pub total_value: Decimal,
    pub advance_received: Decimal,
    pub remaining_balance: Decimal,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub stock_consumed_at: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One menu line on an order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub id: Uuid,
    pub order_id: Uuid,
    pub menu_item_id: Option<Uuid>,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Order header together with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithLines {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLine>,
}

/// A requested order line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineInput {
    pub menu_item_id: Option<Uuid>,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl OrderLineInput {
    pub fn validate(&self) -> Result<(), RuleViolation> {
        require_text("item_name", &self.item_name)?;
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

/// Contract value of an order.
///
/// Itemized orders are priced by their lines; otherwise the event is priced
/// per head.
pub fn order_total_value(
    guest_count: i32,
    price_per_head: Decimal,
    lines: Option<&[OrderLineInput]>,
) -> Result<Decimal, RuleViolation> {
    match lines {
        Some(lines) if !lines.is_empty() => {
            let totals = lines
                .iter()
                .map(OrderLineInput::total)
                .collect::<Result<Vec<_>, _>>()?;
            checked_total("total_value", totals)
        }
        _ => {
            let total = round_money(checked_product(
                "total_value",
                Decimal::from(guest_count),
                price_per_head,
            )?);
            require_at_most("total_value", total, max_amount())?;
            Ok(total)
        }
    }
}

/// What the client still owes.
///
/// The advance may not be negative nor exceed the contract value.
pub fn remaining_balance(
    total_value: Decimal,
    advance_received: Decimal,
) -> Result<Decimal, RuleViolation> {
    require_non_negative("advance_received", advance_received)?;
    require_scale("advance_received", advance_received, MONEY_DP)?;
    if advance_received > total_value {
        return Err(RuleViolation::Exceeds {
            field: "advance_received",
            limit: total_value,
        });
    }
    Ok(total_value - advance_received)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
        let parsed: OrderStatus = serde_json::from_str("\"In Progress\"").unwrap();
        assert_eq!(parsed, OrderStatus::InProgress);
        assert!(serde_json::from_str::<OrderStatus>("\"Cooking\"").is_err());
    }

    #[test]
    fn test_status_order() {
        for pair in OrderStatus::ALL.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
            assert!(pair[0].is_backward_from(pair[1]));
        }
        assert!(OrderStatus::Closed.is_terminal());
        assert!(!OrderStatus::Delivered.is_terminal());
    }

    #[test]
    fn test_status_from_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_consumes_stock() {
        assert!(!OrderStatus::Confirmed.consumes_stock());
        assert!(OrderStatus::InProgress.consumes_stock());
        assert!(OrderStatus::Delivered.consumes_stock());
    }

    #[test]
    fn test_event_priced_order() {
        let total = order_total_value(50, Decimal::from(500), None);
        assert_eq!(total, Ok(Decimal::from(25000)));
        assert_eq!(
            order_total_value(50, Decimal::from(500), Some(&[])),
            Ok(Decimal::from(25000))
        );
    }

    #[test]
    fn test_oversized_order_rejected() {
        assert!(matches!(
            order_total_value(i32::MAX, Decimal::new(999_999_999_999, 2), None),
            Err(RuleViolation::Exceeds { field: "total_value", .. })
        ));
        let line = OrderLineInput {
            menu_item_id: None,
            item_name: "Biryani".to_string(),
            quantity: Decimal::from_i128_with_scale(10i128.pow(20), 0),
            unit_price: Decimal::from(1_000_000_000),
        };
        assert!(line.validate().is_err());
        assert!(order_total_value(0, Decimal::ZERO, Some(std::slice::from_ref(&line))).is_err());
    }

    #[test]
    fn test_itemized_order() {
        let lines = vec![
            OrderLineInput {
                menu_item_id: None,
                item_name: "Chicken Biryani".to_string(),
                quantity: Decimal::from(40),
                unit_price: Decimal::from(450),
            },
            OrderLineInput {
                menu_item_id: None,
                item_name: "Kheer".to_string(),
                quantity: Decimal::from(40),
                unit_price: Decimal::from(120),
            },
        ];
        assert_eq!(
            order_total_value(999, Decimal::from(1), Some(&lines)),
            Ok(Decimal::from(22800))
        );
    }

    #[test]
    fn test_remaining_balance() {
        assert_eq!(
            remaining_balance(Decimal::from(25000), Decimal::from(10000)),
            Ok(Decimal::from(15000))
        );
        assert_eq!(
            remaining_balance(Decimal::from(25000), Decimal::from(25000)),
            Ok(Decimal::ZERO)
        );
        assert!(remaining_balance(Decimal::from(100), Decimal::from(101)).is_err());
        assert!(remaining_balance(Decimal::from(100), Decimal::from(-1)).is_err());
        assert_eq!(
            remaining_balance(Decimal::from(100), Decimal::new(1005, 3)),
            Err(RuleViolation::TooPrecise { field: "advance_received", places: 2 })
        );
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Accepted advances leave `remaining + advance == total`
        #[test]
        fn prop_remaining_balance_identity(total in 0i64..10_000_000, advance in -1_000i64..11_000_000) {
            let total = Decimal::new(total, 2);
            let advance = Decimal::new(advance, 2);
            match remaining_balance(total, advance) {
                Ok(remaining) => {
                    prop_assert_eq!(remaining + advance, total);
                    prop_assert!(remaining >= Decimal::ZERO);
                }
                Err(_) => prop_assert!(advance < Decimal::ZERO || advance > total),
            }
        }

        /// Per-head pricing applies only when no lines are given
        #[test]
        fn prop_order_total_pricing(guests in 0i32..2_000, cents in 0i64..500_000, qty in 1i64..500) {
            let price = Decimal::new(cents, 2);
            prop_assert_eq!(order_total_value(guests, price, None), Ok(Decimal::from(guests) * price));
            let empty: Vec<OrderLineInput> = Vec::new();
            prop_assert_eq!(order_total_value(guests, price, Some(empty.as_slice())), Ok(Decimal::from(guests) * price));

            let line = OrderLineInput {
                menu_item_id: None,
                item_name: "Haleem".to_string(),
                quantity: Decimal::from(qty),
                unit_price: price,
            };
            prop_assert_eq!(
                order_total_value(guests, Decimal::ONE_HUNDRED, Some(std::slice::from_ref(&line))),
                Ok(Decimal::from(qty) * price)
            );
        }
    }
}
