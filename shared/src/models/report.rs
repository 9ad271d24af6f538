//! Dashboard and profit reporting models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Headline numbers for the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub pending_orders: i64,
    pub upcoming_events: i64,
    pub low_stock_count: i64,
    pub inventory_value: Decimal,
    pub monthly_revenue: Decimal,
    pub total_sales: Decimal,
    pub outstanding_balance: Decimal,
}

/// Revenue against cost of goods for a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitSummary {
    pub revenue: Decimal,
    pub cost_of_goods: Decimal,
    pub gross_profit: Decimal,
    pub profit_margin_percent: Decimal,
    pub completed_events: i64,
    pub avg_profit_per_event: Decimal,
}

/// Derive profit figures; margins and averages are zero when undefined
pub fn summarize_profit(
    revenue: Decimal,
    cost_of_goods: Decimal,
    completed_events: i64,
) -> ProfitSummary {
    let gross_profit = revenue - cost_of_goods;
    let profit_margin_percent = if revenue > Decimal::ZERO {
        (gross_profit / revenue * Decimal::ONE_HUNDRED).round_dp(2)
    } else {
        Decimal::ZERO
    };
    let avg_profit_per_event = if completed_events > 0 {
        (gross_profit / Decimal::from(completed_events)).round_dp(2)
    } else {
        Decimal::ZERO
    };

    ProfitSummary {
        revenue,
        cost_of_goods,
        gross_profit,
        profit_margin_percent,
        completed_events,
        avg_profit_per_event,
    }
}
