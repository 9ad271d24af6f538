//! Reporting service for the dashboard and profit analysis

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{summarize_profit, DashboardStats, ProfitSummary};

#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Optional inclusive date window; open ends are unbounded
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReportFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn dashboard_stats(&self, business_id: Uuid) -> AppResult<DashboardStats> {
        let (
            pending_orders,
            upcoming_events,
            low_stock_count,
            inventory_value,
            monthly_revenue,
            total_sales,
            outstanding_balance,
        ) = sqlx::query_as::<_, (i64, i64, i64, Decimal, Decimal, Decimal, Decimal)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM orders
                  WHERE business_id = $1 AND status IN ('Inquiry', 'Confirmed', 'In Progress')),
                (SELECT COUNT(DISTINCT event_date) FROM orders
                  WHERE business_id = $1 AND event_date >= CURRENT_DATE AND status <> 'Closed'),
                (SELECT COUNT(*) FROM inventory_items
                  WHERE business_id = $1 AND is_active = true AND current_stock <= minimum_stock),
                (SELECT COALESCE(SUM(current_stock * cost_per_unit), 0) FROM inventory_items
                  WHERE business_id = $1 AND is_active = true),
                (SELECT COALESCE(SUM(total_value), 0) FROM orders
                  WHERE business_id = $1
                    AND DATE_TRUNC('month', event_date) = DATE_TRUNC('month', CURRENT_DATE)
                    AND status IN ('In Progress', 'Delivered')),
                (SELECT COALESCE(SUM(total_value), 0) FROM orders
                  WHERE business_id = $1 AND status = 'Delivered'),
                (SELECT COALESCE(SUM(remaining_balance), 0) FROM orders
                  WHERE business_id = $1 AND status <> 'Closed')
            "#,
        )
        .bind(business_id)
        .fetch_one(&self.db)
        .await?;

        Ok(DashboardStats {
            pending_orders,
            upcoming_events,
            low_stock_count,
            inventory_value,
            monthly_revenue,
            total_sales,
            outstanding_balance,
        })
    }

    /// Revenue of completed events against purchases that were not cancelled
    pub async fn profit_report(
        &self,
        business_id: Uuid,
        filter: &ReportFilter,
    ) -> AppResult<ProfitSummary> {
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            if start > end {
                return Err(AppError::validation("start_date", "start_date is after end_date"));
            }
        }

        let (revenue, completed_events) = sqlx::query_as::<_, (Decimal, i64)>(
            r#"
            SELECT COALESCE(SUM(total_value), 0), COUNT(*)
            FROM orders
            WHERE business_id = $1
              AND status IN ('Delivered', 'Closed')
              AND ($2::date IS NULL OR event_date >= $2)
              AND ($3::date IS NULL OR event_date <= $3)
            "#,
        )
        .bind(business_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(&self.db)
        .await?;

        let cost_of_goods = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(final_amount), 0)
            FROM purchases
            WHERE business_id = $1
              AND status <> 'Cancelled'
              AND ($2::date IS NULL OR purchase_date >= $2)
              AND ($3::date IS NULL OR purchase_date <= $3)
            "#,
        )
        .bind(business_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(&self.db)
        .await?;

        Ok(summarize_profit(revenue, cost_of_goods, completed_events))
    }

    /// Export report rows as CSV, one record per element
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profit_csv_has_header_and_row() {
        let summary = summarize_profit(Decimal::from(25000), Decimal::from(6000), 1);
        let csv = ReportingService::export_to_csv(&[summary]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("revenue,cost_of_goods,gross_profit,profit_margin_percent,completed_events,avg_profit_per_event")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("25000,6000,19000,76"));
        assert!(row.ends_with(",1,19000"));
        assert_eq!(lines.next(), None);
    }
}
