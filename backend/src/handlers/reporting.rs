//! Reporting handlers for the dashboard and profit export

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::reporting::{ReportFilter, ReportingService};
use crate::AppState;
use shared::DashboardStats;

#[derive(Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub format: Option<String>, // "json" or "csv"
}

pub async fn get_dashboard_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<DashboardStats>> {
    user.require("reports", "view")?;
    let service = ReportingService::new(state.db.clone());
    let stats = service.dashboard_stats(user.business_id).await?;
    Ok(Json(stats))
}

/// Revenue against cost of goods for a date window
pub async fn get_profit_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<impl IntoResponse> {
    user.require("reports", "view")?;
    let service = ReportingService::new(state.db.clone());

    let filter = ReportFilter {
        start_date: query.start_date,
        end_date: query.end_date,
    };
    let summary = service.profit_report(user.business_id, &filter).await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(&[summary])?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"profit_report.csv\""),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(summary).into_response())
    }
}
