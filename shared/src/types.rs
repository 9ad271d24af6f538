//! Common types used across the platform

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix of a human-readable document number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferencePrefix {
    PurchaseOrder,
    Order,
}

impl ReferencePrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferencePrefix::PurchaseOrder => "PO",
            ReferencePrefix::Order => "ORD",
        }
    }
}

/// Build a document number such as `PO-20240115-3F9A1C`.
///
/// The suffix is taken from a v4 UUID, so two concurrent requests on the same
/// day are very unlikely to collide; the per-business unique index catches the
/// remainder.
pub fn generate_reference_number(prefix: ReferencePrefix, at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("{}-{}-{}", prefix.as_str(), at.format("%Y%m%d"), suffix)
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    50
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl Pagination {
    /// Clamp to sane bounds and return `(limit, offset)` for SQL
    pub fn limit_offset(&self) -> (i64, i64) {
        let per_page = self.per_page.clamp(1, 200) as i64;
        let page = self.page.max(1) as i64;
        (per_page, (page - 1) * per_page)
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn new(pagination: &Pagination, total_items: u64) -> Self {
        let (limit, _) = pagination.limit_offset();
        let per_page = limit as u32;
        let total_pages = ((total_items + per_page as u64 - 1) / per_page as u64) as u32;
        Self {
            page: pagination.page.max(1),
            per_page,
            total_items,
            total_pages,
        }
    }
}

/// Date range for queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}
