//! Order service: catering orders and their settlement

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::ledger::{self, NewOrderRequest, UpdateOrderRequest};
use crate::store::postgres::{ORDER_COLUMNS, ORDER_LINE_COLUMNS};
use crate::store::PgStore;
use shared::{
    Order, OrderLine, OrderStatus, OrderWithLines, PaginatedResponse, Pagination, PaginationMeta,
};

#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

/// Query string for the order list
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl OrderFilter {
    fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

impl OrderService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_order(
        &self,
        business_id: Uuid,
        input: NewOrderRequest,
    ) -> AppResult<OrderWithLines> {
        let mut store = PgStore::begin(&self.db).await?;
        let order = ledger::create_order(&mut store, business_id, input).await?;
        store.commit().await?;
        Ok(order)
    }

    /// Status/advance update, including the ingredient draw when it applies
    pub async fn update_order(
        &self,
        business_id: Uuid,
        order_id: Uuid,
        input: UpdateOrderRequest,
    ) -> AppResult<Order> {
        let mut store = PgStore::begin(&self.db).await?;
        let order = ledger::update_order(&mut store, business_id, order_id, input).await?;
        store.commit().await?;
        Ok(order)
    }

    /// Upcoming events first
    pub async fn list_orders(
        &self,
        business_id: Uuid,
        filter: &OrderFilter,
    ) -> AppResult<PaginatedResponse<Order>> {
        let pagination = filter.pagination();
        let (limit, offset) = pagination.limit_offset();

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM orders WHERE business_id = $1 AND ($2::order_status IS NULL OR status = $2)",
        )
        .bind(business_id)
        .bind(filter.status)
        .fetch_one(&self.db)
        .await?;

        let data = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders \
             WHERE business_id = $1 AND ($2::order_status IS NULL OR status = $2) \
             ORDER BY event_date ASC, created_at DESC LIMIT $3 OFFSET $4",
            ORDER_COLUMNS
        ))
        .bind(business_id)
        .bind(filter.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data,
            pagination: PaginationMeta::new(&pagination, total.max(0) as u64),
        })
    }

    pub async fn get_order(&self, business_id: Uuid, order_id: Uuid) -> AppResult<OrderWithLines> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE id = $1 AND business_id = $2",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let items = sqlx::query_as::<_, OrderLine>(&format!(
            "SELECT {} FROM order_items WHERE order_id = $1 ORDER BY seq",
            ORDER_LINE_COLUMNS
        ))
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(OrderWithLines { order, items })
    }
}
