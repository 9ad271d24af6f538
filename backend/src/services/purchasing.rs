//! Purchasing service: purchase orders and their stock receipts

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::ledger::{self, NewPurchaseRequest};
use crate::store::postgres::{PURCHASE_COLUMNS, PURCHASE_LINE_COLUMNS};
use crate::store::PgStore;
use shared::{
    PaginatedResponse, Pagination, PaginationMeta, PaymentStatus, Purchase, PurchaseLine,
    PurchaseStatus, PurchaseWithLines,
};

#[derive(Clone)]
pub struct PurchasingService {
    db: PgPool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePurchaseStatusInput {
    pub payment_status: Option<PaymentStatus>,
    pub status: Option<PurchaseStatus>,
}

impl PurchasingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create the purchase and receive all its lines in one transaction
    pub async fn create_purchase(
        &self,
        business_id: Uuid,
        input: NewPurchaseRequest,
    ) -> AppResult<PurchaseWithLines> {
        let mut store = PgStore::begin(&self.db).await?;
        let purchase = ledger::create_purchase(&mut store, business_id, input).await?;
        store.commit().await?;
        Ok(purchase)
    }

    /// Newest first
    pub async fn list_purchases(
        &self,
        business_id: Uuid,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<Purchase>> {
        let (limit, offset) = pagination.limit_offset();

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM purchases WHERE business_id = $1")
            .bind(business_id)
            .fetch_one(&self.db)
            .await?;

        let data = sqlx::query_as::<_, Purchase>(&format!(
            "SELECT {} FROM purchases WHERE business_id = $1 \
             ORDER BY purchase_date DESC, created_at DESC LIMIT $2 OFFSET $3",
            PURCHASE_COLUMNS
        ))
        .bind(business_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data,
            pagination: PaginationMeta::new(pagination, total.max(0) as u64),
        })
    }

    pub async fn get_purchase(
        &self,
        business_id: Uuid,
        purchase_id: Uuid,
    ) -> AppResult<PurchaseWithLines> {
        let purchase = sqlx::query_as::<_, Purchase>(&format!(
            "SELECT {} FROM purchases WHERE id = $1 AND business_id = $2",
            PURCHASE_COLUMNS
        ))
        .bind(purchase_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase".to_string()))?;

        let items = sqlx::query_as::<_, PurchaseLine>(&format!(
            "SELECT {} FROM purchase_items WHERE purchase_id = $1 ORDER BY seq",
            PURCHASE_LINE_COLUMNS
        ))
        .bind(purchase_id)
        .fetch_all(&self.db)
        .await?;

        Ok(PurchaseWithLines { purchase, items })
    }

    /// Only payment and receiving status change after creation.
    ///
    /// Cancelling leaves the stock received at creation in place.
    pub async fn update_status(
        &self,
        business_id: Uuid,
        purchase_id: Uuid,
        input: UpdatePurchaseStatusInput,
    ) -> AppResult<Purchase> {
        let purchase = sqlx::query_as::<_, Purchase>(&format!(
            r#"
            UPDATE purchases
            SET payment_status = COALESCE($3, payment_status),
                status = COALESCE($4, status),
                updated_at = NOW()
            WHERE id = $1 AND business_id = $2
            RETURNING {}
            "#,
            PURCHASE_COLUMNS
        ))
        .bind(purchase_id)
        .bind(business_id)
        .bind(input.payment_status)
        .bind(input.status)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase".to_string()))?;

        tracing::info!(
            %business_id,
            %purchase_id,
            payment_status = purchase.payment_status.as_str(),
            status = purchase.status.as_str(),
            "Purchase status updated"
        );
        Ok(purchase)
    }
}
