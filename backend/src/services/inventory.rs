//! Inventory service: item catalogue plus the stock ledger operations

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::ledger::{self, AdjustStockRequest, CreateItemRequest};
use crate::store::postgres::ITEM_COLUMNS;
use crate::store::PgStore;
use shared::{
    require_non_negative, require_price, require_quantity, require_text, InventoryItem,
    LowStockItem, StockMovement,
};

#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Metadata update; stock only changes through movements
#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub minimum_stock: Option<Decimal>,
    pub cost_per_unit: Option<Decimal>,
    pub supplier_id: Option<Uuid>,
    pub supplier_name: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

impl InventoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Active items ordered by name
    pub async fn list_items(&self, business_id: Uuid) -> AppResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {} FROM inventory_items WHERE business_id = $1 AND is_active = true ORDER BY name",
            ITEM_COLUMNS
        ))
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;

        Ok(items)
    }

    pub async fn get_item(&self, business_id: Uuid, item_id: Uuid) -> AppResult<InventoryItem> {
        sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {} FROM inventory_items WHERE id = $1 AND business_id = $2 AND is_active = true",
            ITEM_COLUMNS
        ))
        .bind(item_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))
    }

    pub async fn create_item(
        &self,
        business_id: Uuid,
        input: CreateItemRequest,
    ) -> AppResult<InventoryItem> {
        let mut store = PgStore::begin(&self.db).await?;
        let item = ledger::create_item(&mut store, business_id, input).await?;
        store.commit().await?;

        tracing::info!(%business_id, item_id = %item.id, name = %item.name, "Inventory item created");
        Ok(item)
    }

    pub async fn update_item(
        &self,
        business_id: Uuid,
        item_id: Uuid,
        input: UpdateItemInput,
    ) -> AppResult<InventoryItem> {
        if let Some(name) = &input.name {
            require_text("name", name)?;
        }
        if let Some(unit) = &input.unit {
            require_text("unit", unit)?;
        }
        if let Some(minimum) = input.minimum_stock {
            require_non_negative("minimum_stock", minimum)?;
            require_quantity("minimum_stock", minimum)?;
        }
        if let Some(cost) = input.cost_per_unit {
            require_non_negative("cost_per_unit", cost)?;
            require_price("cost_per_unit", cost)?;
        }

        sqlx::query_as::<_, InventoryItem>(&format!(
            r#"
            UPDATE inventory_items
            SET name = COALESCE($3, name),
                category = COALESCE($4, category),
                unit = COALESCE($5, unit),
                minimum_stock = COALESCE($6, minimum_stock),
                cost_per_unit = COALESCE($7, cost_per_unit),
                supplier_id = COALESCE($8, supplier_id),
                supplier_name = COALESCE($9, supplier_name),
                expiry_date = COALESCE($10, expiry_date),
                updated_at = NOW()
            WHERE id = $1 AND business_id = $2 AND is_active = true
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(item_id)
        .bind(business_id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.category)
        .bind(input.unit)
        .bind(input.minimum_stock)
        .bind(input.cost_per_unit)
        .bind(input.supplier_id)
        .bind(input.supplier_name)
        .bind(input.expiry_date)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::from_unique(e, "name"))?
        .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))
    }

    /// Soft delete; movement history stays attached to the item
    pub async fn delete_item(&self, business_id: Uuid, item_id: Uuid) -> AppResult<()> {
        let mut store = PgStore::begin(&self.db).await?;
        ledger::deactivate_item(&mut store, business_id, item_id).await?;
        store.commit().await
    }

    /// Manual stock change; returns the item with its new level
    pub async fn adjust_stock(
        &self,
        business_id: Uuid,
        item_id: Uuid,
        input: AdjustStockRequest,
    ) -> AppResult<InventoryItem> {
        let mut store = PgStore::begin(&self.db).await?;
        ledger::adjust_stock(&mut store, business_id, item_id, input).await?;
        store.commit().await?;

        self.get_item(business_id, item_id).await
    }

    pub async fn low_stock(&self, business_id: Uuid) -> AppResult<Vec<LowStockItem>> {
        let mut store = PgStore::begin(&self.db).await?;
        let report = ledger::list_low_stock(&mut store, business_id).await?;
        store.commit().await?;
        Ok(report)
    }

    pub async fn movements(
        &self,
        business_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<Vec<StockMovement>> {
        let mut store = PgStore::begin(&self.db).await?;
        let movements = ledger::list_movements(&mut store, business_id, item_id).await?;
        store.commit().await?;
        Ok(movements)
    }
}
