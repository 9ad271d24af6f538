//! Stock ledger: every stock change is a movement row plus a new level

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{LedgerStore, NewInventoryItem, NewStockMovement};
use shared::{
    apply_stock_delta, low_stock_report, require_non_negative, require_price, require_quantity,
    require_text, InventoryItem, LowStockItem, MovementType, StockMovement,
};

/// One signed change to one item's stock
#[derive(Debug, Clone)]
pub struct RecordMovement {
    pub item_id: Uuid,
    pub delta: Decimal,
    pub movement_type: MovementType,
    pub reference_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub notes: Option<String>,
}

/// Find-or-create key for purchased ingredients
#[derive(Debug, Clone)]
pub struct ResolveItem {
    pub name: String,
    pub unit: Option<String>,
    pub cost_per_unit: Decimal,
    pub supplier_id: Option<Uuid>,
    pub supplier_name: Option<String>,
}

/// Explicit item creation from the inventory screen
#[derive(Debug, Clone, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub category: Option<String>,
    pub unit: String,
    #[serde(default)]
    pub minimum_stock: Decimal,
    #[serde(default)]
    pub cost_per_unit: Decimal,
    pub supplier_id: Option<Uuid>,
    pub supplier_name: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    /// Recorded as an opening Adjustment movement
    #[serde(default)]
    pub initial_stock: Decimal,
}

/// Manual stock change from the inventory screen
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustStockRequest {
    /// Signed change; negative removes stock
    pub quantity: Decimal,
    pub movement_type: Option<MovementType>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Lock the item, apply `delta`, persist the level and append the movement.
pub async fn record_movement<S>(
    store: &mut S,
    business_id: Uuid,
    movement: RecordMovement,
) -> AppResult<StockMovement>
where
    S: LedgerStore + ?Sized,
{
    let item = store
        .lock_item(business_id, movement.item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

    let new_stock = apply_stock_delta(&item.name, item.current_stock, movement.delta)?;

    store.set_item_stock(item.id, new_stock).await?;
    let row = store
        .insert_movement(NewStockMovement {
            business_id,
            inventory_item_id: item.id,
            movement_type: movement.movement_type,
            quantity_change: movement.delta,
            previous_stock: item.current_stock,
            new_stock,
            reference_id: movement.reference_id,
            reference_type: movement.reference_type,
            notes: movement.notes,
        })
        .await?;

    tracing::info!(
        %business_id,
        item_id = %item.id,
        movement_type = movement.movement_type.as_str(),
        delta = %movement.delta,
        new_stock = %new_stock,
        "Stock movement recorded"
    );

    if new_stock <= item.minimum_stock && movement.delta < Decimal::ZERO {
        tracing::warn!(
            item_id = %item.id,
            item = %item.name,
            new_stock = %new_stock,
            minimum_stock = %item.minimum_stock,
            "Item at or below minimum stock"
        );
    }

    Ok(row)
}

/// Return the active item with exactly this name, creating it at zero stock if absent.
///
/// Matching is case-sensitive on the trimmed name, so spelling variants
/// become separate items.
pub async fn resolve_or_create_item<S>(
    store: &mut S,
    business_id: Uuid,
    key: ResolveItem,
) -> AppResult<InventoryItem>
where
    S: LedgerStore + ?Sized,
{
    let name = key.name.trim();
    require_text("ingredient_name", name)?;

    if let Some(existing) = store.find_active_item_by_name(business_id, name).await? {
        return Ok(existing);
    }

    let item = store
        .insert_item(
            business_id,
            NewInventoryItem {
                name: name.to_string(),
                category: None,
                unit: key.unit.unwrap_or_else(|| "kg".to_string()),
                minimum_stock: Decimal::ZERO,
                cost_per_unit: key.cost_per_unit,
                supplier_id: key.supplier_id,
                supplier_name: key.supplier_name,
                expiry_date: None,
            },
        )
        .await?;

    tracing::info!(%business_id, item_id = %item.id, name = %item.name, "Inventory item created from purchase");
    Ok(item)
}

/// Create an item, recording any `initial_stock` as an opening Adjustment.
///
/// The store rejects a second active item with the same name as `DuplicateEntry`.
pub async fn create_item<S>(
    store: &mut S,
    business_id: Uuid,
    input: CreateItemRequest,
) -> AppResult<InventoryItem>
where
    S: LedgerStore + ?Sized,
{
    require_text("name", &input.name)?;
    require_text("unit", &input.unit)?;
    require_non_negative("minimum_stock", input.minimum_stock)?;
    require_quantity("minimum_stock", input.minimum_stock)?;
    require_non_negative("cost_per_unit", input.cost_per_unit)?;
    require_price("cost_per_unit", input.cost_per_unit)?;
    require_non_negative("initial_stock", input.initial_stock)?;
    require_quantity("initial_stock", input.initial_stock)?;

    let item = store
        .insert_item(
            business_id,
            NewInventoryItem {
                name: input.name.trim().to_string(),
                category: input.category,
                unit: input.unit,
                minimum_stock: input.minimum_stock,
                cost_per_unit: input.cost_per_unit,
                supplier_id: input.supplier_id,
                supplier_name: input.supplier_name,
                expiry_date: input.expiry_date,
            },
        )
        .await?;

    if input.initial_stock.is_zero() {
        return Ok(item);
    }
    let opening = record_movement(
        store,
        business_id,
        RecordMovement {
            item_id: item.id,
            delta: input.initial_stock,
            movement_type: MovementType::Adjustment,
            reference_id: None,
            reference_type: None,
            notes: Some("Opening stock".to_string()),
        },
    )
    .await?;

    Ok(InventoryItem {
        current_stock: opening.new_stock,
        ..item
    })
}

/// Soft delete an item. Its movements stay; recipes that name it stop drawing from it.
pub async fn deactivate_item<S>(store: &mut S, business_id: Uuid, item_id: Uuid) -> AppResult<()>
where
    S: LedgerStore + ?Sized,
{
    if !store.deactivate_item(business_id, item_id).await? {
        return Err(AppError::NotFound("Inventory item".to_string()));
    }
    tracing::info!(%business_id, %item_id, "Inventory item deactivated");
    Ok(())
}

/// Record a manual movement, `Adjustment` unless the caller says otherwise
pub async fn adjust_stock<S>(
    store: &mut S,
    business_id: Uuid,
    item_id: Uuid,
    request: AdjustStockRequest,
) -> AppResult<StockMovement>
where
    S: LedgerStore + ?Sized,
{
    let movement_type = request.movement_type.unwrap_or(MovementType::Adjustment);
    let reference_type = request
        .reference_id
        .map(|_| movement_type.as_str().to_lowercase());

    record_movement(
        store,
        business_id,
        RecordMovement {
            item_id,
            delta: request.quantity,
            movement_type,
            reference_id: request.reference_id,
            reference_type,
            notes: request.notes,
        },
    )
    .await
}

/// Active items at or below minimum, largest shortage first
pub async fn list_low_stock<S>(store: &mut S, business_id: Uuid) -> AppResult<Vec<LowStockItem>>
where
    S: LedgerStore + ?Sized,
{
    let items = store.list_items_at_minimum(business_id).await?;
    Ok(low_stock_report(items))
}

/// Movement history of one item, in recording order
pub async fn list_movements<S>(
    store: &mut S,
    business_id: Uuid,
    item_id: Uuid,
) -> AppResult<Vec<StockMovement>>
where
    S: LedgerStore + ?Sized,
{
    store
        .lock_item(business_id, item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;
    store.list_movements(business_id, item_id).await
}
