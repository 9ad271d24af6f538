//! Purchase intake: a purchase order and its stock receipts land together

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::stock::{record_movement, resolve_or_create_item, RecordMovement, ResolveItem};
use crate::error::AppResult;
use crate::store::{LedgerStore, NewPurchase, NewPurchaseLine};
use shared::{
    generate_reference_number, purchase_total, MovementType, PurchaseLineInput,
    PurchaseWithLines, ReferencePrefix,
};

#[derive(Debug, Clone, Deserialize)]
pub struct NewPurchaseRequest {
    pub supplier_id: Option<Uuid>,
    pub supplier_name: Option<String>,
    pub purchase_date: NaiveDate,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<PurchaseLineInput>,
}

/// Record a purchase order, receiving every line into stock.
///
/// All lines are validated before anything is written. The caller commits
/// the store; any error leaves it to be rolled back.
pub async fn create_purchase<S>(
    store: &mut S,
    business_id: Uuid,
    request: NewPurchaseRequest,
) -> AppResult<PurchaseWithLines>
where
    S: LedgerStore + ?Sized,
{
    for line in &request.items {
        line.validate()?;
    }

    let total_amount = purchase_total(&request.items)?;
    let purchase_order_number = generate_reference_number(ReferencePrefix::PurchaseOrder, Utc::now());

    let purchase = store
        .insert_purchase(
            business_id,
            NewPurchase {
                purchase_order_number,
                supplier_id: request.supplier_id,
                supplier_name: request.supplier_name.clone(),
                purchase_date: request.purchase_date,
                total_amount,
                notes: request.notes,
            },
        )
        .await?;

    let mut items = Vec::with_capacity(request.items.len());
    for line in request.items {
        let total_price = line.total()?;
        let item = resolve_or_create_item(
            store,
            business_id,
            ResolveItem {
                name: line.ingredient_name.clone(),
                unit: line.unit.clone(),
                cost_per_unit: line.unit_price,
                supplier_id: request.supplier_id,
                supplier_name: request.supplier_name.clone(),
            },
        )
        .await?;

        record_movement(
            store,
            business_id,
            RecordMovement {
                item_id: item.id,
                delta: line.quantity,
                movement_type: MovementType::Purchase,
                reference_id: Some(purchase.id),
                reference_type: Some("purchase".to_string()),
                notes: None,
            },
        )
        .await?;

        let row = store
            .insert_purchase_line(NewPurchaseLine {
                purchase_id: purchase.id,
                inventory_item_id: item.id,
                ingredient_name: item.name,
                quantity: line.quantity,
                unit: line.unit,
                unit_price: line.unit_price,
                total_price,
            })
            .await?;
        items.push(row);
    }

    tracing::info!(
        %business_id,
        purchase_id = %purchase.id,
        number = %purchase.purchase_order_number,
        lines = items.len(),
        total = %purchase.total_amount,
        "Purchase recorded"
    );

    Ok(PurchaseWithLines { purchase, items })
}
