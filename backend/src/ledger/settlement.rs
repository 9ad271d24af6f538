//! Order settlement: contract value, advance and balance, plus the
//! ingredient draw when kitchen work starts

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::stock::{record_movement, RecordMovement};
use crate::error::{AppError, AppResult};
use crate::store::{LedgerStore, NewOrder, NewOrderLine, OrderSettlement};
use shared::{
    generate_reference_number, ingredient_requirement, order_total_value, remaining_balance,
    require_non_negative, require_positive, require_price, require_text, ClientType,
    MovementType, Order, OrderLineInput, OrderStatus, OrderWithLines, ReferencePrefix,
    RuleViolation,
};

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderRequest {
    pub client_name: String,
    pub client_type: ClientType,
    pub event_date: NaiveDate,
    pub event_type: Option<String>,
    pub event_location: Option<String>,
    #[serde(default)]
    pub guest_count: i32,
    #[serde(default)]
    pub price_per_head: Decimal,
    pub notes: Option<String>,
    pub items: Option<Vec<OrderLineInput>>,
}

/// Partial update; omitted fields keep their stored values
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub advance_received: Option<Decimal>,
    /// Reject the update if the order changed since this version was read
    pub expected_version: Option<i32>,
}

/// Create an order in `Inquiry` with nothing paid
pub async fn create_order<S>(
    store: &mut S,
    business_id: Uuid,
    request: NewOrderRequest,
) -> AppResult<OrderWithLines>
where
    S: LedgerStore + ?Sized,
{
    require_text("client_name", &request.client_name)?;
    if request.guest_count < 0 {
        return Err(AppError::validation("guest_count", "guest_count cannot be negative"));
    }
    require_non_negative("price_per_head", request.price_per_head)?;
    require_price("price_per_head", request.price_per_head)?;
    let lines = request.items.unwrap_or_default();
    for line in &lines {
        line.validate()?;
    }
    for menu_item_id in lines.iter().filter_map(|l| l.menu_item_id) {
        if store.find_menu_item(business_id, menu_item_id).await?.is_none() {
            return Err(AppError::validation(
                "menu_item_id",
                format!("Menu item {} does not exist", menu_item_id),
            ));
        }
    }

    let total_value =
        order_total_value(request.guest_count, request.price_per_head, Some(lines.as_slice()))?;
    let order_number = generate_reference_number(ReferencePrefix::Order, Utc::now());

    let order = store
        .insert_order(
            business_id,
            NewOrder {
                order_number,
                client_name: request.client_name.trim().to_string(),
                client_type: request.client_type,
                event_date: request.event_date,
                event_type: request.event_type,
                event_location: request.event_location,
                guest_count: request.guest_count,
                price_per_head: request.price_per_head,
                total_value,
                notes: request.notes,
            },
        )
        .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let total_price = line.total()?;
        let row = store
            .insert_order_line(NewOrderLine {
                order_id: order.id,
                menu_item_id: line.menu_item_id,
                item_name: line.item_name,
                quantity: line.quantity,
                unit_price: line.unit_price,
                total_price,
            })
            .await?;
        items.push(row);
    }

    tracing::info!(
        %business_id,
        order_id = %order.id,
        number = %order.order_number,
        total_value = %order.total_value,
        "Order created"
    );

    Ok(OrderWithLines { order, items })
}

/// Change status and/or advance, recomputing the balance from the stored total.
pub async fn update_order<S>(
    store: &mut S,
    business_id: Uuid,
    order_id: Uuid,
    request: UpdateOrderRequest,
) -> AppResult<Order>
where
    S: LedgerStore + ?Sized,
{
    let order = lock_order(store, business_id, order_id).await?;

    if let Some(expected) = request.expected_version {
        if expected != order.version {
            return Err(AppError::Conflict {
                resource: "order".to_string(),
                message: format!(
                    "Order was modified (version {} is now {})",
                    expected, order.version
                ),
            });
        }
    }

    let status = request.status.unwrap_or(order.status);
    let advance = request.advance_received.unwrap_or(order.advance_received);
    settle(store, business_id, order, status, advance).await
}

/// Add a received client payment to the order's advance
pub async fn apply_payment<S>(
    store: &mut S,
    business_id: Uuid,
    order_id: Uuid,
    amount: Decimal,
) -> AppResult<Order>
where
    S: LedgerStore + ?Sized,
{
    require_positive("amount", amount)?;
    let order = lock_order(store, business_id, order_id).await?;
    let advance = add_to_advance(&order, amount)?;
    let status = order.status;
    settle(store, business_id, order, status, advance).await
}

/// Apply money the processor has already captured.
///
/// Returns `None`, leaving the order untouched, when the amount no longer
/// fits the balance. The payment then stays unapplied for manual settlement.
pub async fn apply_captured_payment<S>(
    store: &mut S,
    business_id: Uuid,
    order_id: Uuid,
    amount: Decimal,
) -> AppResult<Option<Order>>
where
    S: LedgerStore + ?Sized,
{
    require_positive("amount", amount)?;
    let order = lock_order(store, business_id, order_id).await?;
    let advance = add_to_advance(&order, amount)?;
    if advance > order.total_value {
        tracing::error!(
            %business_id,
            order_id = %order.id,
            amount = %amount,
            remaining_balance = %order.remaining_balance,
            "Captured payment exceeds the order balance and was not applied"
        );
        return Ok(None);
    }
    let status = order.status;
    settle(store, business_id, order, status, advance).await.map(Some)
}

/// Take a refunded amount back out of the order's advance
pub async fn reverse_payment<S>(
    store: &mut S,
    business_id: Uuid,
    order_id: Uuid,
    amount: Decimal,
) -> AppResult<Order>
where
    S: LedgerStore + ?Sized,
{
    require_positive("amount", amount)?;
    let order = lock_order(store, business_id, order_id).await?;
    let advance = order.advance_received - amount;
    let status = order.status;
    settle(store, business_id, order, status, advance).await
}

/// Take a refund back out of the advance, never below zero.
///
/// A manual edit may already have lowered the advance; the refund still goes
/// through and only what is left of the advance is reversed.
pub async fn reverse_refunded_payment<S>(
    store: &mut S,
    business_id: Uuid,
    order_id: Uuid,
    amount: Decimal,
) -> AppResult<Order>
where
    S: LedgerStore + ?Sized,
{
    require_positive("amount", amount)?;
    let order = lock_order(store, business_id, order_id).await?;
    let reversed = amount.min(order.advance_received);
    if reversed < amount {
        tracing::warn!(
            %business_id,
            order_id = %order.id,
            refund = %amount,
            advance_received = %order.advance_received,
            "Refund exceeds the recorded advance"
        );
    }
    let advance = order.advance_received - reversed;
    let status = order.status;
    settle(store, business_id, order, status, advance).await
}

fn add_to_advance(order: &Order, amount: Decimal) -> Result<Decimal, RuleViolation> {
    order
        .advance_received
        .checked_add(amount)
        .ok_or(RuleViolation::OutOfRange {
            field: "advance_received",
        })
}

async fn lock_order<S>(store: &mut S, business_id: Uuid, order_id: Uuid) -> AppResult<Order>
where
    S: LedgerStore + ?Sized,
{
    store
        .lock_order(business_id, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))
}

async fn settle<S>(
    store: &mut S,
    business_id: Uuid,
    order: Order,
    status: OrderStatus,
    advance: Decimal,
) -> AppResult<Order>
where
    S: LedgerStore + ?Sized,
{
    if order.status.is_terminal() && status != order.status {
        return Err(AppError::InvalidStateTransition(format!(
            "Order {} is closed",
            order.order_number
        )));
    }
    if status.is_backward_from(order.status) {
        tracing::warn!(
            order_id = %order.id,
            from = order.status.as_str(),
            to = status.as_str(),
            "Order status moved backwards"
        );
    }

    let remaining = remaining_balance(order.total_value, advance)?;

    let mut stock_consumed_at = order.stock_consumed_at;
    if stock_consumed_at.is_none() && status.consumes_stock() {
        consume_ingredients(store, business_id, &order).await?;
        stock_consumed_at = Some(Utc::now());
    }

    let updated = store
        .update_order_settlement(
            order.id,
            OrderSettlement {
                status,
                advance_received: advance,
                remaining_balance: remaining,
                stock_consumed_at,
            },
        )
        .await?;

    tracing::info!(
        %business_id,
        order_id = %updated.id,
        status = updated.status.as_str(),
        advance_received = %updated.advance_received,
        remaining_balance = %updated.remaining_balance,
        "Order settled"
    );

    Ok(updated)
}

/// Draw recipe quantities for every menu line from stock.
///
/// Ingredients whose inventory item has since been deactivated are skipped.
async fn consume_ingredients<S>(store: &mut S, business_id: Uuid, order: &Order) -> AppResult<()>
where
    S: LedgerStore + ?Sized,
{
    let lines = store.list_order_lines(order.id).await?;
    for line in lines {
        let Some(menu_item_id) = line.menu_item_id else {
            continue;
        };
        let ingredients = store.list_menu_ingredients(menu_item_id).await?;
        for ingredient in ingredients {
            let Some(item_id) = ingredient.inventory_item_id else {
                continue;
            };
            let needed = ingredient_requirement(ingredient.quantity_required, line.quantity)?;
            if needed <= Decimal::ZERO {
                continue;
            }
            if store.lock_item(business_id, item_id).await?.is_none() {
                tracing::warn!(
                    order_id = %order.id,
                    %item_id,
                    ingredient = %ingredient.ingredient_name,
                    dish = %line.item_name,
                    "Skipping ingredient with no active inventory item"
                );
                continue;
            }
            record_movement(
                store,
                business_id,
                RecordMovement {
                    item_id,
                    delta: -needed,
                    movement_type: MovementType::Consumption,
                    reference_id: Some(order.id),
                    reference_type: Some("order".to_string()),
                    notes: Some(format!("{} for {}", line.item_name, order.order_number)),
                },
            )
            .await?;
        }
    }
    Ok(())
}
