//! Order settlement tests
//!
//! Covers order pricing, advance and balance tracking, optimistic version
//! checks, the closed state and ingredient consumption on kitchen start.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use catering_server::error::{AppError, AppResult};
use catering_server::ledger::{
    self, CreateItemRequest, MenuIngredientInput, NewMenuItemRequest, NewOrderRequest,
    UpdateOrderRequest,
};
use catering_server::store::MemoryStore;
use shared::{
    ClientType, InventoryItem, MenuItemWithIngredients, MovementType, Order, OrderLineInput,
    OrderStatus, OrderWithLines,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn per_head_order(guests: i32, price_per_head: &str) -> NewOrderRequest {
    NewOrderRequest {
        client_name: "Ayesha & Bilal".to_string(),
        client_type: ClientType::Wedding,
        event_date: NaiveDate::from_ymd_opt(2024, 12, 14).unwrap(),
        event_type: Some("Walima".to_string()),
        event_location: Some("Pearl Continental, Lahore".to_string()),
        guest_count: guests,
        price_per_head: dec(price_per_head),
        notes: None,
        items: None,
    }
}

async fn create_order(
    store: &MemoryStore,
    business_id: Uuid,
    request: NewOrderRequest,
) -> AppResult<OrderWithLines> {
    let mut tx = store.begin().await;
    let order = ledger::create_order(&mut tx, business_id, request).await?;
    tx.commit();
    Ok(order)
}

async fn update(
    store: &MemoryStore,
    business_id: Uuid,
    order_id: Uuid,
    request: UpdateOrderRequest,
) -> AppResult<Order> {
    let mut tx = store.begin().await;
    let order = ledger::update_order(&mut tx, business_id, order_id, request).await?;
    tx.commit();
    Ok(order)
}

fn to_status(status: OrderStatus) -> UpdateOrderRequest {
    UpdateOrderRequest {
        status: Some(status),
        ..Default::default()
    }
}

/// Stocked ingredient plus a dish drawing `per_serving` of it
async fn dish_with_ingredient(
    store: &MemoryStore,
    business_id: Uuid,
    stock: &str,
    per_serving: &str,
) -> (InventoryItem, MenuItemWithIngredients) {
    let mut tx = store.begin().await;
    let item = ledger::create_item(
        &mut tx,
        business_id,
        CreateItemRequest {
            name: "Basmati Rice".to_string(),
            category: None,
            unit: "kg".to_string(),
            minimum_stock: dec("5"),
            cost_per_unit: dec("120"),
            supplier_id: None,
            supplier_name: None,
            expiry_date: None,
            initial_stock: dec(stock),
        },
    )
    .await
    .unwrap();
    let dish = ledger::create_menu_item(
        &mut tx,
        business_id,
        NewMenuItemRequest {
            name: "Chicken Biryani".to_string(),
            description: None,
            category: "Main Course".to_string(),
            cost_per_serving: dec("180"),
            selling_price: dec("450"),
            is_available: true,
            is_vegetarian: false,
            prep_time_minutes: Some(90),
            image_url: None,
            ingredients: vec![MenuIngredientInput {
                inventory_item_id: Some(item.id),
                ingredient_name: "Basmati Rice".to_string(),
                quantity_required: dec(per_serving),
                unit: Some("kg".to_string()),
            }],
        },
    )
    .await
    .unwrap();
    tx.commit();
    (item, dish)
}

fn biryani_order(dish: &MenuItemWithIngredients, servings: &str) -> NewOrderRequest {
    NewOrderRequest {
        items: Some(vec![OrderLineInput {
            menu_item_id: Some(dish.item.id),
            item_name: dish.item.name.clone(),
            quantity: dec(servings),
            unit_price: dish.item.selling_price,
        }]),
        ..per_head_order(0, "0")
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_per_head_pricing_and_advance() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();

        let created = create_order(&store, business_id, per_head_order(50, "500"))
            .await
            .unwrap();
        let order = created.order;
        assert_eq!(order.total_value, dec("25000"));
        assert_eq!(order.remaining_balance, dec("25000"));
        assert_eq!(order.status, OrderStatus::Inquiry);
        assert_eq!(order.version, 1);
        assert!(order.order_number.starts_with("ORD-"));

        let updated = update(
            &store,
            business_id,
            order.id,
            UpdateOrderRequest {
                advance_received: Some(dec("10000")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.advance_received, dec("10000"));
        assert_eq!(updated.remaining_balance, dec("15000"));
        assert_eq!(updated.version, 2);
    }

    #[tokio::test]
    async fn test_itemized_order_priced_by_lines() {
        let store = MemoryStore::new();
        let request = NewOrderRequest {
            items: Some(vec![
                OrderLineInput {
                    menu_item_id: None,
                    item_name: "Mutton Karahi".to_string(),
                    quantity: dec("40"),
                    unit_price: dec("650"),
                },
                OrderLineInput {
                    menu_item_id: None,
                    item_name: "Kheer".to_string(),
                    quantity: dec("40"),
                    unit_price: dec("150"),
                },
            ]),
            ..per_head_order(40, "999")
        };

        let created = create_order(&store, Uuid::new_v4(), request).await.unwrap();
        assert_eq!(created.order.total_value, dec("32000"));
        assert_eq!(created.items.len(), 2);
        assert_eq!(created.items[0].total_price, dec("26000"));
    }

    #[tokio::test]
    async fn test_advance_above_total_rejected() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();
        let order = create_order(&store, business_id, per_head_order(10, "100"))
            .await
            .unwrap()
            .order;

        let result = update(
            &store,
            business_id,
            order.id,
            UpdateOrderRequest {
                advance_received: Some(dec("1000.01")),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation { .. })));

        let negative = update(
            &store,
            business_id,
            order.id,
            UpdateOrderRequest {
                advance_received: Some(dec("-1")),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(negative, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();
        let order = create_order(&store, business_id, per_head_order(10, "100"))
            .await
            .unwrap()
            .order;

        update(
            &store,
            business_id,
            order.id,
            UpdateOrderRequest {
                status: Some(OrderStatus::Confirmed),
                expected_version: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let stale = update(
            &store,
            business_id,
            order.id,
            UpdateOrderRequest {
                advance_received: Some(dec("500")),
                expected_version: Some(1),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(stale, Err(AppError::Conflict { .. })));

        let state = store.snapshot().await;
        assert_eq!(state.orders[&order.id].advance_received, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_closed_is_terminal() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();
        let order = create_order(&store, business_id, per_head_order(10, "100"))
            .await
            .unwrap()
            .order;

        update(&store, business_id, order.id, to_status(OrderStatus::Closed))
            .await
            .unwrap();

        let reopened = update(&store, business_id, order.id, to_status(OrderStatus::Delivered)).await;
        assert!(matches!(reopened, Err(AppError::InvalidStateTransition(_))));

        // Recording a final advance on a closed order is still allowed
        let paid = update(
            &store,
            business_id,
            order.id,
            UpdateOrderRequest {
                advance_received: Some(dec("1000")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(paid.remaining_balance, Decimal::ZERO);
        assert_eq!(paid.status, OrderStatus::Closed);
    }

    #[tokio::test]
    async fn test_backward_move_allowed() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();
        let order = create_order(&store, business_id, per_head_order(10, "100"))
            .await
            .unwrap()
            .order;

        update(&store, business_id, order.id, to_status(OrderStatus::Confirmed))
            .await
            .unwrap();
        let back = update(&store, business_id, order.id, to_status(OrderStatus::Inquiry))
            .await
            .unwrap();
        assert_eq!(back.status, OrderStatus::Inquiry);
    }

    #[tokio::test]
    async fn test_kitchen_start_consumes_ingredients_once() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();
        let (rice, dish) = dish_with_ingredient(&store, business_id, "100", "0.25").await;
        let order = create_order(&store, business_id, biryani_order(&dish, "200"))
            .await
            .unwrap()
            .order;
        assert_eq!(order.total_value, dec("90000"));

        update(&store, business_id, order.id, to_status(OrderStatus::Confirmed))
            .await
            .unwrap();
        assert_eq!(
            store.snapshot().await.items[&rice.id].current_stock,
            dec("100")
        );

        let started = update(&store, business_id, order.id, to_status(OrderStatus::InProgress))
            .await
            .unwrap();
        assert!(started.stock_consumed_at.is_some());

        update(&store, business_id, order.id, to_status(OrderStatus::Delivered))
            .await
            .unwrap();
        update(&store, business_id, order.id, to_status(OrderStatus::InProgress))
            .await
            .unwrap();

        let state = store.snapshot().await;
        assert_eq!(state.items[&rice.id].current_stock, dec("50"));
        let consumption: Vec<_> = state
            .movements_for(rice.id)
            .into_iter()
            .filter(|m| m.movement_type == MovementType::Consumption)
            .collect();
        assert_eq!(consumption.len(), 1);
        assert_eq!(consumption[0].quantity_change, dec("-50"));
        assert_eq!(consumption[0].reference_id, Some(order.id));
        assert_eq!(consumption[0].reference_type.as_deref(), Some("order"));
    }

    #[tokio::test]
    async fn test_short_stock_rolls_back_status_change() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();
        let (rice, dish) = dish_with_ingredient(&store, business_id, "10", "0.25").await;
        let order = create_order(&store, business_id, biryani_order(&dish, "100"))
            .await
            .unwrap()
            .order;

        let result = update(
            &store,
            business_id,
            order.id,
            UpdateOrderRequest {
                status: Some(OrderStatus::InProgress),
                advance_received: Some(dec("5000")),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::InsufficientInventory(_))));

        let state = store.snapshot().await;
        let stored = &state.orders[&order.id];
        assert_eq!(stored.status, OrderStatus::Inquiry);
        assert_eq!(stored.advance_received, Decimal::ZERO);
        assert_eq!(stored.version, 1);
        assert!(stored.stock_consumed_at.is_none());
        assert_eq!(state.items[&rice.id].current_stock, dec("10"));
    }

    #[tokio::test]
    async fn test_apply_and_reverse_payment() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();
        let order = create_order(&store, business_id, per_head_order(50, "500"))
            .await
            .unwrap()
            .order;

        let mut tx = store.begin().await;
        let paid = ledger::apply_payment(&mut tx, business_id, order.id, dec("7500"))
            .await
            .unwrap();
        assert_eq!(paid.remaining_balance, dec("17500"));
        let refunded = ledger::reverse_payment(&mut tx, business_id, order.id, dec("2500"))
            .await
            .unwrap();
        tx.commit();
        assert_eq!(refunded.advance_received, dec("5000"));
        assert_eq!(refunded.remaining_balance, dec("20000"));

        let mut tx = store.begin().await;
        let overpaid = ledger::apply_payment(&mut tx, business_id, order.id, dec("20000.01")).await;
        assert!(matches!(overpaid, Err(AppError::Validation { .. })));
        let zero = ledger::apply_payment(&mut tx, business_id, order.id, Decimal::ZERO).await;
        assert!(matches!(zero, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_invalid_new_orders_rejected() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();

        let blank = NewOrderRequest {
            client_name: "  ".to_string(),
            ..per_head_order(10, "100")
        };
        assert!(matches!(
            create_order(&store, business_id, blank).await,
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            create_order(&store, business_id, per_head_order(-1, "100")).await,
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            create_order(&store, business_id, per_head_order(10, "-5")).await,
            Err(AppError::Validation { .. })
        ));
        assert!(store.snapshot().await.orders.is_empty());
    }

    #[tokio::test]
    async fn test_order_lines_must_reference_own_menu_items() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();
        let (_, dish) = dish_with_ingredient(&store, business_id, "100", "0.25").await;

        let mut unknown = biryani_order(&dish, "10");
        if let Some(lines) = unknown.items.as_mut() {
            lines[0].menu_item_id = Some(Uuid::new_v4());
        }
        let result = create_order(&store, business_id, unknown).await;
        assert!(matches!(
            result,
            Err(AppError::Validation { ref field, .. }) if field == "menu_item_id"
        ));

        // Another business's dish is invisible here
        let foreign = create_order(&store, Uuid::new_v4(), biryani_order(&dish, "10")).await;
        assert!(matches!(foreign, Err(AppError::Validation { .. })));
        assert!(store.snapshot().await.orders.is_empty());
    }

    #[tokio::test]
    async fn test_deactivated_ingredient_skipped_on_kitchen_start() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();
        let (rice, dish) = dish_with_ingredient(&store, business_id, "100", "0.25").await;
        let order = create_order(&store, business_id, biryani_order(&dish, "40"))
            .await
            .unwrap()
            .order;

        let mut tx = store.begin().await;
        ledger::deactivate_item(&mut tx, business_id, rice.id)
            .await
            .unwrap();
        tx.commit();

        let started = update(&store, business_id, order.id, to_status(OrderStatus::InProgress))
            .await
            .unwrap();
        assert_eq!(started.status, OrderStatus::InProgress);
        assert!(started.stock_consumed_at.is_some());

        let state = store.snapshot().await;
        assert_eq!(state.items[&rice.id].current_stock, dec("100"));
        assert!(state
            .movements_for(rice.id)
            .iter()
            .all(|m| m.movement_type != MovementType::Consumption));
    }

    #[tokio::test]
    async fn test_captured_payment_over_balance_left_unapplied() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();
        let order = create_order(&store, business_id, per_head_order(10, "100"))
            .await
            .unwrap()
            .order;
        update(
            &store,
            business_id,
            order.id,
            UpdateOrderRequest {
                advance_received: Some(dec("600")),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let mut tx = store.begin().await;
        let applied = ledger::apply_captured_payment(&mut tx, business_id, order.id, dec("500"))
            .await
            .unwrap();
        assert!(applied.is_none());
        tx.commit();

        let stored = store.snapshot().await.orders[&order.id].clone();
        assert_eq!(stored.advance_received, dec("600"));
        assert_eq!(stored.version, 2);

        let mut tx = store.begin().await;
        let fits = ledger::apply_captured_payment(&mut tx, business_id, order.id, dec("400"))
            .await
            .unwrap()
            .unwrap();
        tx.commit();
        assert_eq!(fits.remaining_balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_refund_reversal_stops_at_zero_advance() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();
        let order = create_order(&store, business_id, per_head_order(10, "100"))
            .await
            .unwrap()
            .order;
        update(
            &store,
            business_id,
            order.id,
            UpdateOrderRequest {
                advance_received: Some(dec("300")),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let mut tx = store.begin().await;
        let reversed = ledger::reverse_refunded_payment(&mut tx, business_id, order.id, dec("500"))
            .await
            .unwrap();
        tx.commit();
        assert_eq!(reversed.advance_received, Decimal::ZERO);
        assert_eq!(reversed.remaining_balance, dec("1000"));
    }

    #[tokio::test]
    async fn test_oversized_orders_rejected() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();

        let per_head = create_order(
            &store,
            business_id,
            per_head_order(2_000_000_000, "9999999999.99"),
        )
        .await;
        assert!(matches!(per_head, Err(AppError::Validation { .. })));

        let huge_line = NewOrderRequest {
            items: Some(vec![OrderLineInput {
                menu_item_id: None,
                item_name: "Mutton Karahi".to_string(),
                quantity: dec("999999999.999"),
                unit_price: dec("9999999999.99"),
            }]),
            ..per_head_order(0, "0")
        };
        let itemized = create_order(&store, business_id, huge_line).await;
        assert!(matches!(itemized, Err(AppError::Validation { .. })));

        let fractional_cents = create_order(&store, business_id, per_head_order(10, "100.005")).await;
        assert!(matches!(fractional_cents, Err(AppError::Validation { .. })));
        assert!(store.snapshot().await.orders.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_order_not_found() {
        let store = MemoryStore::new();
        let result = update(&store, Uuid::new_v4(), Uuid::new_v4(), to_status(OrderStatus::Confirmed)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Remaining balance always equals total minus advance, and an advance
    /// outside [0, total] never reaches storage
    #[test]
    fn prop_balance_identity(
        guests in 0i32..500,
        price_cents in 0i64..200_000,
        advances in prop::collection::vec(-10_000i64..2_000_000, 1..10),
    ) {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let business_id = Uuid::new_v4();
            let request = NewOrderRequest {
                price_per_head: Decimal::new(price_cents, 2),
                ..per_head_order(guests, "0")
            };
            let order = create_order(&store, business_id, request).await.unwrap().order;
            let total = order.total_value;

            for cents in advances {
                let advance = Decimal::new(cents, 2);
                let result = update(
                    &store,
                    business_id,
                    order.id,
                    UpdateOrderRequest {
                        advance_received: Some(advance),
                        ..Default::default()
                    },
                )
                .await;
                let valid = advance >= Decimal::ZERO && advance <= total;
                assert_eq!(result.is_ok(), valid);
            }

            let state = store.snapshot().await;
            let stored = &state.orders[&order.id];
            assert_eq!(stored.remaining_balance, stored.total_value - stored.advance_received);
            assert!(stored.advance_received >= Decimal::ZERO);
            assert!(stored.advance_received <= stored.total_value);
        });
    }

    /// Whatever path the status takes, ingredients are drawn at most once
    #[test]
    fn prop_consumption_at_most_once(
        path in prop::collection::vec(0usize..4, 1..12),
    ) {
        let statuses = [
            OrderStatus::Inquiry,
            OrderStatus::Confirmed,
            OrderStatus::InProgress,
            OrderStatus::Delivered,
        ];
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let business_id = Uuid::new_v4();
            let (rice, dish) = dish_with_ingredient(&store, business_id, "1000", "0.5").await;
            let order = create_order(&store, business_id, biryani_order(&dish, "10"))
                .await
                .unwrap()
                .order;

            let mut reached_kitchen = false;
            for i in &path {
                let status = statuses[*i];
                update(&store, business_id, order.id, to_status(status)).await.unwrap();
                reached_kitchen |= status.consumes_stock();
            }

            let state = store.snapshot().await;
            let expected = if reached_kitchen { dec("995") } else { dec("1000") };
            assert_eq!(state.items[&rice.id].current_stock, expected);
            assert_eq!(state.orders[&order.id].stock_consumed_at.is_some(), reached_kitchen);
        });
    }
}
