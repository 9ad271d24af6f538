//! Stock ledger tests
//!
//! Every stock change goes through `record_movement`: the level and the
//! movement row move together, or not at all.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use catering_server::error::{AppError, AppResult};
use catering_server::ledger::{self, AdjustStockRequest, CreateItemRequest, RecordMovement};
use catering_server::store::MemoryStore;
use shared::{InventoryItem, MovementType, StockMovement};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn item_request(name: &str, minimum: &str, initial: &str) -> CreateItemRequest {
    CreateItemRequest {
        name: name.to_string(),
        category: Some("Grains".to_string()),
        unit: "kg".to_string(),
        minimum_stock: dec(minimum),
        cost_per_unit: dec("120"),
        supplier_id: None,
        supplier_name: None,
        expiry_date: None,
        initial_stock: dec(initial),
    }
}

async fn create_item(
    store: &MemoryStore,
    business_id: Uuid,
    request: CreateItemRequest,
) -> AppResult<InventoryItem> {
    let mut tx = store.begin().await;
    let item = ledger::create_item(&mut tx, business_id, request).await?;
    tx.commit();
    Ok(item)
}

async fn adjust(
    store: &MemoryStore,
    business_id: Uuid,
    item_id: Uuid,
    quantity: Decimal,
) -> AppResult<StockMovement> {
    let mut tx = store.begin().await;
    let movement = ledger::adjust_stock(
        &mut tx,
        business_id,
        item_id,
        AdjustStockRequest {
            quantity,
            movement_type: None,
            reference_id: None,
            notes: None,
        },
    )
    .await?;
    tx.commit();
    Ok(movement)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_new_item_starts_empty() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();

        let item = create_item(&store, business_id, item_request("Ghee", "5", "0"))
            .await
            .unwrap();

        assert_eq!(item.current_stock, Decimal::ZERO);
        let state = store.snapshot().await;
        assert!(state.movements_for(item.id).is_empty());
    }

    #[tokio::test]
    async fn test_opening_stock_is_a_movement() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();

        let item = create_item(&store, business_id, item_request("Ghee", "5", "12.5"))
            .await
            .unwrap();

        assert_eq!(item.current_stock, dec("12.5"));
        let state = store.snapshot().await;
        let movements = state.movements_for(item.id);
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].movement_type, MovementType::Adjustment);
        assert_eq!(movements[0].previous_stock, Decimal::ZERO);
        assert_eq!(movements[0].new_stock, dec("12.5"));
        assert_eq!(state.items[&item.id].current_stock, dec("12.5"));
    }

    #[tokio::test]
    async fn test_negative_result_rejected_and_nothing_written() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();
        let item = create_item(&store, business_id, item_request("Saffron", "0", "2"))
            .await
            .unwrap();

        let result = adjust(&store, business_id, item.id, dec("-3")).await;
        assert!(matches!(result, Err(AppError::InsufficientInventory(_))));

        let state = store.snapshot().await;
        assert_eq!(state.items[&item.id].current_stock, dec("2"));
        assert_eq!(state.movements_for(item.id).len(), 1);
    }

    #[tokio::test]
    async fn test_zero_delta_rejected() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();
        let item = create_item(&store, business_id, item_request("Salt", "0", "1"))
            .await
            .unwrap();

        let result = adjust(&store, business_id, item.id, Decimal::ZERO).await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_drawing_to_exactly_zero_is_allowed() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();
        let item = create_item(&store, business_id, item_request("Cardamom", "1", "4"))
            .await
            .unwrap();

        let movement = adjust(&store, business_id, item.id, dec("-4")).await.unwrap();
        assert_eq!(movement.new_stock, Decimal::ZERO);
        assert_eq!(movement.quantity_change, dec("-4"));
    }

    #[tokio::test]
    async fn test_other_business_item_is_not_found() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let item = create_item(&store, owner, item_request("Rice", "0", "10"))
            .await
            .unwrap();

        let result = adjust(&store, Uuid::new_v4(), item.id, dec("1")).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_adjust_with_reference_tags_movement() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();
        let item = create_item(&store, business_id, item_request("Oil", "0", "0"))
            .await
            .unwrap();
        let reference = Uuid::new_v4();

        let mut tx = store.begin().await;
        let movement = ledger::adjust_stock(
            &mut tx,
            business_id,
            item.id,
            AdjustStockRequest {
                quantity: dec("8"),
                movement_type: Some(MovementType::Purchase),
                reference_id: Some(reference),
                notes: Some("Cash and carry".to_string()),
            },
        )
        .await
        .unwrap();
        tx.commit();

        assert_eq!(movement.movement_type, MovementType::Purchase);
        assert_eq!(movement.reference_id, Some(reference));
        assert_eq!(movement.reference_type.as_deref(), Some("purchase"));
    }

    #[tokio::test]
    async fn test_low_stock_ordered_by_shortage() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();
        create_item(&store, business_id, item_request("Lentils", "10", "8"))
            .await
            .unwrap();
        create_item(&store, business_id, item_request("Chickpeas", "20", "5"))
            .await
            .unwrap();
        create_item(&store, business_id, item_request("Flour", "5", "50"))
            .await
            .unwrap();
        create_item(&store, business_id, item_request("Sugar", "3", "3"))
            .await
            .unwrap();

        let mut tx = store.begin().await;
        let report = ledger::list_low_stock(&mut tx, business_id).await.unwrap();
        drop(tx);

        let names: Vec<&str> = report.iter().map(|l| l.item.name.as_str()).collect();
        assert_eq!(names, vec!["Chickpeas", "Lentils", "Sugar"]);
        assert_eq!(report[0].shortage, dec("15"));
        assert_eq!(report[2].shortage, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_movements_listed_oldest_first() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();
        let item = create_item(&store, business_id, item_request("Yogurt", "0", "10"))
            .await
            .unwrap();
        adjust(&store, business_id, item.id, dec("-4")).await.unwrap();
        adjust(&store, business_id, item.id, dec("6")).await.unwrap();

        let mut tx = store.begin().await;
        let movements = ledger::list_movements(&mut tx, business_id, item.id)
            .await
            .unwrap();
        drop(tx);

        let levels: Vec<Decimal> = movements.iter().map(|m| m.new_stock).collect();
        assert_eq!(levels, vec![dec("10"), dec("6"), dec("12")]);
    }

    #[tokio::test]
    async fn test_movements_in_one_unit_keep_recording_order() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();

        let mut tx = store.begin().await;
        let item = ledger::create_item(&mut tx, business_id, item_request("Lentils", "0", "10"))
            .await
            .unwrap();
        for delta in ["5", "-3", "1"] {
            ledger::record_movement(
                &mut tx,
                business_id,
                RecordMovement {
                    item_id: item.id,
                    delta: dec(delta),
                    movement_type: MovementType::Adjustment,
                    reference_id: None,
                    reference_type: None,
                    notes: None,
                },
            )
            .await
            .unwrap();
        }
        let movements = ledger::list_movements(&mut tx, business_id, item.id)
            .await
            .unwrap();
        tx.commit();

        let levels: Vec<Decimal> = movements.iter().map(|m| m.new_stock).collect();
        assert_eq!(levels, vec![dec("10"), dec("15"), dec("12"), dec("13")]);
    }

    #[tokio::test]
    async fn test_deactivated_item_is_gone_from_the_ledger() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();
        let item = create_item(&store, business_id, item_request("Ghee", "2", "8"))
            .await
            .unwrap();

        let mut tx = store.begin().await;
        ledger::deactivate_item(&mut tx, business_id, item.id)
            .await
            .unwrap();
        let again = ledger::deactivate_item(&mut tx, business_id, item.id).await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
        tx.commit();

        let result = adjust(&store, business_id, item.id, dec("1")).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let state = store.snapshot().await;
        assert!(!state.items[&item.id].is_active);
        assert_eq!(state.items[&item.id].current_stock, dec("8"));
        assert_eq!(state.movements_for(item.id).len(), 1);
    }

    #[tokio::test]
    async fn test_excess_precision_rejected() {
        let store = MemoryStore::new();
        let business_id = Uuid::new_v4();
        let item = create_item(&store, business_id, item_request("Salt", "0", "1"))
            .await
            .unwrap();

        let result = adjust(&store, business_id, item.id, dec("0.0001")).await;
        assert!(matches!(
            result,
            Err(AppError::Validation { ref field, .. }) if field == "quantity_change"
        ));

        let priced = CreateItemRequest {
            cost_per_unit: dec("1.005"),
            ..item_request("Pepper", "0", "0")
        };
        let created = create_item(&store, business_id, priced).await;
        assert!(matches!(created, Err(AppError::Validation { .. })));

        let state = store.snapshot().await;
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[&item.id].current_stock, dec("1"));
    }

    #[tokio::test]
    async fn test_record_movement_on_missing_item() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await;
        let result = ledger::record_movement(
            &mut tx,
            Uuid::new_v4(),
            RecordMovement {
                item_id: Uuid::new_v4(),
                delta: dec("1"),
                movement_type: MovementType::Adjustment,
                reference_id: None,
                reference_type: None,
                notes: None,
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Stock equals opening level plus the sum of accepted deltas, and each
    /// movement's level change equals its recorded delta
    #[test]
    fn prop_stock_conservation(
        opening in 0i64..500,
        deltas in prop::collection::vec(-200i64..200, 1..20),
    ) {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let business_id = Uuid::new_v4();
            let item = create_item(
                &store,
                business_id,
                item_request("Rice", "0", &opening.to_string()),
            )
            .await
            .unwrap();

            let mut expected = Decimal::from(opening);
            for delta in deltas {
                let delta = Decimal::from(delta);
                match adjust(&store, business_id, item.id, delta).await {
                    Ok(_) => expected += delta,
                    Err(AppError::InsufficientInventory(_)) => {
                        assert!(expected + delta < Decimal::ZERO)
                    }
                    Err(AppError::Validation { .. }) => assert!(delta.is_zero()),
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }

            let state = store.snapshot().await;
            assert_eq!(state.items[&item.id].current_stock, expected);
            assert!(expected >= Decimal::ZERO);

            let movements = state.movements_for(item.id);
            let total: Decimal = movements.iter().map(|m| m.quantity_change).sum();
            assert_eq!(total, expected);
            for m in movements {
                assert_eq!(m.new_stock - m.previous_stock, m.quantity_change);
            }
        });
    }
}
