//! In-memory store with the same transactional contract as Postgres.
//!
//! A unit of work holds the whole state lock, so concurrent work is
//! serialised. Dropping it uncommitted restores the state it started from.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{
    LedgerStore, MenuItemFields, NewInventoryItem, NewMenuIngredient, NewOrder, NewOrderLine,
    NewPurchase, NewPurchaseLine, NewStockMovement, OrderSettlement,
};
use crate::error::{AppError, AppResult};
use shared::{
    InventoryItem, MenuIngredient, MenuItem, Order, OrderLine, OrderStatus, PaymentStatus,
    Purchase, PurchaseLine, PurchaseStatus, StockMovement,
};

/// Everything the ledger persists, as plain collections
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub items: HashMap<Uuid, InventoryItem>,
    pub movements: Vec<StockMovement>,
    pub purchases: Vec<Purchase>,
    pub purchase_lines: Vec<PurchaseLine>,
    pub orders: HashMap<Uuid, Order>,
    pub order_lines: Vec<OrderLine>,
    pub menu_items: HashMap<Uuid, MenuItem>,
    pub menu_ingredients: Vec<MenuIngredient>,
}

impl MemoryState {
    pub fn item_named(&self, business_id: Uuid, name: &str) -> Option<&InventoryItem> {
        self.items
            .values()
            .find(|i| i.business_id == business_id && i.is_active && i.name == name)
    }

    pub fn movements_for(&self, item_id: Uuid) -> Vec<&StockMovement> {
        self.movements
            .iter()
            .filter(|m| m.inventory_item_id == item_id)
            .collect()
    }
}

/// Shared handle; clones see the same data
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a unit of work, waiting for any other to finish
    pub async fn begin(&self) -> MemoryTx {
        let guard = self.state.clone().lock_owned().await;
        let rollback = guard.clone();
        MemoryTx {
            guard,
            rollback: Some(rollback),
        }
    }

    /// Copy of the committed state
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }
}

/// An open unit of work over [`MemoryStore`]
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    rollback: Option<MemoryState>,
}

impl MemoryTx {
    pub fn commit(mut self) {
        self.rollback = None;
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if let Some(previous) = self.rollback.take() {
            *self.guard = previous;
        }
    }
}

#[async_trait]
impl LedgerStore for MemoryTx {
    async fn lock_item(
        &mut self,
        business_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<Option<InventoryItem>> {
        Ok(self
            .guard
            .items
            .get(&item_id)
            .filter(|i| i.business_id == business_id && i.is_active)
            .cloned())
    }

    async fn find_active_item_by_name(
        &mut self,
        business_id: Uuid,
        name: &str,
    ) -> AppResult<Option<InventoryItem>> {
        Ok(self.guard.item_named(business_id, name.trim()).cloned())
    }

    async fn insert_item(
        &mut self,
        business_id: Uuid,
        item: NewInventoryItem,
    ) -> AppResult<InventoryItem> {
        let name = item.name.trim().to_string();
        if self.guard.item_named(business_id, &name).is_some() {
            return Err(AppError::DuplicateEntry("name".to_string()));
        }
        let now = Utc::now();
        let row = InventoryItem {
            id: Uuid::new_v4(),
            business_id,
            name,
            category: item.category,
            unit: item.unit,
            current_stock: Decimal::ZERO,
            minimum_stock: item.minimum_stock,
            cost_per_unit: item.cost_per_unit,
            supplier_id: item.supplier_id,
            supplier_name: item.supplier_name,
            expiry_date: item.expiry_date,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.guard.items.insert(row.id, row.clone());
        Ok(row)
    }

    async fn set_item_stock(&mut self, item_id: Uuid, stock: Decimal) -> AppResult<()> {
        let item = self
            .guard
            .items
            .get_mut(&item_id)
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;
        item.current_stock = stock;
        item.updated_at = Utc::now();
        Ok(())
    }

    async fn deactivate_item(&mut self, business_id: Uuid, item_id: Uuid) -> AppResult<bool> {
        match self
            .guard
            .items
            .get_mut(&item_id)
            .filter(|i| i.business_id == business_id && i.is_active)
        {
            Some(item) => {
                item.is_active = false;
                item.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_movement(&mut self, movement: NewStockMovement) -> AppResult<StockMovement> {
        let row = StockMovement {
            id: Uuid::new_v4(),
            business_id: movement.business_id,
            inventory_item_id: movement.inventory_item_id,
            movement_type: movement.movement_type,
            quantity_change: movement.quantity_change,
            previous_stock: movement.previous_stock,
            new_stock: movement.new_stock,
            reference_id: movement.reference_id,
            reference_type: movement.reference_type,
            notes: movement.notes,
            created_at: Utc::now(),
        };
        self.guard.movements.push(row.clone());
        Ok(row)
    }

    async fn list_items_at_minimum(&mut self, business_id: Uuid) -> AppResult<Vec<InventoryItem>> {
        Ok(self
            .guard
            .items
            .values()
            .filter(|i| i.business_id == business_id && i.is_active && i.is_low_stock())
            .cloned()
            .collect())
    }

    async fn list_movements(
        &mut self,
        business_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<Vec<StockMovement>> {
        Ok(self
            .guard
            .movements
            .iter()
            .filter(|m| m.business_id == business_id && m.inventory_item_id == item_id)
            .cloned()
            .collect())
    }

    async fn insert_purchase(
        &mut self,
        business_id: Uuid,
        purchase: NewPurchase,
    ) -> AppResult<Purchase> {
        let taken = self.guard.purchases.iter().any(|p| {
            p.business_id == business_id
                && p.purchase_order_number == purchase.purchase_order_number
        });
        if taken {
            return Err(AppError::DuplicateEntry("purchase_order_number".to_string()));
        }
        let now = Utc::now();
        let row = Purchase {
            id: Uuid::new_v4(),
            business_id,
            purchase_order_number: purchase.purchase_order_number,
            supplier_id: purchase.supplier_id,
            supplier_name: purchase.supplier_name,
            purchase_date: purchase.purchase_date,
            total_amount: purchase.total_amount,
            final_amount: purchase.total_amount,
            payment_status: PaymentStatus::Pending,
            status: PurchaseStatus::Ordered,
            notes: purchase.notes,
            created_at: now,
            updated_at: now,
        };
        self.guard.purchases.push(row.clone());
        Ok(row)
    }

    async fn insert_purchase_line(&mut self, line: NewPurchaseLine) -> AppResult<PurchaseLine> {
        let row = PurchaseLine {
            id: Uuid::new_v4(),
            purchase_id: line.purchase_id,
            inventory_item_id: line.inventory_item_id,
            ingredient_name: line.ingredient_name,
            quantity: line.quantity,
            unit: line.unit,
            unit_price: line.unit_price,
            total_price: line.total_price,
        };
        self.guard.purchase_lines.push(row.clone());
        Ok(row)
    }

    async fn insert_order(&mut self, business_id: Uuid, order: NewOrder) -> AppResult<Order> {
        let taken = self
            .guard
            .orders
            .values()
            .any(|o| o.business_id == business_id && o.order_number == order.order_number);
        if taken {
            return Err(AppError::DuplicateEntry("order_number".to_string()));
        }
        let now = Utc::now();
        let row = Order {
            id: Uuid::new_v4(),
            business_id,
            order_number: order.order_number,
            client_name: order.client_name,
            client_type: order.client_type,
            event_date: order.event_date,
            event_type: order.event_type,
            event_location: order.event_location,
            guest_count: order.guest_count,
            price_per_head: order.price_per_head,
            total_value: order.total_value,
            advance_received: Decimal::ZERO,
            remaining_balance: order.total_value,
            status: OrderStatus::Inquiry,
            notes: order.notes,
            stock_consumed_at: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        self.guard.orders.insert(row.id, row.clone());
        Ok(row)
    }

    async fn insert_order_line(&mut self, line: NewOrderLine) -> AppResult<OrderLine> {
        let row = OrderLine {
            id: Uuid::new_v4(),
            order_id: line.order_id,
            menu_item_id: line.menu_item_id,
            item_name: line.item_name,
            quantity: line.quantity,
            unit_price: line.unit_price,
            total_price: line.total_price,
        };
        self.guard.order_lines.push(row.clone());
        Ok(row)
    }

    async fn lock_order(&mut self, business_id: Uuid, order_id: Uuid) -> AppResult<Option<Order>> {
        Ok(self
            .guard
            .orders
            .get(&order_id)
            .filter(|o| o.business_id == business_id)
            .cloned())
    }

    async fn update_order_settlement(
        &mut self,
        order_id: Uuid,
        settlement: OrderSettlement,
    ) -> AppResult<Order> {
        let order = self
            .guard
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
        order.status = settlement.status;
        order.advance_received = settlement.advance_received;
        order.remaining_balance = settlement.remaining_balance;
        order.stock_consumed_at = settlement.stock_consumed_at;
        order.version += 1;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn list_order_lines(&mut self, order_id: Uuid) -> AppResult<Vec<OrderLine>> {
        Ok(self
            .guard
            .order_lines
            .iter()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn find_menu_item(
        &mut self,
        business_id: Uuid,
        menu_item_id: Uuid,
    ) -> AppResult<Option<MenuItem>> {
        Ok(self
            .guard
            .menu_items
            .get(&menu_item_id)
            .filter(|m| m.business_id == business_id && m.deleted_at.is_none())
            .cloned())
    }

    async fn insert_menu_item(
        &mut self,
        business_id: Uuid,
        fields: MenuItemFields,
    ) -> AppResult<MenuItem> {
        let now = Utc::now();
        let row = MenuItem {
            id: Uuid::new_v4(),
            business_id,
            name: fields.name,
            description: fields.description,
            category: fields.category,
            cost_per_serving: fields.cost_per_serving,
            selling_price: fields.selling_price,
            margin_percent: fields.margin_percent,
            is_available: fields.is_available,
            is_vegetarian: fields.is_vegetarian,
            prep_time_minutes: fields.prep_time_minutes,
            image_url: fields.image_url,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.guard.menu_items.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_menu_item(
        &mut self,
        menu_item_id: Uuid,
        fields: MenuItemFields,
    ) -> AppResult<MenuItem> {
        let item = self
            .guard
            .menu_items
            .get_mut(&menu_item_id)
            .filter(|m| m.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound("Menu item".to_string()))?;
        item.name = fields.name;
        item.description = fields.description;
        item.category = fields.category;
        item.cost_per_serving = fields.cost_per_serving;
        item.selling_price = fields.selling_price;
        item.margin_percent = fields.margin_percent;
        item.is_available = fields.is_available;
        item.is_vegetarian = fields.is_vegetarian;
        item.prep_time_minutes = fields.prep_time_minutes;
        item.image_url = fields.image_url;
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn insert_menu_ingredient(
        &mut self,
        ingredient: NewMenuIngredient,
    ) -> AppResult<MenuIngredient> {
        let row = MenuIngredient {
            id: Uuid::new_v4(),
            menu_item_id: ingredient.menu_item_id,
            inventory_item_id: ingredient.inventory_item_id,
            ingredient_name: ingredient.ingredient_name,
            quantity_required: ingredient.quantity_required,
            unit: ingredient.unit,
        };
        self.guard.menu_ingredients.push(row.clone());
        Ok(row)
    }

    async fn delete_menu_ingredients(&mut self, menu_item_id: Uuid) -> AppResult<()> {
        self.guard
            .menu_ingredients
            .retain(|i| i.menu_item_id != menu_item_id);
        Ok(())
    }

    async fn list_menu_ingredients(&mut self, menu_item_id: Uuid) -> AppResult<Vec<MenuIngredient>> {
        Ok(self
            .guard
            .menu_ingredients
            .iter()
            .filter(|i| i.menu_item_id == menu_item_id)
            .cloned()
            .collect())
    }
}
