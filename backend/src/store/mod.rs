//! Persistence adapter used by the ledger engine
//!
//! A store value is one open unit of work: everything written through it
//! becomes visible together on commit and is discarded when it is dropped
//! uncommitted.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::AppResult;
use shared::{
    ClientType, InventoryItem, MenuIngredient, MenuItem, MovementType, Order, OrderLine,
    OrderStatus, Purchase, PurchaseLine, StockMovement,
};

pub mod memory;
pub mod postgres;

pub use memory::{MemoryState, MemoryStore, MemoryTx};
pub use postgres::PgStore;

/// Columns for a new inventory item; stock always starts at zero
#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub name: String,
    pub category: Option<String>,
    pub unit: String,
    pub minimum_stock: Decimal,
    pub cost_per_unit: Decimal,
    pub supplier_id: Option<Uuid>,
    pub supplier_name: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewStockMovement {
    pub business_id: Uuid,
    pub inventory_item_id: Uuid,
    pub movement_type: MovementType,
    pub quantity_change: Decimal,
    pub previous_stock: Decimal,
    pub new_stock: Decimal,
    pub reference_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub notes: Option<String>,
}

/// Purchase header; `final_amount` is written equal to `total_amount`
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub purchase_order_number: String,
    pub supplier_id: Option<Uuid>,
    pub supplier_name: Option<String>,
    pub purchase_date: NaiveDate,
    pub total_amount: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPurchaseLine {
    pub purchase_id: Uuid,
    pub inventory_item_id: Uuid,
    pub ingredient_name: String,
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Order header; status starts at Inquiry with nothing paid
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub client_name: String,
    pub client_type: ClientType,
    pub event_date: NaiveDate,
    pub event_type: Option<String>,
    pub event_location: Option<String>,
    pub guest_count: i32,
    pub price_per_head: Decimal,
    pub total_value: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub order_id: Uuid,
    pub menu_item_id: Option<Uuid>,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Settlement columns written by an order update; bumps `version`
#[derive(Debug, Clone)]
pub struct OrderSettlement {
    pub status: OrderStatus,
    pub advance_received: Decimal,
    pub remaining_balance: Decimal,
    pub stock_consumed_at: Option<DateTime<Utc>>,
}

/// Every editable menu column, margin included
#[derive(Debug, Clone)]
pub struct MenuItemFields {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub cost_per_serving: Decimal,
    pub selling_price: Decimal,
    pub margin_percent: Decimal,
    pub is_available: bool,
    pub is_vegetarian: bool,
    pub prep_time_minutes: Option<i32>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMenuIngredient {
    pub menu_item_id: Uuid,
    pub inventory_item_id: Option<Uuid>,
    pub ingredient_name: String,
    pub quantity_required: Decimal,
    pub unit: Option<String>,
}

/// Reads and writes the ledger engine needs, scoped to one business
#[async_trait]
pub trait LedgerStore: Send {
    /// Fetch an active item and hold it against concurrent stock changes
    async fn lock_item(&mut self, business_id: Uuid, item_id: Uuid)
        -> AppResult<Option<InventoryItem>>;

    /// Exact match on the trimmed name among active items
    async fn find_active_item_by_name(
        &mut self,
        business_id: Uuid,
        name: &str,
    ) -> AppResult<Option<InventoryItem>>;

    async fn insert_item(
        &mut self,
        business_id: Uuid,
        item: NewInventoryItem,
    ) -> AppResult<InventoryItem>;

    async fn set_item_stock(&mut self, item_id: Uuid, stock: Decimal) -> AppResult<()>;

    /// Soft delete; `false` when no active item matched
    async fn deactivate_item(&mut self, business_id: Uuid, item_id: Uuid) -> AppResult<bool>;

    async fn insert_movement(&mut self, movement: NewStockMovement) -> AppResult<StockMovement>;

    /// Active items whose stock is at or below their minimum
    async fn list_items_at_minimum(&mut self, business_id: Uuid) -> AppResult<Vec<InventoryItem>>;

    /// Movements of one item, in the order they were recorded
    async fn list_movements(
        &mut self,
        business_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<Vec<StockMovement>>;

    async fn insert_purchase(
        &mut self,
        business_id: Uuid,
        purchase: NewPurchase,
    ) -> AppResult<Purchase>;

    async fn insert_purchase_line(&mut self, line: NewPurchaseLine) -> AppResult<PurchaseLine>;

    async fn insert_order(&mut self, business_id: Uuid, order: NewOrder) -> AppResult<Order>;

    async fn insert_order_line(&mut self, line: NewOrderLine) -> AppResult<OrderLine>;

    /// Fetch an order and hold it against concurrent settlement changes
    async fn lock_order(&mut self, business_id: Uuid, order_id: Uuid) -> AppResult<Option<Order>>;

    async fn update_order_settlement(
        &mut self,
        order_id: Uuid,
        settlement: OrderSettlement,
    ) -> AppResult<Order>;

    /// Lines in the order they were entered
    async fn list_order_lines(&mut self, order_id: Uuid) -> AppResult<Vec<OrderLine>>;

    /// Non-deleted menu item
    async fn find_menu_item(
        &mut self,
        business_id: Uuid,
        menu_item_id: Uuid,
    ) -> AppResult<Option<MenuItem>>;

    async fn insert_menu_item(
        &mut self,
        business_id: Uuid,
        fields: MenuItemFields,
    ) -> AppResult<MenuItem>;

    async fn update_menu_item(
        &mut self,
        menu_item_id: Uuid,
        fields: MenuItemFields,
    ) -> AppResult<MenuItem>;

    async fn insert_menu_ingredient(
        &mut self,
        ingredient: NewMenuIngredient,
    ) -> AppResult<MenuIngredient>;

    async fn delete_menu_ingredients(&mut self, menu_item_id: Uuid) -> AppResult<()>;

    async fn list_menu_ingredients(&mut self, menu_item_id: Uuid) -> AppResult<Vec<MenuIngredient>>;
}
