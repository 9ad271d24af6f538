//! PostgreSQL store: one `sqlx` transaction per unit of work

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{
    LedgerStore, MenuItemFields, NewInventoryItem, NewMenuIngredient, NewOrder, NewOrderLine,
    NewPurchase, NewPurchaseLine, NewStockMovement, OrderSettlement,
};
use crate::error::{AppError, AppResult};
use shared::{
    InventoryItem, MenuIngredient, MenuItem, Order, OrderLine, Purchase, PurchaseLine,
    StockMovement,
};

pub(crate) const ITEM_COLUMNS: &str = "id, business_id, name, category, unit, current_stock, \
    minimum_stock, cost_per_unit, supplier_id, supplier_name, expiry_date, is_active, \
    created_at, updated_at";

pub(crate) const MOVEMENT_COLUMNS: &str = "id, business_id, inventory_item_id, movement_type, \
    quantity_change, previous_stock, new_stock, reference_id, reference_type, notes, created_at";

pub(crate) const PURCHASE_COLUMNS: &str = "id, business_id, purchase_order_number, supplier_id, \
    supplier_name, purchase_date, total_amount, final_amount, payment_status, status, notes, \
    created_at, updated_at";

pub(crate) const PURCHASE_LINE_COLUMNS: &str = "id, purchase_id, inventory_item_id, \
    ingredient_name, quantity, unit, unit_price, total_price";

pub(crate) const ORDER_COLUMNS: &str = "id, business_id, order_number, client_name, client_type, \
    event_date, event_type, event_location, guest_count, price_per_head, total_value, \
    advance_received, remaining_balance, status, notes, stock_consumed_at, version, \
    created_at, updated_at";

pub(crate) const ORDER_LINE_COLUMNS: &str =
    "id, order_id, menu_item_id, item_name, quantity, unit_price, total_price";

pub(crate) const MENU_COLUMNS: &str = "id, business_id, name, description, category, \
    cost_per_serving, selling_price, margin_percent, is_available, is_vegetarian, \
    prep_time_minutes, image_url, created_at, updated_at, deleted_at";

pub(crate) const INGREDIENT_COLUMNS: &str =
    "id, menu_item_id, inventory_item_id, ingredient_name, quantity_required, unit";

/// Ledger store over an open Postgres transaction
pub struct PgStore {
    tx: Transaction<'static, Postgres>,
}

impl PgStore {
    pub async fn begin(db: &PgPool) -> AppResult<Self> {
        Ok(Self { tx: db.begin().await? })
    }

    pub async fn commit(self) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    /// The underlying connection, for writes outside the ledger tables that
    /// must land in the same transaction
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn lock_item(
        &mut self,
        business_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<Option<InventoryItem>> {
        let item = sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {} FROM inventory_items \
             WHERE id = $1 AND business_id = $2 AND is_active = true \
             FOR UPDATE",
            ITEM_COLUMNS
        ))
        .bind(item_id)
        .bind(business_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(item)
    }

    async fn find_active_item_by_name(
        &mut self,
        business_id: Uuid,
        name: &str,
    ) -> AppResult<Option<InventoryItem>> {
        let item = sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {} FROM inventory_items \
             WHERE business_id = $1 AND name = $2 AND is_active = true",
            ITEM_COLUMNS
        ))
        .bind(business_id)
        .bind(name.trim())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(item)
    }

    async fn insert_item(
        &mut self,
        business_id: Uuid,
        item: NewInventoryItem,
    ) -> AppResult<InventoryItem> {
        sqlx::query_as::<_, InventoryItem>(&format!(
            r#"
            INSERT INTO inventory_items (
                business_id, name, category, unit, current_stock, minimum_stock,
                cost_per_unit, supplier_id, supplier_name, expiry_date
            )
            VALUES ($1, $2, $3, $4, 0, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(business_id)
        .bind(item.name.trim())
        .bind(&item.category)
        .bind(&item.unit)
        .bind(item.minimum_stock)
        .bind(item.cost_per_unit)
        .bind(item.supplier_id)
        .bind(&item.supplier_name)
        .bind(item.expiry_date)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| AppError::from_unique(e, "name"))
    }

    async fn set_item_stock(&mut self, item_id: Uuid, stock: Decimal) -> AppResult<()> {
        sqlx::query(
            "UPDATE inventory_items SET current_stock = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(item_id)
        .bind(stock)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn deactivate_item(&mut self, business_id: Uuid, item_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE inventory_items SET is_active = false, updated_at = NOW() \
             WHERE id = $1 AND business_id = $2 AND is_active = true",
        )
        .bind(item_id)
        .bind(business_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_movement(&mut self, movement: NewStockMovement) -> AppResult<StockMovement> {
        let row = sqlx::query_as::<_, StockMovement>(&format!(
            r#"
            INSERT INTO stock_movements (
                business_id, inventory_item_id, movement_type, quantity_change,
                previous_stock, new_stock, reference_id, reference_type, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            MOVEMENT_COLUMNS
        ))
        .bind(movement.business_id)
        .bind(movement.inventory_item_id)
        .bind(movement.movement_type)
        .bind(movement.quantity_change)
        .bind(movement.previous_stock)
        .bind(movement.new_stock)
        .bind(movement.reference_id)
        .bind(&movement.reference_type)
        .bind(&movement.notes)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn list_items_at_minimum(&mut self, business_id: Uuid) -> AppResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {} FROM inventory_items \
             WHERE business_id = $1 AND is_active = true AND current_stock <= minimum_stock",
            ITEM_COLUMNS
        ))
        .bind(business_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(items)
    }

    async fn list_movements(
        &mut self,
        business_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT {} FROM stock_movements \
             WHERE business_id = $1 AND inventory_item_id = $2 \
             ORDER BY seq",
            MOVEMENT_COLUMNS
        ))
        .bind(business_id)
        .bind(item_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(movements)
    }

    async fn insert_purchase(
        &mut self,
        business_id: Uuid,
        purchase: NewPurchase,
    ) -> AppResult<Purchase> {
        sqlx::query_as::<_, Purchase>(&format!(
            r#"
            INSERT INTO purchases (
                business_id, purchase_order_number, supplier_id, supplier_name,
                purchase_date, total_amount, final_amount, payment_status, status, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $6, 'Pending', 'Ordered', $7)
            RETURNING {}
            "#,
            PURCHASE_COLUMNS
        ))
        .bind(business_id)
        .bind(&purchase.purchase_order_number)
        .bind(purchase.supplier_id)
        .bind(&purchase.supplier_name)
        .bind(purchase.purchase_date)
        .bind(purchase.total_amount)
        .bind(&purchase.notes)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| AppError::from_unique(e, "purchase_order_number"))
    }

    async fn insert_purchase_line(&mut self, line: NewPurchaseLine) -> AppResult<PurchaseLine> {
        let row = sqlx::query_as::<_, PurchaseLine>(&format!(
            r#"
            INSERT INTO purchase_items (
                purchase_id, inventory_item_id, ingredient_name, quantity, unit,
                unit_price, total_price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            PURCHASE_LINE_COLUMNS
        ))
        .bind(line.purchase_id)
        .bind(line.inventory_item_id)
        .bind(&line.ingredient_name)
        .bind(line.quantity)
        .bind(&line.unit)
        .bind(line.unit_price)
        .bind(line.total_price)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn insert_order(&mut self, business_id: Uuid, order: NewOrder) -> AppResult<Order> {
        sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (
                business_id, order_number, client_name, client_type, event_date,
                event_type, event_location, guest_count, price_per_head, total_value,
                advance_received, remaining_balance, status, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, $10, 'Inquiry', $11)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(business_id)
        .bind(&order.order_number)
        .bind(&order.client_name)
        .bind(order.client_type)
        .bind(order.event_date)
        .bind(&order.event_type)
        .bind(&order.event_location)
        .bind(order.guest_count)
        .bind(order.price_per_head)
        .bind(order.total_value)
        .bind(&order.notes)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| AppError::from_unique(e, "order_number"))
    }

    async fn insert_order_line(&mut self, line: NewOrderLine) -> AppResult<OrderLine> {
        let row = sqlx::query_as::<_, OrderLine>(&format!(
            r#"
            INSERT INTO order_items (
                order_id, menu_item_id, item_name, quantity, unit_price, total_price
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            ORDER_LINE_COLUMNS
        ))
        .bind(line.order_id)
        .bind(line.menu_item_id)
        .bind(&line.item_name)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.total_price)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn lock_order(&mut self, business_id: Uuid, order_id: Uuid) -> AppResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE id = $1 AND business_id = $2 FOR UPDATE",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .bind(business_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(order)
    }

    async fn update_order_settlement(
        &mut self,
        order_id: Uuid,
        settlement: OrderSettlement,
    ) -> AppResult<Order> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
            SET status = $2,
                advance_received = $3,
                remaining_balance = $4,
                stock_consumed_at = $5,
                version = version + 1,
                updated_at = $6
            WHERE id = $1
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .bind(settlement.status)
        .bind(settlement.advance_received)
        .bind(settlement.remaining_balance)
        .bind(settlement.stock_consumed_at)
        .bind(Utc::now())
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        Ok(order)
    }

    async fn list_order_lines(&mut self, order_id: Uuid) -> AppResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(&format!(
            "SELECT {} FROM order_items WHERE order_id = $1 ORDER BY seq",
            ORDER_LINE_COLUMNS
        ))
        .bind(order_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(lines)
    }

    async fn find_menu_item(
        &mut self,
        business_id: Uuid,
        menu_item_id: Uuid,
    ) -> AppResult<Option<MenuItem>> {
        let item = sqlx::query_as::<_, MenuItem>(&format!(
            "SELECT {} FROM menu_items \
             WHERE id = $1 AND business_id = $2 AND deleted_at IS NULL",
            MENU_COLUMNS
        ))
        .bind(menu_item_id)
        .bind(business_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(item)
    }

    async fn insert_menu_item(
        &mut self,
        business_id: Uuid,
        fields: MenuItemFields,
    ) -> AppResult<MenuItem> {
        let item = sqlx::query_as::<_, MenuItem>(&format!(
            r#"
            INSERT INTO menu_items (
                business_id, name, description, category, cost_per_serving, selling_price,
                margin_percent, is_available, is_vegetarian, prep_time_minutes, image_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            MENU_COLUMNS
        ))
        .bind(business_id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.category)
        .bind(fields.cost_per_serving)
        .bind(fields.selling_price)
        .bind(fields.margin_percent)
        .bind(fields.is_available)
        .bind(fields.is_vegetarian)
        .bind(fields.prep_time_minutes)
        .bind(&fields.image_url)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(item)
    }

    async fn update_menu_item(
        &mut self,
        menu_item_id: Uuid,
        fields: MenuItemFields,
    ) -> AppResult<MenuItem> {
        let item = sqlx::query_as::<_, MenuItem>(&format!(
            r#"
            UPDATE menu_items
            SET name = $2, description = $3, category = $4, cost_per_serving = $5,
                selling_price = $6, margin_percent = $7, is_available = $8,
                is_vegetarian = $9, prep_time_minutes = $10, image_url = $11,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            MENU_COLUMNS
        ))
        .bind(menu_item_id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.category)
        .bind(fields.cost_per_serving)
        .bind(fields.selling_price)
        .bind(fields.margin_percent)
        .bind(fields.is_available)
        .bind(fields.is_vegetarian)
        .bind(fields.prep_time_minutes)
        .bind(&fields.image_url)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Menu item".to_string()))?;

        Ok(item)
    }

    async fn insert_menu_ingredient(
        &mut self,
        ingredient: NewMenuIngredient,
    ) -> AppResult<MenuIngredient> {
        let row = sqlx::query_as::<_, MenuIngredient>(&format!(
            r#"
            INSERT INTO menu_item_ingredients (
                menu_item_id, inventory_item_id, ingredient_name, quantity_required, unit
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            INGREDIENT_COLUMNS
        ))
        .bind(ingredient.menu_item_id)
        .bind(ingredient.inventory_item_id)
        .bind(&ingredient.ingredient_name)
        .bind(ingredient.quantity_required)
        .bind(&ingredient.unit)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn delete_menu_ingredients(&mut self, menu_item_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM menu_item_ingredients WHERE menu_item_id = $1")
            .bind(menu_item_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn list_menu_ingredients(&mut self, menu_item_id: Uuid) -> AppResult<Vec<MenuIngredient>> {
        let rows = sqlx::query_as::<_, MenuIngredient>(&format!(
            "SELECT {} FROM menu_item_ingredients WHERE menu_item_id = $1 ORDER BY seq",
            INGREDIENT_COLUMNS
        ))
        .bind(menu_item_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows)
    }
}
