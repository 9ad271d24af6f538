//! Menu service: dishes, recipes and margins

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::ledger::{self, NewMenuItemRequest, UpdateMenuItemRequest};
use crate::store::postgres::{INGREDIENT_COLUMNS, MENU_COLUMNS};
use crate::store::PgStore;
use shared::{MenuIngredient, MenuItem, MenuItemWithIngredients};

#[derive(Clone)]
pub struct MenuService {
    db: PgPool,
}

impl MenuService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Non-deleted items grouped by category
    pub async fn list_items(&self, business_id: Uuid) -> AppResult<Vec<MenuItem>> {
        let items = sqlx::query_as::<_, MenuItem>(&format!(
            "SELECT {} FROM menu_items WHERE business_id = $1 AND deleted_at IS NULL \
             ORDER BY category, name",
            MENU_COLUMNS
        ))
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;

        Ok(items)
    }

    pub async fn get_item(
        &self,
        business_id: Uuid,
        menu_item_id: Uuid,
    ) -> AppResult<MenuItemWithIngredients> {
        let item = sqlx::query_as::<_, MenuItem>(&format!(
            "SELECT {} FROM menu_items WHERE id = $1 AND business_id = $2 AND deleted_at IS NULL",
            MENU_COLUMNS
        ))
        .bind(menu_item_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Menu item".to_string()))?;

        let ingredients = sqlx::query_as::<_, MenuIngredient>(&format!(
            "SELECT {} FROM menu_item_ingredients WHERE menu_item_id = $1 ORDER BY seq",
            INGREDIENT_COLUMNS
        ))
        .bind(menu_item_id)
        .fetch_all(&self.db)
        .await?;

        Ok(MenuItemWithIngredients { item, ingredients })
    }

    pub async fn create_item(
        &self,
        business_id: Uuid,
        input: NewMenuItemRequest,
    ) -> AppResult<MenuItemWithIngredients> {
        let mut store = PgStore::begin(&self.db).await?;
        let item = ledger::create_menu_item(&mut store, business_id, input).await?;
        store.commit().await?;
        Ok(item)
    }

    pub async fn update_item(
        &self,
        business_id: Uuid,
        menu_item_id: Uuid,
        input: UpdateMenuItemRequest,
    ) -> AppResult<MenuItemWithIngredients> {
        let mut store = PgStore::begin(&self.db).await?;
        let item = ledger::update_menu_item(&mut store, business_id, menu_item_id, input).await?;
        store.commit().await?;
        Ok(item)
    }

    /// Soft delete; past orders keep their reference
    pub async fn delete_item(&self, business_id: Uuid, menu_item_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE menu_items SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND business_id = $2 AND deleted_at IS NULL",
        )
        .bind(menu_item_id)
        .bind(business_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Menu item".to_string()));
        }

        Ok(())
    }
}
