//! Menu items: margin is always derived, never taken from input

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{LedgerStore, MenuItemFields, NewMenuIngredient};
use shared::{
    margin_percent, require_non_negative, require_quantity, require_text, MenuIngredient,
    MenuItemWithIngredients,
};

#[derive(Debug, Clone, Deserialize)]
pub struct MenuIngredientInput {
    pub inventory_item_id: Option<Uuid>,
    pub ingredient_name: String,
    pub quantity_required: Decimal,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMenuItemRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub cost_per_serving: Decimal,
    pub selling_price: Decimal,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub is_vegetarian: bool,
    pub prep_time_minutes: Option<i32>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<MenuIngredientInput>,
}

/// Partial update; `ingredients`, when present, replaces the whole recipe
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMenuItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub cost_per_serving: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub is_available: Option<bool>,
    pub is_vegetarian: Option<bool>,
    pub prep_time_minutes: Option<i32>,
    pub image_url: Option<String>,
    pub ingredients: Option<Vec<MenuIngredientInput>>,
}

fn default_true() -> bool {
    true
}

/// Recipe lines must name an active inventory item of the same business
async fn validate_ingredients<S>(
    store: &mut S,
    business_id: Uuid,
    ingredients: &[MenuIngredientInput],
) -> AppResult<()>
where
    S: LedgerStore + ?Sized,
{
    for ingredient in ingredients {
        require_text("ingredient_name", &ingredient.ingredient_name)?;
        require_non_negative("quantity_required", ingredient.quantity_required)?;
        require_quantity("quantity_required", ingredient.quantity_required)?;

        let Some(item_id) = ingredient.inventory_item_id else {
            continue;
        };
        if store.lock_item(business_id, item_id).await?.is_none() {
            return Err(AppError::validation(
                "inventory_item_id",
                format!(
                    "{} is not linked to an active inventory item",
                    ingredient.ingredient_name.trim()
                ),
            ));
        }
    }
    Ok(())
}

pub async fn create_menu_item<S>(
    store: &mut S,
    business_id: Uuid,
    request: NewMenuItemRequest,
) -> AppResult<MenuItemWithIngredients>
where
    S: LedgerStore + ?Sized,
{
    require_text("name", &request.name)?;
    require_text("category", &request.category)?;
    let margin = margin_percent(request.cost_per_serving, request.selling_price)?;
    validate_ingredients(store, business_id, &request.ingredients).await?;

    let item = store
        .insert_menu_item(
            business_id,
            MenuItemFields {
                name: request.name,
                description: request.description,
                category: request.category,
                cost_per_serving: request.cost_per_serving,
                selling_price: request.selling_price,
                margin_percent: margin,
                is_available: request.is_available,
                is_vegetarian: request.is_vegetarian,
                prep_time_minutes: request.prep_time_minutes,
                image_url: request.image_url,
            },
        )
        .await?;

    let ingredients = insert_ingredients(store, item.id, request.ingredients).await?;

    tracing::info!(%business_id, menu_item_id = %item.id, margin = %item.margin_percent, "Menu item created");
    Ok(MenuItemWithIngredients { item, ingredients })
}

pub async fn update_menu_item<S>(
    store: &mut S,
    business_id: Uuid,
    menu_item_id: Uuid,
    request: UpdateMenuItemRequest,
) -> AppResult<MenuItemWithIngredients>
where
    S: LedgerStore + ?Sized,
{
    let existing = store
        .find_menu_item(business_id, menu_item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Menu item".to_string()))?;

    let name = request.name.unwrap_or(existing.name);
    let category = request.category.unwrap_or(existing.category);
    require_text("name", &name)?;
    require_text("category", &category)?;

    let cost_per_serving = request.cost_per_serving.unwrap_or(existing.cost_per_serving);
    let selling_price = request.selling_price.unwrap_or(existing.selling_price);
    let margin = margin_percent(cost_per_serving, selling_price)?;
    if let Some(ingredients) = &request.ingredients {
        validate_ingredients(store, business_id, ingredients).await?;
    }

    let item = store
        .update_menu_item(
            menu_item_id,
            MenuItemFields {
                name,
                description: request.description.or(existing.description),
                category,
                cost_per_serving,
                selling_price,
                margin_percent: margin,
                is_available: request.is_available.unwrap_or(existing.is_available),
                is_vegetarian: request.is_vegetarian.unwrap_or(existing.is_vegetarian),
                prep_time_minutes: request.prep_time_minutes.or(existing.prep_time_minutes),
                image_url: request.image_url.or(existing.image_url),
            },
        )
        .await?;

    let ingredients = match request.ingredients {
        Some(replacement) => {
            store.delete_menu_ingredients(menu_item_id).await?;
            insert_ingredients(store, menu_item_id, replacement).await?
        }
        None => store.list_menu_ingredients(menu_item_id).await?,
    };

    Ok(MenuItemWithIngredients { item, ingredients })
}

async fn insert_ingredients<S>(
    store: &mut S,
    menu_item_id: Uuid,
    inputs: Vec<MenuIngredientInput>,
) -> AppResult<Vec<MenuIngredient>>
where
    S: LedgerStore + ?Sized,
{
    let mut rows = Vec::with_capacity(inputs.len());
    for input in inputs {
        let row = store
            .insert_menu_ingredient(NewMenuIngredient {
                menu_item_id,
                inventory_item_id: input.inventory_item_id,
                ingredient_name: input.ingredient_name.trim().to_string(),
                quantity_required: input.quantity_required,
                unit: input.unit,
            })
            .await?;
        rows.push(row);
    }
    Ok(rows)
}
