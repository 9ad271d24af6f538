//! Business profile, supplier directory and global search

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{require_text, validate_email, validate_phone, Business, Supplier};

const BUSINESS_COLUMNS: &str = "id, name, tagline, email, phone, address, city, created_at, updated_at";
const SUPPLIER_COLUMNS: &str =
    "id, business_id, name, contact_person, phone, email, address, is_active, created_at";

/// Per-category cap for search results
const SEARCH_LIMIT: i64 = 5;

#[derive(Clone)]
pub struct BusinessService {
    db: PgPool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub tagline: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSupplierInput {
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SearchHit {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub orders: Vec<SearchHit>,
    pub menu_items: Vec<SearchHit>,
    pub inventory: Vec<SearchHit>,
}

/// `%term%` for ILIKE with the wildcard characters escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

impl BusinessService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get_profile(&self, business_id: Uuid) -> AppResult<Business> {
        sqlx::query_as::<_, Business>(&format!(
            "SELECT {} FROM businesses WHERE id = $1",
            BUSINESS_COLUMNS
        ))
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Business".to_string()))
    }

    pub async fn update_profile(
        &self,
        business_id: Uuid,
        input: UpdateProfileInput,
    ) -> AppResult<Business> {
        if let Some(name) = &input.name {
            require_text("name", name)?;
        }
        if let Some(email) = &input.email {
            validate_email(email).map_err(|msg| AppError::validation("email", msg))?;
        }
        if let Some(phone) = &input.phone {
            validate_phone(phone).map_err(|msg| AppError::validation("phone", msg))?;
        }

        sqlx::query_as::<_, Business>(&format!(
            r#"
            UPDATE businesses
            SET name = COALESCE($2, name),
                tagline = COALESCE($3, tagline),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                address = COALESCE($6, address),
                city = COALESCE($7, city),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            BUSINESS_COLUMNS
        ))
        .bind(business_id)
        .bind(input.name)
        .bind(input.tagline)
        .bind(input.email)
        .bind(input.phone)
        .bind(input.address)
        .bind(input.city)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Business".to_string()))
    }

    pub async fn list_suppliers(&self, business_id: Uuid) -> AppResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {} FROM suppliers WHERE business_id = $1 AND is_active = true ORDER BY name",
            SUPPLIER_COLUMNS
        ))
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;
        Ok(suppliers)
    }

    pub async fn create_supplier(
        &self,
        business_id: Uuid,
        input: CreateSupplierInput,
    ) -> AppResult<Supplier> {
        require_text("name", &input.name)?;
        if let Some(email) = &input.email {
            validate_email(email).map_err(|msg| AppError::validation("email", msg))?;
        }

        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            INSERT INTO suppliers (business_id, name, contact_person, phone, email, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            SUPPLIER_COLUMNS
        ))
        .bind(business_id)
        .bind(input.name.trim())
        .bind(input.contact_person)
        .bind(input.phone)
        .bind(input.email)
        .bind(input.address)
        .fetch_one(&self.db)
        .await?;

        Ok(supplier)
    }

    pub async fn delete_supplier(&self, business_id: Uuid, supplier_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE suppliers SET is_active = false WHERE id = $1 AND business_id = $2 AND is_active = true",
        )
        .bind(supplier_id)
        .bind(business_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Supplier".to_string()));
        }
        Ok(())
    }

    /// Substring search over orders, menu items and inventory.
    /// Terms shorter than two characters return nothing.
    pub async fn search(&self, business_id: Uuid, query: &str) -> AppResult<SearchResults> {
        let term = query.trim();
        if term.chars().count() < 2 {
            return Ok(SearchResults::default());
        }
        let pattern = like_pattern(term);

        let orders = sqlx::query_as::<_, SearchHit>(
            r#"
            SELECT id, order_number || ' ' || client_name AS name, 'order' AS kind
            FROM orders
            WHERE business_id = $1 AND (client_name ILIKE $2 OR order_number ILIKE $2)
            ORDER BY event_date DESC
            LIMIT $3
            "#,
        )
        .bind(business_id)
        .bind(&pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.db)
        .await?;

        let menu_items = sqlx::query_as::<_, SearchHit>(
            r#"
            SELECT id, name, 'menu' AS kind
            FROM menu_items
            WHERE business_id = $1 AND name ILIKE $2 AND deleted_at IS NULL
            ORDER BY name
            LIMIT $3
            "#,
        )
        .bind(business_id)
        .bind(&pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.db)
        .await?;

        let inventory = sqlx::query_as::<_, SearchHit>(
            r#"
            SELECT id, name, 'inventory' AS kind
            FROM inventory_items
            WHERE business_id = $1 AND name ILIKE $2 AND is_active = true
            ORDER BY name
            LIMIT $3
            "#,
        )
        .bind(business_id)
        .bind(&pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.db)
        .await?;

        Ok(SearchResults {
            orders,
            menu_items,
            inventory,
        })
    }
}
