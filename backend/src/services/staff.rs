//! Staff directory service

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::RoleService;
use shared::{require_text, validate_email, validate_phone, StaffMember};

const STAFF_COLUMNS: &str = "id, business_id, role_id, name, email, phone, position, hire_date, \
    is_active, created_at, updated_at";

#[derive(Clone)]
pub struct StaffService {
    db: PgPool,
}

#[derive(Debug, Deserialize)]
pub struct CreateStaffInput {
    pub name: String,
    pub role_id: Option<Uuid>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStaffInput {
    pub name: Option<String>,
    pub role_id: Option<Uuid>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

/// Staff member with the permissions granted by their role
#[derive(Debug, Serialize)]
pub struct StaffDetail {
    #[serde(flatten)]
    pub member: StaffMember,
    pub permissions: Vec<String>,
}

fn check_contact(email: Option<&str>, phone: Option<&str>) -> AppResult<()> {
    if let Some(email) = email {
        validate_email(email).map_err(|msg| AppError::validation("email", msg))?;
    }
    if let Some(phone) = phone {
        validate_phone(phone).map_err(|msg| AppError::validation("phone", msg))?;
    }
    Ok(())
}

impl StaffService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Active staff by name
    pub async fn list_staff(&self, business_id: Uuid) -> AppResult<Vec<StaffMember>> {
        let staff = sqlx::query_as::<_, StaffMember>(&format!(
            "SELECT {} FROM staff WHERE business_id = $1 AND is_active = true ORDER BY name",
            STAFF_COLUMNS
        ))
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;
        Ok(staff)
    }

    pub async fn get_staff(&self, business_id: Uuid, staff_id: Uuid) -> AppResult<StaffDetail> {
        let member = sqlx::query_as::<_, StaffMember>(&format!(
            "SELECT {} FROM staff WHERE id = $1 AND business_id = $2",
            STAFF_COLUMNS
        ))
        .bind(staff_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Staff member".to_string()))?;

        let permissions = match member.role_id {
            Some(role_id) => RoleService::new(self.db.clone()).permissions_of(role_id).await?,
            None => Vec::new(),
        };

        Ok(StaffDetail {
            member,
            permissions,
        })
    }

    pub async fn create_staff(
        &self,
        business_id: Uuid,
        input: CreateStaffInput,
    ) -> AppResult<StaffMember> {
        require_text("name", &input.name)?;
        check_contact(input.email.as_deref(), input.phone.as_deref())?;
        if let Some(role_id) = input.role_id {
            self.ensure_role(business_id, role_id).await?;
        }

        let member = sqlx::query_as::<_, StaffMember>(&format!(
            r#"
            INSERT INTO staff (business_id, role_id, name, email, phone, position, hire_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            STAFF_COLUMNS
        ))
        .bind(business_id)
        .bind(input.role_id)
        .bind(input.name.trim())
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.position)
        .bind(input.hire_date)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(%business_id, staff_id = %member.id, "Staff member added");
        Ok(member)
    }

    pub async fn update_staff(
        &self,
        business_id: Uuid,
        staff_id: Uuid,
        input: UpdateStaffInput,
    ) -> AppResult<StaffMember> {
        if let Some(name) = &input.name {
            require_text("name", name)?;
        }
        check_contact(input.email.as_deref(), input.phone.as_deref())?;
        if let Some(role_id) = input.role_id {
            self.ensure_role(business_id, role_id).await?;
        }

        sqlx::query_as::<_, StaffMember>(&format!(
            r#"
            UPDATE staff
            SET name = COALESCE($3, name),
                role_id = COALESCE($4, role_id),
                email = COALESCE($5, email),
                phone = COALESCE($6, phone),
                position = COALESCE($7, position),
                hire_date = COALESCE($8, hire_date),
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
            WHERE id = $1 AND business_id = $2
            RETURNING {}
            "#,
            STAFF_COLUMNS
        ))
        .bind(staff_id)
        .bind(business_id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.role_id)
        .bind(input.email)
        .bind(input.phone)
        .bind(input.position)
        .bind(input.hire_date)
        .bind(input.is_active)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Staff member".to_string()))
    }

    /// Soft delete
    pub async fn delete_staff(&self, business_id: Uuid, staff_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE staff SET is_active = false, updated_at = NOW() \
             WHERE id = $1 AND business_id = $2 AND is_active = true",
        )
        .bind(staff_id)
        .bind(business_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Staff member".to_string()));
        }
        Ok(())
    }

    async fn ensure_role(&self, business_id: Uuid, role_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM roles WHERE id = $1 AND business_id = $2)",
        )
        .bind(role_id)
        .bind(business_id)
        .fetch_one(&self.db)
        .await?;

        if exists {
            Ok(())
        } else {
            Err(AppError::validation("role_id", "Role does not belong to this business"))
        }
    }
}
