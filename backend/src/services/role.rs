//! Role management service for custom roles and their permissions

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{is_known_permission, Role, RoleWithPermissions};

const ROLE_COLUMNS: &str = "id, business_id, name, description, is_system_role";

#[derive(Clone)]
pub struct RoleService {
    db: PgPool,
}

/// Input for creating a custom role
#[derive(Debug, Deserialize)]
pub struct CreateRoleInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// System roles only accept a permission change
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRoleInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
}

fn check_permissions(permissions: &[String]) -> AppResult<()> {
    match permissions.iter().find(|p| !is_known_permission(p)) {
        Some(unknown) => Err(AppError::validation(
            "permissions",
            format!("Unknown permission '{}'", unknown),
        )),
        None => Ok(()),
    }
}

fn check_role_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("name", "Role name is required"));
    }
    if name.trim().eq_ignore_ascii_case("owner") {
        return Err(AppError::validation("name", "Cannot use reserved role name"));
    }
    Ok(())
}

impl RoleService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Roles of the business, each with its permissions
    pub async fn list_roles(&self, business_id: Uuid) -> AppResult<Vec<RoleWithPermissions>> {
        let roles = sqlx::query_as::<_, Role>(&format!(
            "SELECT {} FROM roles WHERE business_id = $1 ORDER BY is_system_role DESC, name ASC",
            ROLE_COLUMNS
        ))
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;

        let mut result = Vec::with_capacity(roles.len());
        for role in roles {
            let permissions = self.permissions_of(role.id).await?;
            result.push(RoleWithPermissions { role, permissions });
        }
        Ok(result)
    }

    pub async fn get_role(&self, business_id: Uuid, role_id: Uuid) -> AppResult<RoleWithPermissions> {
        let role = self.find_role(business_id, role_id).await?;
        let permissions = self.permissions_of(role_id).await?;
        Ok(RoleWithPermissions { role, permissions })
    }

    pub async fn create_role(
        &self,
        business_id: Uuid,
        input: CreateRoleInput,
    ) -> AppResult<RoleWithPermissions> {
        check_role_name(&input.name)?;
        check_permissions(&input.permissions)?;

        let mut tx = self.db.begin().await?;

        let role_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO roles (business_id, name, description, is_system_role)
            VALUES ($1, $2, $3, false)
            RETURNING id
            "#,
        )
        .bind(business_id)
        .bind(input.name.trim())
        .bind(&input.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_unique(e, "name"))?;

        sqlx::query(
            "INSERT INTO role_permissions (role_id, permission) SELECT $1, UNNEST($2::text[])",
        )
        .bind(role_id)
        .bind(&input.permissions)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(%business_id, %role_id, "Role created");
        self.get_role(business_id, role_id).await
    }

    pub async fn update_role(
        &self,
        business_id: Uuid,
        role_id: Uuid,
        input: UpdateRoleInput,
    ) -> AppResult<RoleWithPermissions> {
        let existing = self.find_role(business_id, role_id).await?;

        if existing.is_system_role && (input.name.is_some() || input.description.is_some()) {
            return Err(AppError::validation("name", "Cannot rename system roles"));
        }
        if let Some(name) = &input.name {
            check_role_name(name)?;
        }
        if let Some(permissions) = &input.permissions {
            check_permissions(permissions)?;
        }

        let mut tx = self.db.begin().await?;

        if !existing.is_system_role {
            sqlx::query(
                "UPDATE roles SET name = $1, description = $2, updated_at = NOW() WHERE id = $3",
            )
            .bind(input.name.as_deref().map(str::trim).unwrap_or(&existing.name))
            .bind(input.description.or(existing.description))
            .bind(role_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::from_unique(e, "name"))?;
        }

        if let Some(permissions) = input.permissions {
            sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
                .bind(role_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                "INSERT INTO role_permissions (role_id, permission) SELECT $1, UNNEST($2::text[])",
            )
            .bind(role_id)
            .bind(&permissions)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_role(business_id, role_id).await
    }

    async fn find_role(&self, business_id: Uuid, role_id: Uuid) -> AppResult<Role> {
        sqlx::query_as::<_, Role>(&format!(
            "SELECT {} FROM roles WHERE id = $1 AND business_id = $2",
            ROLE_COLUMNS
        ))
        .bind(role_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Role".to_string()))
    }

    pub(crate) async fn permissions_of(&self, role_id: Uuid) -> AppResult<Vec<String>> {
        let permissions = sqlx::query_scalar::<_, String>(
            "SELECT permission FROM role_permissions WHERE role_id = $1 ORDER BY permission",
        )
        .bind(role_id)
        .fetch_all(&self.db)
        .await?;
        Ok(permissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_role_name() {
        assert!(check_role_name("Chef").is_ok());
        assert!(check_role_name(" Owner ").is_err());
        assert!(check_role_name("  ").is_err());
    }

    #[test]
    fn test_unknown_permission_rejected() {
        assert!(check_permissions(&["orders:view".to_string()]).is_ok());
        assert!(check_permissions(&["orders:fly".to_string()]).is_err());
    }
}
