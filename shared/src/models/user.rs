//! User, role and staff models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A login account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub business_id: Uuid,
    pub role_id: Uuid,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A role defining permissions within a business
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Role {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_system_role: bool,
}

/// Role with its `resource:action` permission strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<String>,
}

/// Resources guarded by permissions
pub const RESOURCES: &[&str] = &[
    "inventory",
    "purchases",
    "orders",
    "menu",
    "payments",
    "reports",
    "staff",
    "roles",
    "business",
];

/// Actions that can be granted on a resource
pub const ACTIONS: &[&str] = &["view", "create", "update", "delete"];

/// Check a permission string has the form `resource:action` with known parts
pub fn is_known_permission(permission: &str) -> bool {
    match permission.split_once(':') {
        Some((resource, action)) => RESOURCES.contains(&resource) && ACTIONS.contains(&action),
        None => false,
    }
}

/// Every permission, as granted to the owner role
pub fn all_permissions() -> Vec<String> {
    RESOURCES
        .iter()
        .flat_map(|r| ACTIONS.iter().map(move |a| format!("{}:{}", r, a)))
        .collect()
}

/// A member of kitchen or service staff
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StaffMember {
    pub id: Uuid,
    pub business_id: Uuid,
    pub role_id: Option<Uuid>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_permissions() {
        assert!(is_known_permission("orders:update"));
        assert!(!is_known_permission("orders:explode"));
        assert!(!is_known_permission("plots:view"));
        assert!(!is_known_permission("orders"));
    }

    #[test]
    fn test_all_permissions() {
        let all = all_permissions();
        assert_eq!(all.len(), RESOURCES.len() * ACTIONS.len());
        assert!(all.iter().all(|p| is_known_permission(p)));
    }
}
