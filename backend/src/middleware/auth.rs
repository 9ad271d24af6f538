//! Authentication middleware
//!
//! Bearer JWT validation and `resource:action` permission checks

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, ErrorDetail, ErrorResponse};
use crate::services::auth::decode_access_token;
use crate::AppState;

/// Caller identity taken from a verified access token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub business_id: Uuid,
    pub role_id: Uuid,
    pub permissions: Vec<String>,
}

impl AuthUser {
    pub fn has_permission(&self, resource: &str, action: &str) -> bool {
        let permission = format!("{}:{}", resource, action);
        self.permissions.contains(&permission)
    }

    /// `InsufficientPermissions` unless the caller holds `resource:action`
    pub fn require(&self, resource: &str, action: &str) -> Result<(), AppError> {
        if self.has_permission(resource, action) {
            Ok(())
        } else {
            tracing::debug!(user_id = %self.user_id, resource, action, "Permission denied");
            Err(AppError::InsufficientPermissions)
        }
    }
}

/// Validate the bearer token and attach the [`AuthUser`] to the request
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        Some(token) => token,
        None => return unauthorized_response("Missing or invalid Authorization header"),
    };

    let claims = match decode_access_token(token, &state.config.jwt.secret) {
        Ok(claims) => claims,
        Err(e) => return unauthorized_response(&e.to_string()),
    };

    let ids = (
        Uuid::parse_str(&claims.sub),
        Uuid::parse_str(&claims.business_id),
        Uuid::parse_str(&claims.role_id),
    );
    let (user_id, business_id, role_id) = match ids {
        (Ok(user_id), Ok(business_id), Ok(role_id)) => (user_id, business_id, role_id),
        _ => return unauthorized_response("Malformed identifiers in token"),
    };

    request.extensions_mut().insert(AuthUser {
        user_id,
        business_id,
        role_id,
        permissions: claims.permissions,
    });

    next.run(request).await
}

fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: ErrorDetail::new("UNAUTHORIZED", message),
    };
    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Extractor for the authenticated caller
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: ErrorDetail::new("UNAUTHORIZED", "Authentication required"),
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(permissions: &[&str]) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            role_id: Uuid::new_v4(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_permission_lookup() {
        let u = user(&["orders:view", "orders:update"]);
        assert!(u.has_permission("orders", "view"));
        assert!(!u.has_permission("orders", "delete"));
        assert!(u.require("orders", "update").is_ok());
        assert!(matches!(
            u.require("inventory", "view"),
            Err(AppError::InsufficientPermissions)
        ));
    }
}
