//! Authentication handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::external::OAuthClient;
use crate::services::auth::{
    AuthTokens, LoginInput, RefreshInput, RegisterBusinessInput, RegisterResponse,
};
use crate::services::AuthService;
use crate::AppState;

#[derive(Serialize)]
pub struct AuthorizationUrlResponse {
    pub url: String,
    pub state: String,
}

#[derive(Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: String,
    pub state: Option<String>,
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginInput>,
) -> Result<Json<AuthTokens>, AppError> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let tokens = auth_service.login(body).await?;
    Ok(Json(tokens))
}

/// Register business endpoint handler
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBusinessInput>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let result = auth_service.register_business(body).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// Refresh token endpoint handler
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshInput>,
) -> Result<Json<AuthTokens>, AppError> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let tokens = auth_service.refresh_token(&body.refresh_token).await?;
    Ok(Json(tokens))
}

/// Revoke a refresh token
pub async fn logout(
    State(state): State<AppState>,
    Json(body): Json<RefreshInput>,
) -> Result<StatusCode, AppError> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    auth_service.logout(&body.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Consent screen URL for the identity provider
pub async fn oauth_url(
    State(state): State<AppState>,
) -> Result<Json<AuthorizationUrlResponse>, AppError> {
    let client = OAuthClient::new(state.config.oauth.clone());
    // Random state for CSRF protection, checked by the dashboard
    let oauth_state = Uuid::new_v4().to_string();
    let url = client.authorization_url(&oauth_state)?;

    Ok(Json(AuthorizationUrlResponse {
        url,
        state: oauth_state,
    }))
}

/// Provider redirect target; signs the user in and returns tokens
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<Json<AuthTokens>, AppError> {
    if query.code.trim().is_empty() {
        return Err(AppError::validation("code", "authorization code is required"));
    }
    tracing::debug!(state = ?query.state, "OAuth callback received");

    let client = OAuthClient::new(state.config.oauth.clone());
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let tokens = auth_service.login_with_provider(&client, &query.code).await?;
    Ok(Json(tokens))
}
