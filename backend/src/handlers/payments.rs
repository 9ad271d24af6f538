//! Client payment handlers, including the processor webhook

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::payments::verify_webhook_signature;
use crate::middleware::CurrentUser;
use crate::services::payments::{
    CreateIntentInput, PaymentFilter, PaymentIntentResponse, RefundInput, WebhookEvent,
};
use crate::services::PaymentService;
use crate::AppState;
use shared::Payment;

/// Header carrying the hex HMAC-SHA256 of the webhook body
const SIGNATURE_HEADER: &str = "x-signature";

#[derive(Serialize)]
pub struct WebhookResponse {
    pub received: bool,
}

fn payment_service(state: &AppState) -> PaymentService {
    PaymentService::new(
        state.db.clone(),
        state.payments.clone(),
        &state.config.payments.currency,
    )
}

pub async fn list_payments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<PaymentFilter>,
) -> AppResult<Json<Vec<Payment>>> {
    user.require("payments", "view")?;
    let payments = payment_service(&state)
        .list_payments(user.business_id, &filter)
        .await?;
    Ok(Json(payments))
}

/// Open a processor intent against an order balance
pub async fn create_intent(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateIntentInput>,
) -> AppResult<(StatusCode, Json<PaymentIntentResponse>)> {
    user.require("payments", "create")?;
    let intent = payment_service(&state)
        .create_intent(user.business_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(intent)))
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(payment_id): Path<Uuid>,
) -> AppResult<Json<Payment>> {
    user.require("payments", "update")?;
    let payment = payment_service(&state)
        .confirm(user.business_id, payment_id)
        .await?;
    Ok(Json(payment))
}

pub async fn refund_payment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(payment_id): Path<Uuid>,
    input: Option<Json<RefundInput>>,
) -> AppResult<Json<Payment>> {
    user.require("payments", "update")?;
    let input = input.map(|Json(i)| i).unwrap_or_default();
    let payment = payment_service(&state)
        .refund(user.business_id, payment_id, input)
        .await?;
    Ok(Json(payment))
}

/// Processor status push. Unauthenticated; trust comes from the signature.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookResponse>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing webhook signature".to_string()))?;

    if let Err(e) = verify_webhook_signature(&state.config.payments.webhook_secret, &body, signature)
    {
        tracing::warn!("Payment webhook signature verification failed: {}", e);
        return Err(AppError::Unauthorized("Invalid signature".to_string()));
    }

    let event: WebhookEvent = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!("Failed to parse payment webhook: {}", e);
        AppError::ValidationError(format!("Invalid request body: {}", e))
    })?;

    tracing::info!(event_type = %event.event_type, "Payment webhook received");
    payment_service(&state).handle_webhook(event).await?;

    Ok(Json(WebhookResponse { received: true }))
}
