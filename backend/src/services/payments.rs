//! Client payments: processor intents applied to order settlement

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::PaymentProcessor;
use crate::ledger;
use crate::store::{LedgerStore, PgStore};
use shared::{
    collectable_amount, require_positive, require_scale, to_minor_units, Payment, PaymentState,
    MONEY_DP,
};

const PAYMENT_COLUMNS: &str = "id, business_id, order_id, processor_intent_id, amount, currency, \
    status, refunded_amount, description, applied_at, created_at, updated_at";

#[derive(Clone)]
pub struct PaymentService {
    db: PgPool,
    processor: Arc<dyn PaymentProcessor>,
    currency: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateIntentInput {
    pub order_id: Uuid,
    pub amount: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefundInput {
    /// Defaults to everything still refundable
    pub amount: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentFilter {
    pub order_id: Option<Uuid>,
}

/// New intent plus the secret the dashboard needs to collect the card
#[derive(Debug, Serialize)]
pub struct PaymentIntentResponse {
    #[serde(flatten)]
    pub payment: Payment,
    pub client_secret: Option<String>,
}

/// Event pushed by the processor
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: WebhookObject,
}

#[derive(Debug, Deserialize)]
pub struct WebhookObject {
    pub id: String,
    pub status: String,
}

impl PaymentService {
    pub fn new(db: PgPool, processor: Arc<dyn PaymentProcessor>, currency: &str) -> Self {
        Self {
            db,
            processor,
            currency: currency.to_string(),
        }
    }

    pub async fn list_payments(
        &self,
        business_id: Uuid,
        filter: &PaymentFilter,
    ) -> AppResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE business_id = $1 AND ($2::uuid IS NULL OR order_id = $2) \
             ORDER BY created_at DESC",
            PAYMENT_COLUMNS
        ))
        .bind(business_id)
        .bind(filter.order_id)
        .fetch_all(&self.db)
        .await?;
        Ok(payments)
    }

    /// Open a processor intent for part or all of an order's balance.
    ///
    /// Intents still pending count against the balance, so settled intents
    /// can never add up to more than the contract value.
    pub async fn create_intent(
        &self,
        business_id: Uuid,
        input: CreateIntentInput,
    ) -> AppResult<PaymentIntentResponse> {
        require_positive("amount", input.amount)?;
        require_scale("amount", input.amount, MONEY_DP)?;

        let mut store = PgStore::begin(&self.db).await?;
        let order = store
            .lock_order(business_id, input.order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        if order.status.is_terminal() {
            return Err(AppError::InvalidStateTransition(format!(
                "Order {} is closed",
                order.order_number
            )));
        }

        let pending = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE order_id = $1 AND status = $2",
        )
        .bind(order.id)
        .bind(PaymentState::Pending)
        .fetch_one(store.conn())
        .await?;
        let collectable = collectable_amount(order.remaining_balance, pending);
        if input.amount > collectable {
            return Err(AppError::validation(
                "amount",
                format!(
                    "amount {} exceeds the collectable {} (balance {} with {} pending)",
                    input.amount, collectable, order.remaining_balance, pending
                ),
            ));
        }
        let minor = to_minor_units(input.amount)
            .ok_or_else(|| AppError::validation("amount", "amount is out of range"))?;

        let description = input
            .description
            .unwrap_or_else(|| format!("Payment for {}", order.order_number));
        let intent = self
            .processor
            .create_payment_intent(minor, &self.currency, &order.id.to_string(), Some(&description))
            .await?;

        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (business_id, order_id, processor_intent_id, amount, currency, status, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(business_id)
        .bind(order.id)
        .bind(&intent.id)
        .bind(input.amount)
        .bind(&intent.currency)
        .bind(PaymentState::Pending)
        .bind(&description)
        .fetch_one(store.conn())
        .await
        .map_err(|e| AppError::from_unique(e, "processor_intent_id"))?;
        store.commit().await?;

        tracing::info!(
            %business_id,
            payment_id = %payment.id,
            order_id = %order.id,
            amount = %payment.amount,
            "Payment intent created"
        );

        // Some processors settle immediately
        let payment = if PaymentState::from_processor(&intent.status) == PaymentState::Succeeded {
            self.record_status(payment.id, Some(business_id), PaymentState::Succeeded)
                .await?
        } else {
            payment
        };

        Ok(PaymentIntentResponse {
            payment,
            client_secret: intent.client_secret,
        })
    }

    /// Confirm with the processor; success raises the order's advance
    pub async fn confirm(&self, business_id: Uuid, payment_id: Uuid) -> AppResult<Payment> {
        let payment = self.get_payment(business_id, payment_id).await?;
        if payment.status != PaymentState::Pending {
            return Ok(payment);
        }

        let intent = self
            .processor
            .confirm_payment_intent(&payment.processor_intent_id)
            .await?;
        let state = PaymentState::from_processor(&intent.status);
        self.record_status(payment_id, Some(business_id), state).await
    }

    /// Take the amount back off the order, then refund through the processor.
    ///
    /// The local changes commit only once the processor accepts the refund.
    pub async fn refund(
        &self,
        business_id: Uuid,
        payment_id: Uuid,
        input: RefundInput,
    ) -> AppResult<Payment> {
        let mut store = PgStore::begin(&self.db).await?;
        let payment = lock_payment(&mut store, payment_id, Some(business_id)).await?;
        let refundable = payment.refundable();
        if refundable <= Decimal::ZERO {
            return Err(AppError::InvalidStateTransition(format!(
                "Payment is {} and cannot be refunded",
                payment.status.as_str()
            )));
        }

        let amount = input.amount.unwrap_or(refundable);
        require_positive("amount", amount)?;
        require_scale("amount", amount, MONEY_DP)?;
        if amount > refundable {
            return Err(AppError::validation(
                "amount",
                format!("amount {} exceeds the refundable {}", amount, refundable),
            ));
        }
        let minor = to_minor_units(amount)
            .ok_or_else(|| AppError::validation("amount", "amount is out of range"))?;

        if payment.applied_at.is_some() {
            ledger::reverse_refunded_payment(&mut store, payment.business_id, payment.order_id, amount)
                .await?;
        }

        let refunded_amount = payment.refunded_amount + amount;
        let status = if refunded_amount >= payment.amount {
            PaymentState::Refunded
        } else {
            PaymentState::PartiallyRefunded
        };
        let updated = sqlx::query_as::<_, Payment>(&format!(
            "UPDATE payments SET refunded_amount = $2, status = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            PAYMENT_COLUMNS
        ))
        .bind(payment_id)
        .bind(refunded_amount)
        .bind(status)
        .fetch_one(store.conn())
        .await?;

        let refund = self
            .processor
            .create_refund(&payment.processor_intent_id, Some(minor))
            .await?;
        if refund.status == "failed" || refund.status == "canceled" {
            return Err(AppError::PaymentProcessor(format!(
                "Refund {} was {}",
                refund.id, refund.status
            )));
        }
        store.commit().await?;

        tracing::info!(
            %business_id,
            %payment_id,
            refund_id = %refund.id,
            amount = %amount,
            "Payment refunded"
        );
        Ok(updated)
    }

    /// Apply a processor status push; unknown intents are ignored
    pub async fn handle_webhook(&self, event: WebhookEvent) -> AppResult<()> {
        let object = event.data.object;
        let payment_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM payments WHERE processor_intent_id = $1",
        )
        .bind(&object.id)
        .fetch_optional(&self.db)
        .await?;

        let Some(payment_id) = payment_id else {
            tracing::debug!(event_type = %event.event_type, object_id = %object.id, "Webhook for unknown intent");
            return Ok(());
        };

        let state = PaymentState::from_processor(&object.status);
        self.record_status(payment_id, None, state).await?;
        Ok(())
    }

    async fn get_payment(&self, business_id: Uuid, payment_id: Uuid) -> AppResult<Payment> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE id = $1 AND business_id = $2",
            PAYMENT_COLUMNS
        ))
        .bind(payment_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment".to_string()))
    }

    /// Store a new processor state. The first time a payment succeeds its
    /// amount is applied to the order in the same transaction.
    async fn record_status(
        &self,
        payment_id: Uuid,
        business_id: Option<Uuid>,
        state: PaymentState,
    ) -> AppResult<Payment> {
        let mut store = PgStore::begin(&self.db).await?;
        let payment = lock_payment(&mut store, payment_id, business_id).await?;

        // Refund states are owned locally; the processor only moves pending intents
        if payment.status != PaymentState::Pending || state == PaymentState::Pending {
            store.commit().await?;
            return Ok(payment);
        }

        // Captured money is recorded even when the order can no longer absorb it
        let applied_at = if state == PaymentState::Succeeded && payment.applied_at.is_none() {
            ledger::apply_captured_payment(
                &mut store,
                payment.business_id,
                payment.order_id,
                payment.amount,
            )
            .await?
            .map(|_| Utc::now())
        } else {
            payment.applied_at
        };

        let updated = sqlx::query_as::<_, Payment>(&format!(
            "UPDATE payments SET status = $2, applied_at = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            PAYMENT_COLUMNS
        ))
        .bind(payment_id)
        .bind(state)
        .bind(applied_at)
        .fetch_one(store.conn())
        .await?;
        store.commit().await?;

        tracing::info!(
            business_id = %updated.business_id,
            %payment_id,
            status = updated.status.as_str(),
            "Payment status recorded"
        );
        Ok(updated)
    }
}

async fn lock_payment(
    store: &mut PgStore,
    payment_id: Uuid,
    business_id: Option<Uuid>,
) -> AppResult<Payment> {
    sqlx::query_as::<_, Payment>(&format!(
        "SELECT {} FROM payments WHERE id = $1 AND ($2::uuid IS NULL OR business_id = $2) FOR UPDATE",
        PAYMENT_COLUMNS
    ))
    .bind(payment_id)
    .bind(business_id)
    .fetch_optional(store.conn())
    .await?
    .ok_or_else(|| AppError::NotFound("Payment".to_string()))
}
