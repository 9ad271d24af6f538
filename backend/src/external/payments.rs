//! Card payment processor client
//!
//! Talks to a Stripe-compatible API with form-encoded requests. Amounts cross
//! this boundary in minor currency units.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::PaymentsConfig;
use crate::error::{AppError, AppResult};

/// Processor view of a payment intent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub status: String,
    pub amount: i64,
}

/// Outbound payment operations
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        reference: &str,
        description: Option<&str>,
    ) -> AppResult<PaymentIntent>;

    async fn confirm_payment_intent(&self, intent_id: &str) -> AppResult<PaymentIntent>;

    /// `None` refunds whatever remains on the intent
    async fn create_refund(&self, intent_id: &str, amount_minor: Option<i64>) -> AppResult<Refund>;
}

#[derive(Debug, Deserialize)]
struct ProcessorErrorBody {
    error: ProcessorErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProcessorErrorDetail {
    message: Option<String>,
}

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    base_url: String,
}

impl StripeClient {
    pub fn new(config: &PaymentsConfig) -> Self {
        Self::with_base_url(config.secret_key.clone(), config.api_base.clone())
    }

    /// Point at another endpoint (for testing)
    pub fn with_base_url(secret_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            secret_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post_form<T, F>(&self, path: &str, form: &F) -> AppResult<T>
    where
        T: for<'de> Deserialize<'de>,
        F: Serialize + ?Sized,
    {
        if self.secret_key.is_empty() {
            return Err(AppError::Configuration(
                "Payment processor secret key is not set".to_string(),
            ));
        }

        let response = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::PaymentProcessor(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProcessorErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or(body);
            return Err(AppError::PaymentProcessor(format!("{} - {}", status, message)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::PaymentProcessor(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        reference: &str,
        description: Option<&str>,
    ) -> AppResult<PaymentIntent> {
        let amount = amount_minor.to_string();
        let mut form = vec![
            ("amount", amount.as_str()),
            ("currency", currency),
            ("metadata[order_id]", reference),
        ];
        if let Some(description) = description {
            form.push(("description", description));
        }
        self.post_form("payment_intents", &form).await
    }

    async fn confirm_payment_intent(&self, intent_id: &str) -> AppResult<PaymentIntent> {
        let form: [(&str, &str); 0] = [];
        self.post_form(&format!("payment_intents/{}/confirm", intent_id), &form)
            .await
    }

    async fn create_refund(&self, intent_id: &str, amount_minor: Option<i64>) -> AppResult<Refund> {
        let amount = amount_minor.map(|a| a.to_string());
        let mut form = vec![("payment_intent", intent_id)];
        if let Some(amount) = amount.as_deref() {
            form.push(("amount", amount));
        }
        self.post_form("refunds", &form).await
    }
}

/// Check a webhook body against its hex HMAC-SHA256 signature
pub fn verify_webhook_signature(secret: &str, body: &[u8], signature: &str) -> Result<(), String> {
    if secret.is_empty() {
        return Err("Webhook secret not configured".to_string());
    }
    let expected = hex::decode(signature.trim()).map_err(|_| "Signature is not hex")?;

    type HmacSha256 = Hmac<Sha256>;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "Failed to create HMAC")?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| "Signature mismatch".to_string())
}
