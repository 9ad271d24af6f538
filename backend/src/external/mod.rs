//! External API integrations

pub mod oauth;
pub mod payments;

pub use oauth::OAuthClient;
pub use payments::{PaymentProcessor, StripeClient};
