//! OAuth2 identity provider client (Google-style authorization code flow)

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::config::OAuthConfig;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct OAuthClient {
    client: Client,
    config: OAuthConfig,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<i64>,
    pub id_token: Option<String>,
}

/// OpenID Connect userinfo
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub name: Option<String>,
}

impl UserInfo {
    /// Best available display name, falling back to the mailbox
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.trim().to_string();
        }
        let joined = [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if !joined.trim().is_empty() {
            return joined.trim().to_string();
        }
        self.email.split('@').next().unwrap_or_default().to_string()
    }
}

impl OAuthClient {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn ensure_configured(&self) -> AppResult<()> {
        if self.config.client_id.is_empty() || self.config.client_secret.is_empty() {
            return Err(AppError::Configuration(
                "OAuth client credentials are not set".to_string(),
            ));
        }
        Ok(())
    }

    /// Consent screen URL carrying `state`
    pub fn authorization_url(&self, state: &str) -> AppResult<String> {
        self.ensure_configured()?;
        let url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", "openid email profile"),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::Configuration(format!("Invalid OAuth auth_url: {}", e)))?;
        Ok(url.to_string())
    }

    pub async fn exchange_code(&self, code: &str) -> AppResult<TokenResponse> {
        self.ensure_configured()?;
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Identity provider error: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Token exchange failed: {}",
                error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to parse token response: {}", e)))
    }

    pub async fn user_info(&self, access_token: &str) -> AppResult<UserInfo> {
        let response = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Identity provider error: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Profile fetch failed: {}",
                error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to parse profile: {}", e)))
    }
}
