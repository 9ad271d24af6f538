//! Authentication service for business registration, login, and token management

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::external::OAuthClient;
use shared::{all_permissions, validate_phone};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

/// Input for registering a new business with its owner account
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterBusinessInput {
    #[validate(length(min = 1, max = 200))]
    pub business_name: String,
    #[validate(length(min = 1, max = 200))]
    pub owner_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub phone: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

/// Response after successful registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub business_id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub tokens: AuthTokens,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub business_id: String,
    pub role_id: String,
    pub permissions: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    business_id: Uuid,
    role_id: Uuid,
    password_hash: Option<String>,
    is_active: bool,
}

/// Identity handed back by an external identity provider
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub subject: String,
    pub email: String,
    pub name: String,
}

/// Owner account created together with its business
pub(crate) struct NewOwner<'a> {
    pub business_name: &'a str,
    pub owner_name: &'a str,
    pub email: &'a str,
    pub password_hash: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub city: Option<&'a str>,
    pub oauth_subject: Option<&'a str>,
}

impl AuthService {
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
        }
    }

    /// Register a new business with owner account
    pub async fn register_business(
        &self,
        input: RegisterBusinessInput,
    ) -> AppResult<RegisterResponse> {
        input.validate()?;
        if let Some(phone) = &input.phone {
            validate_phone(phone).map_err(|msg| AppError::validation("phone", msg))?;
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let mut tx = self.db.begin().await?;
        let (business_id, role_id, user_id) = create_business_with_owner(
            &mut tx,
            NewOwner {
                business_name: &input.business_name,
                owner_name: &input.owner_name,
                email: &input.email,
                password_hash: Some(&password_hash),
                phone: input.phone.as_deref(),
                city: input.city.as_deref(),
                oauth_subject: None,
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(%business_id, %user_id, "Business registered");

        let tokens = self.issue_tokens(user_id, business_id, role_id).await?;
        Ok(RegisterResponse {
            business_id,
            user_id,
            tokens,
        })
    }

    /// Authenticate user with email and password
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthTokens> {
        input.validate()?;

        let user = sqlx::query_as::<_, UserRow>(
            "SELECT id, business_id, role_id, password_hash, is_active FROM users WHERE email = $1",
        )
        .bind(&input.email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AppError::Unauthorized("Account is disabled".to_string()));
        }

        // Accounts created through the identity provider have no password
        let stored = user
            .password_hash
            .as_deref()
            .ok_or(AppError::InvalidCredentials)?;
        let valid = verify(&input.password, stored)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(&self.db)
            .await?;

        self.issue_tokens(user.id, user.business_id, user.role_id).await
    }

    /// Rotate a refresh token: the old one is revoked, a new pair issued
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        let token_hash = hash_token(refresh_token);

        let (user_id, business_id, role_id) = sqlx::query_as::<_, (Uuid, Uuid, Uuid)>(
            r#"
            UPDATE refresh_tokens rt
            SET revoked_at = NOW()
            FROM users u
            WHERE rt.token_hash = $1
              AND u.id = rt.user_id
              AND rt.expires_at > NOW()
              AND rt.revoked_at IS NULL
              AND u.is_active = true
            RETURNING u.id, u.business_id, u.role_id
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired refresh token".to_string()))?;

        self.issue_tokens(user_id, business_id, role_id).await
    }

    /// Revoke a refresh token; unknown tokens are ignored
    pub async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(hash_token(refresh_token))
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Sign in a user verified by the identity provider, creating a business
    /// and owner account on first sight of the email.
    pub async fn login_external(&self, identity: ExternalIdentity) -> AppResult<AuthTokens> {
        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, (Uuid, Uuid, Uuid, bool)>(
            r#"
            UPDATE users SET oauth_subject = $2, last_login_at = NOW(), updated_at = NOW()
            WHERE email = $1
            RETURNING id, business_id, role_id, is_active
            "#,
        )
        .bind(&identity.email)
        .bind(&identity.subject)
        .fetch_optional(&mut *tx)
        .await?;

        let (user_id, business_id, role_id) = match existing {
            Some((_, _, _, false)) => {
                return Err(AppError::Unauthorized("Account is disabled".to_string()))
            }
            Some((user_id, business_id, role_id, true)) => (user_id, business_id, role_id),
            None => {
                let business_name = format!("{} Catering", identity.name);
                let (business_id, role_id, user_id) = create_business_with_owner(
                    &mut tx,
                    NewOwner {
                        business_name: &business_name,
                        owner_name: &identity.name,
                        email: &identity.email,
                        password_hash: None,
                        phone: None,
                        city: None,
                        oauth_subject: Some(&identity.subject),
                    },
                )
                .await?;
                tracing::info!(%business_id, %user_id, "Business registered through identity provider");
                (user_id, business_id, role_id)
            }
        };
        tx.commit().await?;

        self.issue_tokens(user_id, business_id, role_id).await
    }

    /// Complete the authorization code flow and sign the user in
    pub async fn login_with_provider(
        &self,
        client: &OAuthClient,
        code: &str,
    ) -> AppResult<AuthTokens> {
        if code.trim().is_empty() {
            return Err(AppError::validation("code", "Authorization code is required"));
        }
        let token = client.exchange_code(code).await?;
        let info = client.user_info(&token.access_token).await?;
        if !info.email_verified {
            return Err(AppError::Unauthorized(
                "Identity provider did not verify the email address".to_string(),
            ));
        }

        self.login_external(ExternalIdentity {
            name: info.display_name(),
            subject: info.sub,
            email: info.email,
        })
        .await
    }

    async fn get_role_permissions(&self, role_id: Uuid) -> AppResult<Vec<String>> {
        let permissions = sqlx::query_scalar::<_, String>(
            "SELECT permission FROM role_permissions WHERE role_id = $1 ORDER BY permission",
        )
        .bind(role_id)
        .fetch_all(&self.db)
        .await?;
        Ok(permissions)
    }

    async fn issue_tokens(
        &self,
        user_id: Uuid,
        business_id: Uuid,
        role_id: Uuid,
    ) -> AppResult<AuthTokens> {
        let permissions = self.get_role_permissions(role_id).await?;
        let access_token = encode_access_token(
            &self.jwt_secret,
            self.access_token_expiry,
            user_id,
            business_id,
            role_id,
            permissions,
        )?;

        let refresh_token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::seconds(self.refresh_token_expiry);
        sqlx::query(
            "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(hash_token(&refresh_token))
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }
}

/// Insert a business, its `owner` system role holding every permission, and
/// the owner user. Returns `(business_id, role_id, user_id)`.
pub(crate) async fn create_business_with_owner(
    tx: &mut Transaction<'static, Postgres>,
    owner: NewOwner<'_>,
) -> AppResult<(Uuid, Uuid, Uuid)> {
    let business_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO businesses (name, email, phone, city) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(owner.business_name)
    .bind(owner.email)
    .bind(owner.phone)
    .bind(owner.city)
    .fetch_one(&mut **tx)
    .await?;

    let role_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO roles (business_id, name, description, is_system_role)
        VALUES ($1, 'owner', 'Full access to the business', true)
        RETURNING id
        "#,
    )
    .bind(business_id)
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query(
        "INSERT INTO role_permissions (role_id, permission) SELECT $1, UNNEST($2::text[])",
    )
    .bind(role_id)
    .bind(all_permissions())
    .execute(&mut **tx)
    .await?;

    let user_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO users (business_id, role_id, email, password_hash, name, phone, oauth_subject)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(business_id)
    .bind(role_id)
    .bind(owner.email)
    .bind(owner.password_hash)
    .bind(owner.owner_name)
    .bind(owner.phone)
    .bind(owner.oauth_subject)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| AppError::from_unique(e, "email"))?;

    Ok((business_id, role_id, user_id))
}

/// Sign an HS256 access token
pub fn encode_access_token(
    secret: &str,
    expiry_secs: i64,
    user_id: Uuid,
    business_id: Uuid,
    role_id: Uuid,
    permissions: Vec<String>,
) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        business_id: business_id.to_string(),
        role_id: role_id.to_string(),
        permissions,
        exp: (now + Duration::seconds(expiry_secs)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Verify signature and expiry of an access token
pub fn decode_access_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

/// SHA-256 hex digest; refresh tokens are only stored in this form
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_stable_hex() {
        let a = hash_token("refresh-token");
        assert_eq!(a.len(), 64);
        assert_eq!(a, hash_token("refresh-token"));
        assert_ne!(a, hash_token("refresh-token2"));
    }

    #[test]
    fn test_access_token_roundtrip() {
        let user_id = Uuid::new_v4();
        let business_id = Uuid::new_v4();
        let role_id = Uuid::new_v4();
        let token = encode_access_token(
            "secret",
            60,
            user_id,
            business_id,
            role_id,
            vec!["orders:view".to_string()],
        )
        .unwrap();

        let claims = decode_access_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.business_id, business_id.to_string());
        assert_eq!(claims.permissions, vec!["orders:view".to_string()]);
    }

    #[test]
    fn test_access_token_rejects_wrong_secret() {
        let token = encode_access_token(
            "secret",
            60,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![],
        )
        .unwrap();
        assert!(matches!(
            decode_access_token(&token, "other"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_register_input_validation() {
        let input = RegisterBusinessInput {
            business_name: "Lahore Feasts".to_string(),
            owner_name: "Owner".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            phone: None,
            city: None,
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));
    }
}
