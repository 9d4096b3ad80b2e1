//! 访问 LOGIN_REQUIRED 链接时的凭证校验

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{Result, ShareLinkError};

/// 已通过校验的访问者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

/// 凭证校验器，由宿主注入
#[async_trait]
pub trait AuthVerifier: Send + Sync {
    /// 失败返回 `AuthInvalid`
    async fn verify(&self, credential: &str) -> Result<AuthenticatedUser>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_type: String,
}

/// HS256 JWT 校验
pub struct JwtAuthVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtAuthVerifier {
    pub fn new(secret: &str) -> Self {
        if secret.is_empty() {
            warn!("JWT secret is empty; every LOGIN_REQUIRED credential will be forgeable");
        }
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// 签发访问 token（宿主登录流程与测试使用）
    pub fn generate_access_token(&self, user_id: &str, ttl_minutes: i64) -> Result<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: "access".to_string(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }
}

#[async_trait]
impl AuthVerifier for JwtAuthVerifier {
    async fn verify(&self, credential: &str) -> Result<AuthenticatedUser> {
        let credential = credential.strip_prefix("Bearer ").unwrap_or(credential).trim();
        let token_data = decode::<AccessClaims>(credential, &self.decoding_key, &Validation::default())?;

        if token_data.claims.token_type != "access" {
            return Err(ShareLinkError::auth_invalid("Unexpected token type"));
        }
        if token_data.claims.sub.is_empty() {
            return Err(ShareLinkError::auth_invalid("Token subject is empty"));
        }

        debug!("Credential verified for user {}", token_data.claims.sub);
        Ok(AuthenticatedUser {
            user_id: token_data.claims.sub,
        })
    }
}
