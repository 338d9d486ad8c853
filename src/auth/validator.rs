use async_trait::async_trait;
use tracing::debug;

use super::cache::TokenCache;
use super::{client_token, AuthError, AuthType, UserContext};

/// Userinfo endpoint used when the configuration does not name one.
pub const DEFAULT_USERINFO_ENDPOINT: &str = "https://api.glean.com/v1/userinfo";

const TOKEN_CACHE_CAPACITY: usize = 1024;

/// Validation seam the session registry calls during session creation.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(
        &self,
        auth_type: AuthType,
        token: Option<&str>,
    ) -> Result<UserContext, AuthError>;
}

/// Production validator: OAuth tokens are introspected with a bearer
/// GET against the userinfo endpoint (results cached briefly), client
/// tokens are verified locally against the shared secret.
pub struct HttpAuthValidator {
    http: reqwest::Client,
    userinfo_endpoint: String,
    client_token_secret: Option<String>,
    cache: TokenCache,
}

impl HttpAuthValidator {
    pub fn new(userinfo_endpoint: impl Into<String>, client_token_secret: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            userinfo_endpoint: userinfo_endpoint.into(),
            client_token_secret,
            cache: TokenCache::new(TOKEN_CACHE_CAPACITY),
        }
    }

    async fn validate_oauth_token(&self, token: &str) -> Result<UserContext, AuthError> {
        if let Some(user_context) = self.cache.get(token) {
            debug!("OAuth token validated from cache");
            return Ok(user_context);
        }

        let response = self
            .http
            .get(&self.userinfo_endpoint)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::ValidationFailed(e.to_string()))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(AuthError::ValidationFailed(
                response.status().as_u16().to_string(),
            ));
        }

        let user_info: UserContext = response
            .json()
            .await
            .map_err(|e| AuthError::ValidationFailed(e.to_string()))?;

        self.cache.insert(token.to_string(), user_info.clone());
        Ok(user_info)
    }

    fn validate_client_token(&self, token: &str) -> Result<UserContext, AuthError> {
        let secret = self
            .client_token_secret
            .as_deref()
            .ok_or(AuthError::NotConfigured("client token secret"))?;
        client_token::validate_client_token(secret, token)
    }
}

#[async_trait]
impl TokenValidator for HttpAuthValidator {
    async fn validate(
        &self,
        auth_type: AuthType,
        token: Option<&str>,
    ) -> Result<UserContext, AuthError> {
        let token = token.ok_or(AuthError::MissingToken)?;
        match auth_type {
            AuthType::Oauth => self.validate_oauth_token(token).await,
            AuthType::ClientToken => self.validate_client_token(token),
        }
    }
}
