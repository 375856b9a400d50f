//! HTTP client for the authority's login and registration endpoints.

use crate::error::AppError;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, Token};

/// `POST /auth/login` and `POST /auth/create` against one authority.
#[derive(Clone)]
pub struct AuthClient {
    client: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(api_base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), api_base_url)
    }

    pub fn with_client(client: reqwest::Client, api_base_url: &str) -> Self {
        AuthClient {
            client,
            base_url: api_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Shared connection pool, for building a verifier against the same authority.
    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange credentials for a token.
    pub async fn login(&self, email: &str, password: &str) -> Result<Token, AppError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Login rejected");
            return Err(AppError::rejected(status.as_u16(), &body));
        }

        let parsed: LoginResponse = serde_json::from_str(&body)?;
        if parsed.token.is_empty() {
            return Err(AppError::Internal("login response carried an empty token".to_string()));
        }
        Ok(Token::new(parsed.token))
    }

    /// Create an account. Any 2xx counts as success; the body is ignored.
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), AppError> {
        let response = self
            .client
            .post(format!("{}/auth/create", self.base_url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "Registration rejected");
            return Err(AppError::rejected(status.as_u16(), &body));
        }
        Ok(())
    }
}
