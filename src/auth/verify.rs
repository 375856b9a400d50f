//! Session verification against the authentication authority.

use crate::error::TransportError;
use crate::models::{Identity, Role, Token, VerifyResponse};
use reqwest::StatusCode;
use std::future::Future;

/// Verdict for one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid(Identity),
    /// The authority explicitly rejected the token.
    Invalid,
    Error(TransportError),
}

/// Asks an external authority whether a token is still good.
///
/// Implementations keep no mutable state between calls: concurrent
/// verifications of different tokens must not affect each other, and a
/// failed call is never retried here.
pub trait SessionVerifier: Send + Sync {
    fn verify(&self, token: &Token) -> impl Future<Output = VerifyResult> + Send;
}

/// `GET {api_base_url}/auth/verify` with the token as a bearer credential.
#[derive(Clone)]
pub struct HttpSessionVerifier {
    client: reqwest::Client,
    verify_url: String,
}

impl HttpSessionVerifier {
    pub fn new(api_base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), api_base_url)
    }

    /// Share an existing connection pool.
    pub fn with_client(client: reqwest::Client, api_base_url: &str) -> Self {
        HttpSessionVerifier {
            client,
            verify_url: format!("{}/auth/verify", api_base_url.trim_end_matches('/')),
        }
    }

    async fn request(&self, token: &Token) -> Result<VerifyResult, TransportError> {
        let response = self
            .client
            .get(&self.verify_url)
            .bearer_auth(token.as_str())
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        classify(status, &body)
    }
}

fn is_rejection(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// Verdict for a verify response. A 401/403 is a rejection whatever the
/// body claims; only a 2xx body is consulted.
pub fn classify(status: StatusCode, body: &[u8]) -> Result<VerifyResult, TransportError> {
    if is_rejection(status) {
        return Ok(VerifyResult::Invalid);
    }
    if !status.is_success() {
        return Err(TransportError(format!(
            "unexpected status {} from verify endpoint",
            status.as_u16()
        )));
    }

    let verdict = serde_json::from_slice::<VerifyResponse>(body)
        .map_err(|e| TransportError(format!("malformed verify response: {}", e)))?;
    interpret(verdict)
}

/// Map a decoded response to a verdict. A "valid" answer without a complete
/// identity is malformed, never a partial login.
pub fn interpret(verdict: VerifyResponse) -> Result<VerifyResult, TransportError> {
    if !verdict.valid {
        return Ok(VerifyResult::Invalid);
    }

    let email = verdict
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| TransportError("valid verify response without email".to_string()))?;
    let role = verdict
        .role
        .ok_or_else(|| TransportError("valid verify response without role".to_string()))?
        .parse::<Role>()
        .map_err(TransportError)?;

    Ok(VerifyResult::Valid(Identity { email, role }))
}

impl SessionVerifier for HttpSessionVerifier {
    async fn verify(&self, token: &Token) -> VerifyResult {
        match self.request(token).await {
            Ok(result) => result,
            Err(e) => VerifyResult::Error(e),
        }
    }
}
