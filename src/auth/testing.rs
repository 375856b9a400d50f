//! Scripted verifiers for unit tests.

use super::verify::{SessionVerifier, VerifyResult};
use crate::error::TransportError;
use crate::models::{Identity, Role, Token};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{oneshot, watch};

pub fn identity(email: &str, role: Role) -> Identity {
    Identity {
        email: email.to_string(),
        role,
    }
}

/// Answers immediately from a fixed table. Unknown tokens are invalid.
#[derive(Default)]
pub struct StaticVerifier {
    results: HashMap<String, VerifyResult>,
    calls: AtomicUsize,
}

impl StaticVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, token: &str, result: VerifyResult) -> Self {
        self.results.insert(token.to_string(), result);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SessionVerifier for StaticVerifier {
    async fn verify(&self, token: &Token) -> VerifyResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.results
            .get(token.as_str())
            .cloned()
            .unwrap_or(VerifyResult::Invalid)
    }
}

/// Holds every verification open until the test resolves it.
pub struct GatedVerifier {
    pending: Mutex<Vec<(String, oneshot::Sender<VerifyResult>)>>,
    calls: watch::Sender<usize>,
}

impl GatedVerifier {
    pub fn new() -> Self {
        GatedVerifier {
            pending: Mutex::new(Vec::new()),
            calls: watch::Sender::new(0),
        }
    }

    /// Wait until at least `n` verifications have started.
    pub async fn wait_for_calls(&self, n: usize) {
        let mut calls = self.calls.subscribe();
        let _ = calls.wait_for(|count| *count >= n).await;
    }

    /// Answer the oldest open verification for `token`.
    pub fn resolve(&self, token: &str, result: VerifyResult) {
        let sender = {
            let mut pending = self.pending.lock().unwrap();
            let index = pending
                .iter()
                .position(|(t, _)| t == token)
                .unwrap_or_else(|| panic!("no pending verification for {token}"));
            pending.remove(index).1
        };
        let _ = sender.send(result);
    }
}

impl SessionVerifier for GatedVerifier {
    async fn verify(&self, token: &Token) -> VerifyResult {
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .unwrap()
            .push((token.as_str().to_string(), tx));
        self.calls.send_modify(|count| *count += 1);

        rx.await
            .unwrap_or_else(|_| VerifyResult::Error(TransportError("verifier dropped".to_string())))
    }
}
