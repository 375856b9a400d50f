//! Session controller: the single owner of [`SessionState`].
//!
//! All writes go through [`SessionController::initialize`],
//! [`SessionController::login`] and [`SessionController::logout`]. Every
//! state change is pushed synchronously to subscribers.
//!
//! ## Stale responses
//!
//! Each session-changing operation advances a generation counter. A
//! verification result is applied only if the generation it was started
//! under is still current; otherwise it is dropped. This is what keeps a
//! slow verify reply from resurrecting a session after `logout()`, and
//! what keeps an older login from clobbering a newer one.
//!
//! ## Revisions
//!
//! Every applied transition also bumps a revision, handed to listeners with
//! the new state. Notifications run outside the lock and may arrive out of
//! order; a listener that caches state keeps only the highest revision.

use super::verify::{SessionVerifier, VerifyResult};
use crate::error::AuthFailure;
use crate::models::{Identity, SessionState, Token};
use crate::storage::CredentialStore;
use std::sync::{Arc, Mutex, MutexGuard};

/// Handle returned by [`SessionController::subscribe`].
pub type SubscriptionId = u64;

/// Position of a transition in the controller's history. Strictly increasing.
pub type Revision = u64;

type Listener = Arc<dyn Fn(&SessionState, Revision) + Send + Sync>;

struct Inner {
    state: SessionState,
    generation: u64,
    revision: Revision,
    initialized: bool,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl Inner {
    /// Move to `next`. Returns the listeners to notify and the new revision,
    /// or None if nothing changed.
    fn transition(&mut self, next: SessionState) -> Option<(Vec<Listener>, Revision)> {
        if self.state == next {
            return None;
        }
        self.state = next;
        self.revision += 1;
        let listeners = self.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
        Some((listeners, self.revision))
    }

    fn register(&mut self, listener: Listener) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    fn advance(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

pub struct SessionController<V> {
    verifier: V,
    store: Arc<dyn CredentialStore>,
    inner: Mutex<Inner>,
}

impl<V: SessionVerifier> SessionController<V> {
    pub fn new(verifier: V, store: Arc<dyn CredentialStore>) -> Self {
        SessionController {
            verifier,
            store,
            inner: Mutex::new(Inner {
                state: SessionState::Unknown,
                generation: 0,
                revision: 0,
                initialized: false,
                listeners: Vec::new(),
                next_subscription: 1,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Point-in-time copy of the current state.
    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn revision(&self) -> Revision {
        self.lock().revision
    }

    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    /// Settle the session from the stored credential. Runs once; later calls
    /// return the current state untouched.
    ///
    /// With no stored token this settles to `Unauthenticated` without
    /// contacting the verifier.
    pub async fn initialize(&self) -> SessionState {
        let generation = {
            let mut inner = self.lock();
            if inner.initialized {
                tracing::debug!("Session already initialized");
                return inner.state.clone();
            }
            inner.initialized = true;
            inner.advance()
        };

        match self.store.get() {
            Some(token) => self.verify_and_settle(token, generation).await,
            None => self.settle(generation, Err(AuthFailure::NoToken)),
        }
    }

    /// Store `token` and verify it. A token that fails verification is
    /// cleared again; the controller never stays half logged in.
    ///
    /// The current state is left in place until the verdict arrives.
    pub async fn login(&self, token: Token) -> SessionState {
        let generation = {
            let mut inner = self.lock();
            inner.initialized = true;
            self.store.set(token.clone());
            inner.advance()
        };
        tracing::debug!(action = "login", generation, "Verifying new credential");

        self.verify_and_settle(token, generation).await
    }

    /// Drop the session immediately. Any verification still in flight is
    /// invalidated. Safe to call repeatedly.
    pub fn logout(&self) {
        let change = {
            let mut inner = self.lock();
            let generation = inner.advance();
            self.store.clear();
            tracing::info!(action = "logout", generation, "Session cleared");
            inner.transition(SessionState::Unauthenticated)
        };

        if let Some((listeners, revision)) = change {
            notify(&listeners, &SessionState::Unauthenticated, revision);
        }
    }

    /// Register `listener` for state changes. It is called synchronously,
    /// outside the controller's lock, so it may read [`Self::state`] or call
    /// [`Self::logout`].
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&SessionState, Revision) + Send + Sync + 'static,
    {
        self.lock().register(Arc::new(listener))
    }

    /// Like [`Self::subscribe`], but also returns the state and revision as of
    /// registration, read under the same lock. No transition falls between
    /// the snapshot and the first notification.
    pub fn subscribe_with_snapshot<F>(
        &self,
        listener: F,
    ) -> (SubscriptionId, SessionState, Revision)
    where
        F: Fn(&SessionState, Revision) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        let id = inner.register(Arc::new(listener));
        (id, inner.state.clone(), inner.revision)
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(existing, _)| *existing != id);
        inner.listeners.len() != before
    }

    async fn verify_and_settle(&self, token: Token, generation: u64) -> SessionState {
        let outcome = match self.verifier.verify(&token).await {
            VerifyResult::Valid(identity) => Ok(identity),
            VerifyResult::Invalid => Err(AuthFailure::InvalidToken),
            VerifyResult::Error(e) => {
                tracing::warn!(error = %e, generation, "Session verification failed");
                Err(AuthFailure::TransportFailure)
            }
        };
        self.settle(generation, outcome)
    }

    /// Apply a verification outcome if `generation` is still current.
    fn settle(&self, generation: u64, outcome: Result<Identity, AuthFailure>) -> SessionState {
        let (state, change) = {
            let mut inner = self.lock();
            if inner.generation != generation {
                tracing::debug!(
                    generation,
                    current = inner.generation,
                    "Discarding stale verification response"
                );
                return inner.state.clone();
            }

            let next = match outcome {
                Ok(identity) => {
                    tracing::info!(
                        action = "session_authenticated",
                        email = %identity.email,
                        role = %identity.role,
                        generation,
                        "Session verified"
                    );
                    SessionState::Authenticated(identity)
                }
                Err(reason) => {
                    // Fail closed: a token that didn't verify is not kept
                    if reason != AuthFailure::NoToken {
                        self.store.clear();
                    }
                    tracing::info!(
                        action = "session_unauthenticated",
                        reason = %reason,
                        generation,
                        "Session not authenticated"
                    );
                    SessionState::Unauthenticated
                }
            };

            let change = inner.transition(next.clone());
            (next, change)
        };

        if let Some((listeners, revision)) = change {
            notify(&listeners, &state, revision);
        }
        state
    }
}

fn notify(listeners: &[Listener], state: &SessionState, revision: Revision) {
    for listener in listeners {
        listener(state, revision);
    }
}
