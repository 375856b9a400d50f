//! Route guards for protected screens.
//!
//! A guard never writes session state. It reads the controller's current
//! state and turns it into a [`GuardDecision`]; a [`MountedGuard`] keeps that
//! decision up to date through a subscription.

use super::session::{Revision, SessionController, SubscriptionId};
use super::verify::SessionVerifier;
use crate::models::{Role, SessionState};
use crate::routes::{ADMIN_HOME, LOGIN, USER_HOME};
use std::sync::{Arc, Mutex};

/// What a protected screen should do right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not settled yet; show a neutral waiting indicator.
    Pending,
    Allow,
    Redirect(&'static str),
}

/// Where each role lands when it hits a screen meant for the other role,
/// and after a successful login.
pub fn home_location_for(role: Role) -> &'static str {
    match role {
        Role::Admin => ADMIN_HOME,
        Role::User => USER_HOME,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteGuard {
    required_role: Option<Role>,
}

impl RouteGuard {
    pub const fn new(required_role: Option<Role>) -> Self {
        RouteGuard { required_role }
    }

    /// Any authenticated session passes.
    pub const fn authenticated() -> Self {
        Self::new(None)
    }

    pub const fn require(role: Role) -> Self {
        Self::new(Some(role))
    }

    pub fn required_role(&self) -> Option<Role> {
        self.required_role
    }

    pub fn evaluate(&self, state: &SessionState) -> GuardDecision {
        match state {
            SessionState::Unknown => GuardDecision::Pending,
            SessionState::Unauthenticated => GuardDecision::Redirect(LOGIN),
            SessionState::Authenticated(identity) => match self.required_role {
                None => GuardDecision::Allow,
                Some(required) if required == identity.role => GuardDecision::Allow,
                // Logged in, wrong area: send them to their own home, not to login
                Some(_) => GuardDecision::Redirect(home_location_for(identity.role)),
            },
        }
    }

    /// Subscribe this guard to `controller`. The returned handle tracks the
    /// latest decision and unsubscribes when dropped.
    pub fn mount<V: SessionVerifier>(
        self,
        controller: &SessionController<V>,
    ) -> MountedGuard<'_, V> {
        let tracked = Arc::new(Mutex::new(Tracked {
            revision: None,
            decision: self.evaluate(&SessionState::Unknown),
        }));
        let sink = Arc::clone(&tracked);
        let guard = self;
        let (subscription, state, revision) =
            controller.subscribe_with_snapshot(move |state, revision| {
                let next = guard.evaluate(state);
                if apply(&sink, revision, next) {
                    tracing::debug!(required_role = ?guard.required_role, decision = ?next, revision, "Guard re-evaluated");
                } else {
                    tracing::debug!(revision, "Ignoring superseded session notification");
                }
            });
        // A notification may already have landed; the snapshot never overrides a newer one
        apply(&tracked, revision, self.evaluate(&state));

        MountedGuard {
            controller,
            subscription,
            tracked,
        }
    }
}

struct Tracked {
    revision: Option<Revision>,
    decision: GuardDecision,
}

/// Record `decision` unless a later revision is already in place.
fn apply(tracked: &Mutex<Tracked>, revision: Revision, decision: GuardDecision) -> bool {
    let mut tracked = tracked.lock().unwrap_or_else(|e| e.into_inner());
    if tracked.revision.is_some_and(|seen| seen >= revision) {
        return false;
    }
    tracked.revision = Some(revision);
    tracked.decision = decision;
    true
}

/// A guard attached to a live controller.
pub struct MountedGuard<'a, V: SessionVerifier> {
    controller: &'a SessionController<V>,
    subscription: SubscriptionId,
    tracked: Arc<Mutex<Tracked>>,
}

impl<V: SessionVerifier> MountedGuard<'_, V> {
    pub fn decision(&self) -> GuardDecision {
        self.tracked.lock().unwrap_or_else(|e| e.into_inner()).decision
    }
}

impl<V: SessionVerifier> Drop for MountedGuard<'_, V> {
    fn drop(&mut self) {
        self.controller.unsubscribe(self.subscription);
    }
}
