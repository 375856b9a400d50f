//! Session subsystem: verification, the session controller, and route guards.

pub mod guard;
pub mod session;
pub mod verify;

#[cfg(test)]
pub(crate) mod testing;

pub use guard::{GuardDecision, MountedGuard, RouteGuard, home_location_for};
pub use session::{Revision, SessionController, SubscriptionId};
pub use verify::{HttpSessionVerifier, SessionVerifier, VerifyResult};
