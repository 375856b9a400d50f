//! Client route table and navigation resolution.

pub mod auth;
pub mod nav;

use crate::auth::guard::{GuardDecision, RouteGuard, home_location_for};
use crate::models::{Role, SessionState};

pub const ROOT: &str = "/";
pub const LOGIN: &str = "/login";
pub const REGISTER: &str = "/register";
pub const HOME: &str = "/home";
pub const SWEETS: &str = "/sweets";
pub const USER_HOME: &str = "/user/dashboard";
pub const ADMIN_HOME: &str = "/admin";
pub const MANAGE_SWEETS: &str = "/admin/manage-sweets";

/// Who may render a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Public, but an authenticated session is sent to its home instead.
    GuestOnly,
    Protected(RouteGuard),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub access: Access,
}

/// Every screen the client knows about. `/` and anything unlisted go to login.
pub const ROUTES: &[Route] = &[
    Route {
        path: LOGIN,
        access: Access::GuestOnly,
    },
    Route {
        path: REGISTER,
        access: Access::Public,
    },
    Route {
        path: HOME,
        access: Access::Public,
    },
    Route {
        path: SWEETS,
        access: Access::Protected(RouteGuard::authenticated()),
    },
    Route {
        path: USER_HOME,
        access: Access::Protected(RouteGuard::require(Role::User)),
    },
    Route {
        path: ADMIN_HOME,
        access: Access::Protected(RouteGuard::require(Role::Admin)),
    },
    Route {
        path: MANAGE_SWEETS,
        access: Access::Protected(RouteGuard::require(Role::Admin)),
    },
];

/// Outcome of navigating to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(&'static str),
    Pending,
    Redirect(&'static str),
}

/// Look up a route by exact path. A single trailing slash is ignored.
pub fn find_route(path: &str) -> Option<&'static Route> {
    let path = match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    };
    ROUTES.iter().find(|route| route.path == path)
}

/// Decide what navigating to `path` does under `state`.
pub fn resolve(path: &str, state: &SessionState) -> Navigation {
    let Some(route) = find_route(path) else {
        return Navigation::Redirect(LOGIN);
    };

    match route.access {
        Access::Public => Navigation::Render(route.path),
        Access::GuestOnly => match state {
            SessionState::Unknown => Navigation::Pending,
            SessionState::Authenticated(identity) => {
                Navigation::Redirect(home_location_for(identity.role))
            }
            SessionState::Unauthenticated => Navigation::Render(route.path),
        },
        Access::Protected(guard) => match guard.evaluate(state) {
            GuardDecision::Pending => Navigation::Pending,
            GuardDecision::Allow => Navigation::Render(route.path),
            GuardDecision::Redirect(location) => Navigation::Redirect(location),
        },
    }
}
