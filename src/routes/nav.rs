//! Navigation chrome: which links the header shows for a session.

use super::{ADMIN_HOME, HOME, LOGIN, MANAGE_SWEETS, REGISTER, USER_HOME};
use crate::models::{Role, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    Navigate(&'static str),
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub action: NavAction,
}

const fn link(label: &'static str, path: &'static str) -> NavLink {
    NavLink {
        label,
        action: NavAction::Navigate(path),
    }
}

const LOGOUT: NavLink = NavLink {
    label: "Logout",
    action: NavAction::Logout,
};

const PUBLIC_LINKS: &[NavLink] = &[link("Home", HOME), link("Login", LOGIN), link("Register", REGISTER)];
const ADMIN_LINKS: &[NavLink] = &[
    link("Admin Home", ADMIN_HOME),
    link("Manage Sweets", MANAGE_SWEETS),
    LOGOUT,
];
const USER_LINKS: &[NavLink] = &[link("Home", HOME), link("Dashboard", USER_HOME), LOGOUT];

/// Links for the current session. Unsettled sessions get the public set.
pub fn nav_links(state: &SessionState) -> &'static [NavLink] {
    match state.role() {
        Some(Role::Admin) => ADMIN_LINKS,
        Some(Role::User) => USER_LINKS,
        None => PUBLIC_LINKS,
    }
}

/// Where the brand logo points.
pub fn brand_target(state: &SessionState) -> &'static str {
    match state.role() {
        Some(Role::Admin) => ADMIN_HOME,
        _ => HOME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identity;

    fn authed(role: Role) -> SessionState {
        SessionState::Authenticated(Identity {
            email: "x@shop.com".to_string(),
            role,
        })
    }

    fn labels(links: &[NavLink]) -> Vec<&'static str> {
        links.iter().map(|l| l.label).collect()
    }

    #[test]
    fn test_public_links() {
        assert_eq!(
            labels(nav_links(&SessionState::Unauthenticated)),
            vec!["Home", "Login", "Register"]
        );
        assert_eq!(nav_links(&SessionState::Unknown), PUBLIC_LINKS);
        assert_eq!(brand_target(&SessionState::Unauthenticated), "/home");
    }

    #[test]
    fn test_admin_links() {
        let links = nav_links(&authed(Role::Admin));
        assert_eq!(labels(links), vec!["Admin Home", "Manage Sweets", "Logout"]);
        assert_eq!(links[1].action, NavAction::Navigate("/admin/manage-sweets"));
        assert_eq!(brand_target(&authed(Role::Admin)), "/admin");
    }

    #[test]
    fn test_user_links_end_with_logout() {
        let links = nav_links(&authed(Role::User));
        assert_eq!(labels(links), vec!["Home", "Dashboard", "Logout"]);
        assert_eq!(links.last().map(|l| l.action), Some(NavAction::Logout));
    }
}
