//! Login, registration and logout flows.

use super::LOGIN;
use crate::auth::guard::home_location_for;
use crate::auth::session::SessionController;
use crate::auth::verify::SessionVerifier;
use crate::client::AuthClient;
use crate::error::AppError;
use crate::models::{RegisterRequest, SessionState};

pub const LOGIN_FALLBACK: &str = "Invalid email or password";
pub const REGISTER_FALLBACK: &str = "Registration failed";

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Result of submitting a form: go somewhere, or show a message on the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Navigate(&'static str),
    Error(String),
}

/// Blank fields never reach the authority. Everything else is the authority's call.
fn require_fields(fields: &[&str]) -> Result<(), AppError> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(AppError::BadRequest("All fields are required".to_string()));
    }
    Ok(())
}

/// Log in with email and password, then hand the token to the controller.
///
/// On success the user lands on their role's home.
pub async fn submit_login<V: SessionVerifier>(
    client: &AuthClient,
    controller: &SessionController<V>,
    form: &LoginForm,
) -> FormOutcome {
    if let Err(e) = require_fields(&[&form.email, &form.password]) {
        return FormOutcome::Error(e.form_message(LOGIN_FALLBACK));
    }

    let token = match client.login(&form.email, &form.password).await {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!(action = "login_failed", error = %e, "Login request failed");
            return FormOutcome::Error(e.form_message(LOGIN_FALLBACK));
        }
    };

    match controller.login(token).await {
        SessionState::Authenticated(identity) => {
            tracing::info!(action = "login", email = %identity.email, role = %identity.role, "User logged in");
            FormOutcome::Navigate(home_location_for(identity.role))
        }
        // Token issued but not verifiable, or superseded by a logout
        _ => FormOutcome::Error(LOGIN_FALLBACK.to_string()),
    }
}

/// Create an account. Success sends the user to the login screen.
pub async fn submit_register(client: &AuthClient, form: &RegisterForm) -> FormOutcome {
    if let Err(e) = require_fields(&[&form.username, &form.email, &form.password]) {
        return FormOutcome::Error(e.form_message(REGISTER_FALLBACK));
    }
    if form.password != form.confirm_password {
        return FormOutcome::Error("Passwords do not match".to_string());
    }

    let request = RegisterRequest {
        username: form.username.clone(),
        email: form.email.clone(),
        password: form.password.clone(),
    };
    match client.register(&request).await {
        Ok(()) => {
            tracing::info!(action = "user_registered", username = %form.username, "Account created");
            FormOutcome::Navigate(LOGIN)
        }
        Err(e) => {
            tracing::warn!(action = "register_failed", error = %e, "Registration failed");
            FormOutcome::Error(e.form_message(REGISTER_FALLBACK))
        }
    }
}

/// End the session and return where to go next.
pub fn logout<V: SessionVerifier>(controller: &SessionController<V>) -> &'static str {
    controller.logout();
    LOGIN
}
