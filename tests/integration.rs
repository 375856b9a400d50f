//! Integration tests for the session client against a fake authority.
//!
//! The authority is a small axum app on 127.0.0.1:0 that speaks the same
//! `/api/auth/*` contract as the real backend.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use sweetspot::{
    auth::{GuardDecision, HttpSessionVerifier, RouteGuard, SessionController, SessionVerifier, VerifyResult},
    client::AuthClient,
    models::{Role, SessionState, Token},
    routes::{
        self, Navigation,
        auth::{FormOutcome, LoginForm, RegisterForm, submit_login, submit_register},
    },
    storage::{CredentialStore, file::FileCredentialStore},
};
use tempfile::TempDir;

#[derive(Clone)]
struct Account {
    password: String,
    role: &'static str,
    token: String,
}

#[derive(Clone, Default)]
struct Authority {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
    verify_calls: Arc<AtomicUsize>,
}

impl Authority {
    fn seeded() -> Self {
        let authority = Authority::default();
        {
            let mut accounts = authority.accounts.lock().unwrap();
            accounts.insert(
                "admin@shop.com".to_string(),
                Account {
                    password: "adminpass".to_string(),
                    role: "ADMIN",
                    token: "admin-token".to_string(),
                },
            );
            accounts.insert(
                "user@shop.com".to_string(),
                Account {
                    password: "userpass".to_string(),
                    role: "USER",
                    token: "user-token".to_string(),
                },
            );
        }
        authority
    }

    fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

async fn login(State(authority): State<Authority>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let accounts = authority.accounts.lock().unwrap();

    match accounts.get(email) {
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "User Not Registered" })),
        )
            .into_response(),
        Some(account) if account.password != password => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "User Not Registered" })),
        )
            .into_response(),
        Some(account) => Json(json!({ "token": account.token })).into_response(),
    }
}

async fn verify(State(authority): State<Authority>, headers: HeaderMap) -> Response {
    authority.verify_calls.fetch_add(1, Ordering::SeqCst);

    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some("broken-token") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Some("malformed-token") => Json(json!({ "valid": true })).into_response(),
        Some("bare-401-token") => StatusCode::UNAUTHORIZED.into_response(),
        Some("contradictory-token") => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "valid": true, "email": "x@y.z", "role": "ADMIN" })),
        )
            .into_response(),
        Some(token) => {
            let accounts = authority.accounts.lock().unwrap();
            match accounts.iter().find(|(_, a)| a.token == token) {
                Some((email, account)) => Json(json!({
                    "valid": true,
                    "email": email,
                    "role": account.role,
                }))
                .into_response(),
                None => (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "valid": false, "error": "Invalid token" })),
                )
                    .into_response(),
            }
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "valid": false, "error": "No token provided" })),
        )
            .into_response(),
    }
}

async fn create(State(authority): State<Authority>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();
    let mut accounts = authority.accounts.lock().unwrap();

    if accounts.contains_key(&email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "User with this email already exists" })),
        )
            .into_response();
    }

    let token = format!("token-{}", accounts.len() + 1);
    accounts.insert(
        email.clone(),
        Account {
            password,
            role: "USER",
            token,
        },
    );
    (StatusCode::CREATED, Json(json!({ "email": email, "role": "USER" }))).into_response()
}

/// Spin up the fake authority and return its API base URL.
async fn spawn_authority() -> (String, Authority) {
    let authority = Authority::seeded();

    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/verify", get(verify))
        .route("/api/auth/create", post(create))
        .with_state(authority.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api", addr), authority)
}

fn file_store(dir: &Path) -> Arc<FileCredentialStore> {
    Arc::new(FileCredentialStore::new(
        dir.join("credentials.json"),
        "token".to_string(),
    ))
}

fn controller_for(
    base_url: &str,
    store: Arc<FileCredentialStore>,
) -> SessionController<HttpSessionVerifier> {
    SessionController::new(HttpSessionVerifier::new(base_url), store)
}

// ============================================================================
// Startup Tests
// ============================================================================

#[tokio::test]
async fn test_no_token_redirects_catalog_to_login_without_verifying() {
    let (base_url, authority) = spawn_authority().await;
    let temp_dir = TempDir::new().unwrap();
    let controller = controller_for(&base_url, file_store(temp_dir.path()));

    assert_eq!(
        routes::resolve("/sweets", &controller.state()),
        Navigation::Pending
    );

    let state = controller.initialize().await;

    assert_eq!(state, SessionState::Unauthenticated);
    assert_eq!(
        routes::resolve("/sweets", &state),
        Navigation::Redirect("/login")
    );
    assert_eq!(authority.verify_calls(), 0);
}

#[tokio::test]
async fn test_admin_token_routing() {
    let (base_url, authority) = spawn_authority().await;
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(temp_dir.path());
    store.set(Token::new("admin-token"));
    let controller = controller_for(&base_url, store);

    let state = controller.initialize().await;

    assert_eq!(state.role(), Some(Role::Admin));
    assert_eq!(authority.verify_calls(), 1);
    assert_eq!(routes::resolve("/admin", &state), Navigation::Render("/admin"));
    assert_eq!(
        RouteGuard::require(Role::Admin).evaluate(&state),
        GuardDecision::Allow
    );
    assert_eq!(
        RouteGuard::require(Role::User).evaluate(&state),
        GuardDecision::Redirect("/admin")
    );
    assert_eq!(
        routes::resolve("/user/dashboard", &state),
        Navigation::Redirect("/admin")
    );
}

#[tokio::test]
async fn test_user_token_cannot_reach_admin_area() {
    let (base_url, _authority) = spawn_authority().await;
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(temp_dir.path());
    store.set(Token::new("user-token"));
    let controller = controller_for(&base_url, store);

    let state = controller.initialize().await;

    assert_eq!(
        routes::resolve("/admin/manage-sweets", &state),
        Navigation::Redirect("/user/dashboard")
    );
    assert_eq!(routes::resolve("/sweets", &state), Navigation::Render("/sweets"));
}

#[tokio::test]
async fn test_rejected_token_is_cleared() {
    let (base_url, _authority) = spawn_authority().await;
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(temp_dir.path());

    for stale in ["expired-token", "bare-401-token", "contradictory-token"] {
        store.set(Token::new(stale));
        let controller = controller_for(&base_url, store.clone());

        assert_eq!(controller.initialize().await, SessionState::Unauthenticated);
        assert_eq!(store.get(), None);
    }
}

#[tokio::test]
async fn test_rejected_status_overrides_valid_body() {
    let (base_url, _authority) = spawn_authority().await;
    let verifier = HttpSessionVerifier::new(&base_url);

    let result = verifier.verify(&Token::new("contradictory-token")).await;

    assert_eq!(result, VerifyResult::Invalid);
}

#[tokio::test]
async fn test_authority_failure_fails_closed() {
    let (base_url, _authority) = spawn_authority().await;
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(temp_dir.path());

    for token in ["broken-token", "malformed-token"] {
        store.set(Token::new(token));
        let controller = controller_for(&base_url, store.clone());

        assert_eq!(controller.initialize().await, SessionState::Unauthenticated);
        assert_eq!(store.get(), None);
    }
}

#[tokio::test]
async fn test_concurrent_verifications_do_not_interfere() {
    let (base_url, _authority) = spawn_authority().await;
    let verifier = HttpSessionVerifier::new(&base_url);

    let admin = Token::new("admin-token");
    let user = Token::new("user-token");
    let unknown = Token::new("nobody");
    let (a, u, n) = tokio::join!(
        verifier.verify(&admin),
        verifier.verify(&user),
        verifier.verify(&unknown)
    );

    assert!(matches!(a, VerifyResult::Valid(ref id) if id.role == Role::Admin && id.email == "admin@shop.com"));
    assert!(matches!(u, VerifyResult::Valid(ref id) if id.role == Role::User && id.email == "user@shop.com"));
    assert_eq!(n, VerifyResult::Invalid);
}

// ============================================================================
// Flow Tests
// ============================================================================

#[tokio::test]
async fn test_login_flow_persists_session_across_restart() {
    let (base_url, authority) = spawn_authority().await;
    let temp_dir = TempDir::new().unwrap();
    let client = AuthClient::new(&base_url);

    let controller = controller_for(&base_url, file_store(temp_dir.path()));
    controller.initialize().await;

    let outcome = submit_login(
        &client,
        &controller,
        &LoginForm {
            email: "admin@shop.com".to_string(),
            password: "adminpass".to_string(),
        },
    )
    .await;
    assert_eq!(outcome, FormOutcome::Navigate("/admin"));

    // A fresh process over the same credential file comes back logged in
    let restarted = controller_for(&base_url, file_store(temp_dir.path()));
    let state = restarted.initialize().await;
    assert_eq!(state.identity().map(|i| i.email.as_str()), Some("admin@shop.com"));
    assert_eq!(authority.verify_calls(), 2);
}

#[tokio::test]
async fn test_user_login_lands_on_dashboard() {
    let (base_url, _authority) = spawn_authority().await;
    let temp_dir = TempDir::new().unwrap();
    let client = AuthClient::new(&base_url);
    let controller = controller_for(&base_url, file_store(temp_dir.path()));

    let outcome = submit_login(
        &client,
        &controller,
        &LoginForm {
            email: "user@shop.com".to_string(),
            password: "userpass".to_string(),
        },
    )
    .await;
    assert_eq!(outcome, FormOutcome::Navigate("/user/dashboard"));
}

#[tokio::test]
async fn test_login_flow_surfaces_authority_message() {
    let (base_url, _authority) = spawn_authority().await;
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(temp_dir.path());
    let client = AuthClient::new(&base_url);
    let controller = controller_for(&base_url, store.clone());
    controller.initialize().await;

    let outcome = submit_login(
        &client,
        &controller,
        &LoginForm {
            email: "admin@shop.com".to_string(),
            password: "wrong".to_string(),
        },
    )
    .await;

    assert_eq!(outcome, FormOutcome::Error("User Not Registered".to_string()));
    assert_eq!(controller.state(), SessionState::Unauthenticated);
    assert_eq!(store.get(), None);
}

#[tokio::test]
async fn test_register_then_login() {
    let (base_url, _authority) = spawn_authority().await;
    let temp_dir = TempDir::new().unwrap();
    let client = AuthClient::new(&base_url);

    let form = RegisterForm {
        username: "candy".to_string(),
        email: "candy@shop.com".to_string(),
        password: "sugar".to_string(),
        confirm_password: "sugar".to_string(),
    };
    assert_eq!(
        submit_register(&client, &form).await,
        FormOutcome::Navigate("/login")
    );

    // Same email again: authority's message is shown verbatim
    assert_eq!(
        submit_register(&client, &form).await,
        FormOutcome::Error("User with this email already exists".to_string())
    );

    let controller = controller_for(&base_url, file_store(temp_dir.path()));
    let outcome = submit_login(
        &client,
        &controller,
        &LoginForm {
            email: "candy@shop.com".to_string(),
            password: "sugar".to_string(),
        },
    )
    .await;
    assert_eq!(outcome, FormOutcome::Navigate("/user/dashboard"));
}

#[tokio::test]
async fn test_logout_then_restart_is_logged_out() {
    let (base_url, authority) = spawn_authority().await;
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(temp_dir.path());
    store.set(Token::new("user-token"));

    let controller = controller_for(&base_url, store.clone());
    controller.initialize().await;
    assert_eq!(routes::auth::logout(&controller), "/login");
    assert_eq!(store.get(), None);

    let restarted = controller_for(&base_url, file_store(temp_dir.path()));
    assert_eq!(restarted.initialize().await, SessionState::Unauthenticated);
    // Only the first startup needed the authority
    assert_eq!(authority.verify_calls(), 1);
}
