//! Session data model and wire models for the authentication authority.
//!
//! All wire models use serde for serialization/deserialization.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

// ============================================================================
// Session Models
// ============================================================================

/// Opaque session credential.
///
/// Nothing about its structure is interpreted client-side. The backing
/// string is zeroized on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(Zeroizing<String>);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Token(Zeroizing::new(value.into()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Token([REDACTED])")
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Token::new(value)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Token::new(value)
    }
}

/// Verified identity. Only ever built from a successful verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub role: Role,
}

/// The client's single view of "am I logged in, as whom".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Before the first verification settles.
    #[default]
    Unknown,
    Authenticated(Identity),
    Unauthenticated,
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.identity().map(|identity| identity.role)
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, SessionState::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Unknown => "unknown",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::Unauthenticated => "unauthenticated",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Authenticated(identity) => {
                write!(f, "authenticated as {} ({})", identity.email, identity.role)
            }
            other => f.write_str(other.as_str()),
        }
    }
}

// ============================================================================
// Auth Wire Models
// ============================================================================

/// Body of `POST /auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful `POST /auth/login` response.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Body of `POST /auth/create`.
#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// `GET /auth/verify` response. `email` and `role` are present only when valid.
#[derive(Debug, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Error payload returned by the authority on failed requests.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
}

// ============================================================================
// User Roles
// ============================================================================

/// User role types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert_eq!(Role::Admin.to_string(), "ADMIN");
        assert!("admin".parse::<Role>().is_err());
        assert!("SUPERUSER".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_uses_wire_names() {
        let json = serde_json::to_string(&Role::User).unwrap();
        assert_eq!(json, "\"USER\"");
        let role: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = Token::new("eyJhbGciOiJIUzI1NiJ9.secret");
        let printed = format!("{:?}", token);
        assert!(!printed.contains("secret"));
        assert_eq!(token.as_str(), "eyJhbGciOiJIUzI1NiJ9.secret");
    }

    #[test]
    fn test_session_state_accessors() {
        let identity = Identity {
            email: "a@b.com".to_string(),
            role: Role::User,
        };
        let state = SessionState::Authenticated(identity.clone());
        assert_eq!(state.identity(), Some(&identity));
        assert_eq!(state.role(), Some(Role::User));
        assert!(state.is_settled());

        assert!(!SessionState::Unknown.is_settled());
        assert_eq!(SessionState::default(), SessionState::Unknown);
        assert_eq!(SessionState::Unauthenticated.role(), None);
    }

    #[test]
    fn test_verify_response_without_identity_fields() {
        let resp: VerifyResponse =
            serde_json::from_str(r#"{"valid": false, "error": "Invalid token"}"#).unwrap();
        assert!(!resp.valid);
        assert!(resp.email.is_none());
        assert!(resp.role.is_none());
    }
}
