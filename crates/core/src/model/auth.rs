use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthError {
    #[error("authentication token is required")]
    Required,
}

/// Bearer token issued by the identity provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Guest,
    User,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UserRole::Guest => "guest",
            UserRole::User => "user",
        })
    }
}

/// Signed-in user as persisted on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub user_id: String,
    pub username: String,
    pub token: AuthToken,
    #[serde(default)]
    pub role: UserRole,
}

/// Identity handed explicitly to every call that talks to the content service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    user: Option<UserSession>,
}

impl AuthState {
    #[must_use]
    pub fn signed_out() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn signed_in(user: UserSession) -> Self {
        Self { user: Some(user) }
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserSession> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.require_token().is_ok()
    }

    /// Token for an authenticated request.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Required` when no user is signed in or the token is blank.
    pub fn require_token(&self) -> Result<&AuthToken, AuthError> {
        self.user
            .as_ref()
            .map(|user| &user.token)
            .filter(|token| !token.as_str().trim().is_empty())
            .ok_or(AuthError::Required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(token: &str) -> UserSession {
        UserSession {
            user_id: "u1".into(),
            username: "guest_42".into(),
            token: AuthToken::new(token),
            role: UserRole::Guest,
        }
    }

    #[test]
    fn signed_out_requires_token() {
        assert_eq!(
            AuthState::signed_out().require_token(),
            Err(AuthError::Required)
        );
    }

    #[test]
    fn blank_token_counts_as_signed_out() {
        let state = AuthState::signed_in(user("  "));
        assert!(!state.is_authenticated());
    }

    #[test]
    fn token_is_redacted_in_debug() {
        let state = AuthState::signed_in(user("secret"));
        assert_eq!(state.require_token().unwrap().as_str(), "secret");
        assert!(!format!("{state:?}").contains("secret"));
    }

    #[test]
    fn persisted_session_defaults_role() {
        let raw = r#"{"userId":"u1","username":"g","token":"t"}"#;
        let parsed: UserSession = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.role, UserRole::Guest);
    }
}
