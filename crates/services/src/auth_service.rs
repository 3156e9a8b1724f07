use std::sync::Arc;

use prep_core::model::{AuthState, AuthToken, UserRole, UserSession};
use storage::repository::SessionRepository;

use crate::api::ContentApi;
use crate::error::AuthServiceError;

/// Signs users in and out and keeps the session on the device.
#[derive(Clone)]
pub struct AuthService {
    api: Arc<dyn ContentApi>,
    sessions: Arc<dyn SessionRepository>,
}

impl AuthService {
    #[must_use]
    pub fn new(api: Arc<dyn ContentApi>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { api, sessions }
    }

    /// Identity persisted by a previous run; signed out when none is stored
    /// or it cannot be read.
    pub async fn restore(&self) -> AuthState {
        match self.sessions.load_session().await {
            Ok(Some(session)) => AuthState::signed_in(session),
            Ok(None) => AuthState::signed_out(),
            Err(err) => {
                tracing::warn!(error = %err, "stored session unreadable; signing out");
                AuthState::signed_out()
            }
        }
    }

    /// Log in as a guest and persist the session.
    ///
    /// # Errors
    ///
    /// Returns `AuthServiceError::Rejected` when the service reports failure
    /// or issues no token, and propagates API and storage errors.
    pub async fn login_guest(&self) -> Result<AuthState, AuthServiceError> {
        let login = self.api.login_as_guest().await.inspect_err(|err| {
            tracing::error!(error = %err, "guest login request failed");
        })?;

        if !login.success || login.token.trim().is_empty() {
            tracing::warn!(message = %login.message, "guest login rejected");
            return Err(AuthServiceError::Rejected(login.message));
        }

        let session = UserSession {
            user_id: login.user_id,
            username: login.username,
            token: AuthToken::new(login.token),
            role: UserRole::Guest,
        };
        self.sessions.save_session(&session).await?;
        tracing::info!(user_id = %session.user_id, "signed in as guest");
        Ok(AuthState::signed_in(session))
    }

    /// Forget the persisted session.
    ///
    /// # Errors
    ///
    /// Returns `AuthServiceError::Storage` if the session cannot be removed.
    pub async fn logout(&self) -> Result<AuthState, AuthServiceError> {
        self.sessions.clear_session().await?;
        Ok(AuthState::signed_out())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CreateTestRequest, GuestLogin, PyqQuery, SubjectTotals};
    use crate::error::ApiError;
    use async_trait::async_trait;
    use prep_core::model::{Chapter, ClassLevel, PoolType, Question, SubjectCode};
    use storage::repository::Storage;

    struct GuestOnlyApi {
        login: GuestLogin,
    }

    #[async_trait]
    impl ContentApi for GuestOnlyApi {
        async fn login_as_guest(&self) -> Result<GuestLogin, ApiError> {
            Ok(self.login.clone())
        }

        async fn chapters_by_subject(
            &self,
            _token: &AuthToken,
            _code: SubjectCode,
        ) -> Result<Vec<Chapter>, ApiError> {
            Ok(Vec::new())
        }

        async fn create_test(
            &self,
            _token: &AuthToken,
            _request: &CreateTestRequest,
        ) -> Result<Vec<Question>, ApiError> {
            Ok(Vec::new())
        }

        async fn previous_year_questions(
            &self,
            _token: &AuthToken,
            _query: &PyqQuery,
        ) -> Result<Vec<Question>, ApiError> {
            Ok(Vec::new())
        }

        async fn subject_totals(
            &self,
            _pool: PoolType,
            _class: ClassLevel,
        ) -> Result<SubjectTotals, ApiError> {
            Ok(SubjectTotals::default())
        }
    }

    fn service(login: GuestLogin) -> (AuthService, Storage) {
        let storage = Storage::in_memory();
        let api: Arc<dyn ContentApi> = Arc::new(GuestOnlyApi { login });
        (AuthService::new(api, Arc::clone(&storage.sessions)), storage)
    }

    #[tokio::test]
    async fn guest_login_persists_session_for_restore() {
        let (auth, _storage) = service(GuestLogin {
            success: true,
            message: String::new(),
            token: "tok-1".into(),
            user_id: "u-1".into(),
            username: "Guest".into(),
        });

        assert!(!auth.restore().await.is_authenticated());

        let state = auth.login_guest().await.unwrap();
        assert_eq!(state.require_token().unwrap().as_str(), "tok-1");

        let restored = auth.restore().await;
        assert_eq!(restored, state);
        assert_eq!(restored.user().unwrap().role, UserRole::Guest);

        let signed_out = auth.logout().await.unwrap();
        assert!(!signed_out.is_authenticated());
        assert!(!auth.restore().await.is_authenticated());
    }

    #[tokio::test]
    async fn unsuccessful_login_is_rejected_and_not_persisted() {
        let (auth, storage) = service(GuestLogin {
            success: false,
            message: "guest accounts disabled".into(),
            token: "tok".into(),
            ..GuestLogin::default()
        });

        let err = auth.login_guest().await.unwrap_err();
        assert!(matches!(err, AuthServiceError::Rejected(message) if message == "guest accounts disabled"));
        assert!(storage.sessions.load_session().await.unwrap().is_none());
    }
}
