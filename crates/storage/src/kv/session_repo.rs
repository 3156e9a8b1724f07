use std::sync::Arc;

use async_trait::async_trait;
use prep_core::model::UserSession;

use super::keys::SESSION_KEY;
use crate::repository::{KeyValueStore, SessionRepository, StorageError};

#[derive(Clone)]
pub struct KvSessionRepository {
    kv: Arc<dyn KeyValueStore>,
}

impl KvSessionRepository {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }
}

#[async_trait]
impl SessionRepository for KvSessionRepository {
    async fn load_session(&self) -> Result<Option<UserSession>, StorageError> {
        let Some(raw) = self.kv.get(SESSION_KEY).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn save_session(&self, session: &UserSession) -> Result<(), StorageError> {
        let raw = serde_json::to_string(session)?;
        self.kv.set(SESSION_KEY, &raw).await
    }

    async fn clear_session(&self) -> Result<(), StorageError> {
        self.kv.remove(SESSION_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryKeyValueStore;
    use prep_core::model::{AuthToken, UserRole};

    #[tokio::test]
    async fn session_round_trips_and_clears() {
        let repo = KvSessionRepository::new(Arc::new(InMemoryKeyValueStore::new()));
        assert!(repo.load_session().await.unwrap().is_none());

        let session = UserSession {
            user_id: "u-1".into(),
            username: "guest_1".into(),
            token: AuthToken::new("tok"),
            role: UserRole::Guest,
        };
        repo.save_session(&session).await.unwrap();
        assert_eq!(repo.load_session().await.unwrap(), Some(session));

        repo.clear_session().await.unwrap();
        assert!(repo.load_session().await.unwrap().is_none());
    }
}
