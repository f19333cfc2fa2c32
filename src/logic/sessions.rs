use std::sync::Arc;

use crate::logic::error::{ServiceError, ServiceResult};
use crate::logic::users::UserService;
use crate::model::{CascadeReport, EntityKind, Id, Session, SessionResponse};
use crate::store::traits::Store;

pub struct SessionService<S> {
    store: Arc<S>,
    users: UserService<S>,
}

impl<S> Clone for SessionService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            users: self.users.clone(),
        }
    }
}

impl<S: Store> SessionService<S> {
    pub fn new(store: Arc<S>, users: UserService<S>) -> Self {
        Self { store, users }
    }

    /// Open a session for an existing user.
    ///
    /// The owner is resolved first so a missing user surfaces as `NotFound`;
    /// the store re-checks it inside the insert transaction, which covers a
    /// user deleted between the two steps.
    pub async fn create_session(&self, user_id: Id) -> ServiceResult<SessionResponse> {
        self.users.get_user_entity(user_id).await?;

        let session = self
            .store
            .insert_session(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::User, user_id))?;

        log::info!("Created session {} for user {}", session.id, user_id);
        // A fresh session has no photos yet
        Ok(SessionResponse {
            photos: Some(Vec::new()),
            ..session.into()
        })
    }

    /// Session with its photos embedded, read from one snapshot
    pub async fn get_session_detailed(&self, id: Id) -> ServiceResult<SessionResponse> {
        let details = self
            .store
            .get_session_details(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Session, id))?;

        Ok(details.into())
    }

    /// Existence check used by the photo service; does not load photos
    pub async fn get_session_entity(&self, id: Id) -> ServiceResult<Session> {
        match self.store.get_session(id).await? {
            Some(session) => Ok(session),
            None => {
                log::debug!("Session {} not found", id);
                Err(ServiceError::not_found(EntityKind::Session, id))
            }
        }
    }

    pub async fn list_sessions_for_user(&self, user_id: Id) -> ServiceResult<Vec<SessionResponse>> {
        self.users.get_user_entity(user_id).await?;

        let sessions = self.store.list_sessions_for_user(user_id).await?;
        Ok(sessions.into_iter().map(SessionResponse::from).collect())
    }

    pub async fn count_photos(&self, session_id: Id) -> ServiceResult<i64> {
        self.get_session_entity(session_id).await?;
        Ok(self.store.count_photos_for_session(session_id).await?)
    }

    pub async fn delete_session(&self, id: Id) -> ServiceResult<CascadeReport> {
        let report = self
            .store
            .delete_session_cascade(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Session, id))?;

        log::info!("Deleted session {} with {} photos", id, report.photos);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, PhotoStore, SessionStore};

    fn services() -> (Arc<MemoryStore>, UserService<MemoryStore>, SessionService<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let users = UserService::new(Arc::clone(&store));
        let sessions = SessionService::new(Arc::clone(&store), users.clone());
        (store, users, sessions)
    }

    #[tokio::test]
    async fn test_create_session_for_existing_user() {
        let (_, users, sessions) = services();
        let user = users.create_user("Ava").await.unwrap();

        let session = sessions.create_session(user.id).await.unwrap();
        assert_eq!(session.user_id, user.id);
        assert_eq!(session.photos, Some(vec![]));

        let detailed = sessions.get_session_detailed(session.id).await.unwrap();
        assert_eq!(detailed.photos, Some(vec![]));
    }

    #[tokio::test]
    async fn test_create_session_for_missing_user_fails() {
        let (store, _, sessions) = services();
        let err = sessions.create_session(5).await.unwrap_err();
        assert_eq!(err.to_string(), "User not found with id: 5");
        assert!(store.get_session(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_sessions_validates_user_then_orders_newest_first() {
        let (_, users, sessions) = services();
        assert!(sessions.list_sessions_for_user(1).await.unwrap_err().is_not_found());

        let ava = users.create_user("Ava").await.unwrap();
        let ben = users.create_user("Ben").await.unwrap();
        let older = sessions.create_session(ava.id).await.unwrap();
        sessions.create_session(ben.id).await.unwrap();
        let newer = sessions.create_session(ava.id).await.unwrap();

        let listed: Vec<Id> = sessions
            .list_sessions_for_user(ava.id)
            .await
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(listed, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn test_delete_session_removes_its_photos() {
        let (store, users, sessions) = services();
        let user = users.create_user("Ava").await.unwrap();
        let session = sessions.create_session(user.id).await.unwrap();
        let photo = store
            .insert_photo(session.id, "https://x/a.jpg")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sessions.count_photos(session.id).await.unwrap(), 1);

        let report = sessions.delete_session(session.id).await.unwrap();
        assert_eq!(report.sessions, 1);
        assert_eq!(report.photos, 1);
        assert!(store.get_photo(photo.id).await.unwrap().is_none());
        assert!(sessions.get_session_detailed(session.id).await.unwrap_err().is_not_found());
        assert!(sessions.delete_session(session.id).await.unwrap_err().is_not_found());
        // The owner survives
        assert!(users.get_user(user.id).await.is_ok());
    }
}
