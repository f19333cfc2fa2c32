use std::sync::Arc;

use crate::logic::error::{ServiceError, ServiceResult};
use crate::model::{validate_user_name, CascadeReport, EntityKind, Id, User, UserResponse};
use crate::store::traits::Store;

/// Owns the lifetime of users and, through cascade, of everything they own.
pub struct UserService<S> {
    store: Arc<S>,
}

impl<S> Clone for UserService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> UserService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create_user(&self, name: &str) -> ServiceResult<UserResponse> {
        validate_user_name(name).map_err(ServiceError::InvalidInput)?;

        let user = self.store.insert_user(name).await?;
        log::info!("Created user {} ({})", user.id, user.name);
        Ok(user.into())
    }

    /// Name lookup for callers; `create_user` never consults it.
    pub async fn user_exists_by_name(&self, name: &str) -> ServiceResult<bool> {
        Ok(self.store.user_exists_by_name(name).await?)
    }

    pub async fn list_users(&self) -> ServiceResult<Vec<UserResponse>> {
        let users = self.store.list_users().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn get_user(&self, id: Id) -> ServiceResult<UserResponse> {
        self.get_user_entity(id).await.map(UserResponse::from)
    }

    /// Existence check used by the session service before it writes a child row
    pub async fn get_user_entity(&self, id: Id) -> ServiceResult<User> {
        match self.store.get_user(id).await? {
            Some(user) => Ok(user),
            None => {
                log::debug!("User {} not found", id);
                Err(ServiceError::not_found(EntityKind::User, id))
            }
        }
    }

    pub async fn delete_user(&self, id: Id) -> ServiceResult<CascadeReport> {
        let report = self
            .store
            .delete_user_cascade(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::User, id))?;

        log::info!(
            "Deleted user {} with {} sessions and {} photos",
            id,
            report.sessions,
            report.photos
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> UserService<MemoryStore> {
        UserService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let users = service();
        let before = chrono::Utc::now();
        let created = users.create_user("Ava").await.unwrap();

        let fetched = users.get_user(created.id).await.unwrap();
        assert_eq!(fetched.name, "Ava");
        assert_eq!(fetched, created);
        assert!(fetched.created_at >= before);
        assert!(fetched.created_at <= chrono::Utc::now());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_names() {
        let users = service();
        let err = users.create_user("").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        let err = users.create_user(&"x".repeat(256)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(users.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_name_is_stored_as_sent() {
        let users = service();
        let created = users.create_user("  Ava ").await.unwrap();
        assert_eq!(created.name, "  Ava ");
        assert_eq!(users.get_user(created.id).await.unwrap().name, "  Ava ");
        assert!(!users.user_exists_by_name("Ava").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_names_are_allowed() {
        let users = service();
        users.create_user("Ava").await.unwrap();
        assert!(users.user_exists_by_name("Ava").await.unwrap());
        assert!(!users.user_exists_by_name("Ben").await.unwrap());
        users.create_user("Ava").await.unwrap();
        assert_eq!(users.list_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_users_newest_first() {
        let users = service();
        let first = users.create_user("first").await.unwrap();
        let second = users.create_user("second").await.unwrap();
        let third = users.create_user("third").await.unwrap();

        let ids: Vec<Id> = users.list_users().await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let users = service();
        let err = users.get_user(99).await.unwrap_err();
        assert_eq!(err.to_string(), "User not found with id: 99");
        assert!(users.delete_user(99).await.unwrap_err().is_not_found());
    }
}
