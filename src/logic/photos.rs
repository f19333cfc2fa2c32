use std::sync::Arc;

use crate::logic::error::{ServiceError, ServiceResult};
use crate::logic::sessions::SessionService;
use crate::model::{validate_image_url, EntityKind, Id, PhotoResponse};
use crate::store::traits::Store;

pub struct PhotoService<S> {
    store: Arc<S>,
    sessions: SessionService<S>,
}

impl<S> Clone for PhotoService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sessions: self.sessions.clone(),
        }
    }
}

impl<S: Store> PhotoService<S> {
    pub fn new(store: Arc<S>, sessions: SessionService<S>) -> Self {
        Self { store, sessions }
    }

    /// Attach a photo by URL to an existing session
    pub async fn create_photo(&self, session_id: Id, image_url: &str) -> ServiceResult<PhotoResponse> {
        self.insert_checked(session_id, image_url).await
    }

    /// Same contract as `create_photo`; called by the upload pipeline once the
    /// file is already on disk.
    pub async fn create_photo_from_upload(
        &self,
        session_id: Id,
        image_url: &str,
    ) -> ServiceResult<PhotoResponse> {
        self.insert_checked(session_id, image_url).await
    }

    async fn insert_checked(&self, session_id: Id, image_url: &str) -> ServiceResult<PhotoResponse> {
        validate_image_url(image_url).map_err(ServiceError::InvalidInput)?;
        self.sessions.get_session_entity(session_id).await?;

        let photo = self
            .store
            .insert_photo(session_id, image_url)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Session, session_id))?;

        log::info!("Created photo {} in session {}", photo.id, session_id);
        Ok(photo.into())
    }

    /// Photos newest first, optionally restricted to one existing session
    pub async fn list_photos(&self, session_id: Option<Id>) -> ServiceResult<Vec<PhotoResponse>> {
        if let Some(session_id) = session_id {
            self.sessions.get_session_entity(session_id).await?;
        }

        let photos = self.store.list_photos(session_id).await?;
        Ok(photos.into_iter().map(PhotoResponse::from).collect())
    }

    pub async fn get_photo(&self, id: Id) -> ServiceResult<PhotoResponse> {
        self.store
            .get_photo(id)
            .await?
            .map(PhotoResponse::from)
            .ok_or_else(|| ServiceError::not_found(EntityKind::Photo, id))
    }

    pub async fn delete_photo(&self, id: Id) -> ServiceResult<()> {
        if !self.store.delete_photo(id).await? {
            return Err(ServiceError::not_found(EntityKind::Photo, id));
        }

        log::info!("Deleted photo {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::UserService;
    use crate::store::MemoryStore;

    struct Fixture {
        users: UserService<MemoryStore>,
        sessions: SessionService<MemoryStore>,
        photos: PhotoService<MemoryStore>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let users = UserService::new(Arc::clone(&store));
        let sessions = SessionService::new(Arc::clone(&store), users.clone());
        let photos = PhotoService::new(store, sessions.clone());
        Fixture {
            users,
            sessions,
            photos,
        }
    }

    #[tokio::test]
    async fn test_create_photo_for_missing_session_creates_nothing() {
        let f = fixture();
        let err = f.photos.create_photo(3, "https://x/a.jpg").await.unwrap_err();
        assert_eq!(err.to_string(), "Session not found with id: 3");
        assert!(f.photos.list_photos(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_photo_rejects_blank_url() {
        let f = fixture();
        let user = f.users.create_user("Ava").await.unwrap();
        let session = f.sessions.create_session(user.id).await.unwrap();
        let err = f.photos.create_photo(session.id, " ").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_list_photos_filtered_and_global_ordering() {
        let f = fixture();
        let user = f.users.create_user("Ava").await.unwrap();
        let s1 = f.sessions.create_session(user.id).await.unwrap();
        let s2 = f.sessions.create_session(user.id).await.unwrap();

        let a = f.photos.create_photo(s1.id, "a").await.unwrap();
        let b = f.photos.create_photo(s2.id, "b").await.unwrap();
        let c = f.photos.create_photo_from_upload(s1.id, "c").await.unwrap();

        let filtered: Vec<Id> = f
            .photos
            .list_photos(Some(s1.id))
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(filtered, vec![c.id, a.id]);

        let all: Vec<Id> = f
            .photos
            .list_photos(None)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(all, vec![c.id, b.id, a.id]);

        assert!(f.photos.list_photos(Some(404)).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_user_removes_every_descendant() {
        let f = fixture();
        let user = f.users.create_user("Ava").await.unwrap();
        let bystander = f.users.create_user("Ben").await.unwrap();
        let kept_session = f.sessions.create_session(bystander.id).await.unwrap();
        let kept_photo = f.photos.create_photo(kept_session.id, "kept").await.unwrap();

        let mut session_ids = Vec::new();
        let mut photo_ids = Vec::new();
        for n in 0..3 {
            let session = f.sessions.create_session(user.id).await.unwrap();
            for m in 0..n {
                let photo = f
                    .photos
                    .create_photo(session.id, &format!("https://x/{}-{}.jpg", n, m))
                    .await
                    .unwrap();
                photo_ids.push(photo.id);
            }
            session_ids.push(session.id);
        }

        let report = f.users.delete_user(user.id).await.unwrap();
        assert_eq!(report.total(), (session_ids.len() + photo_ids.len() + 1) as u64);

        for id in session_ids {
            assert!(f.sessions.get_session_detailed(id).await.unwrap_err().is_not_found());
        }
        for id in photo_ids {
            assert!(f.photos.get_photo(id).await.unwrap_err().is_not_found());
        }
        assert_eq!(f.photos.get_photo(kept_photo.id).await.unwrap(), kept_photo);
    }

    #[tokio::test]
    async fn test_delete_photo_is_a_leaf_delete() {
        let f = fixture();
        let user = f.users.create_user("Ava").await.unwrap();
        let session = f.sessions.create_session(user.id).await.unwrap();
        let photo = f.photos.create_photo(session.id, "a").await.unwrap();

        f.photos.delete_photo(photo.id).await.unwrap();
        assert!(f.photos.get_photo(photo.id).await.unwrap_err().is_not_found());
        assert!(f.photos.delete_photo(photo.id).await.unwrap_err().is_not_found());
        assert!(f.sessions.get_session_entity(session.id).await.is_ok());
    }
}
