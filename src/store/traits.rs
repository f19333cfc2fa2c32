use crate::model::{CascadeReport, Id, Photo, Session, SessionDetails, User};
use anyhow::Result;

/// Compound operations on these traits are atomic: an implementation must
/// perform the parent check and the write (or the multi-row delete) in one
/// transaction or under one lock, so a concurrent delete cannot interleave.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, name: &str) -> Result<User>;
    async fn get_user(&self, id: Id) -> Result<Option<User>>;
    /// All users, newest first
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn user_exists_by_name(&self, name: &str) -> Result<bool>;
    /// Delete the user's photos, then sessions, then the user. `None` if the user does not exist.
    async fn delete_user_cascade(&self, id: Id) -> Result<Option<CascadeReport>>;
}

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// `None` if the owning user does not exist at insert time
    async fn insert_session(&self, user_id: Id) -> Result<Option<Session>>;
    async fn get_session(&self, id: Id) -> Result<Option<Session>>;
    /// Session, owner and photos (oldest first) from a single consistent read
    async fn get_session_details(&self, id: Id) -> Result<Option<SessionDetails>>;
    /// Sessions of one user, newest first
    async fn list_sessions_for_user(&self, user_id: Id) -> Result<Vec<Session>>;
    async fn delete_session_cascade(&self, id: Id) -> Result<Option<CascadeReport>>;
}

#[async_trait::async_trait]
pub trait PhotoStore: Send + Sync {
    /// `None` if the owning session does not exist at insert time
    async fn insert_photo(&self, session_id: Id, image_url: &str) -> Result<Option<Photo>>;
    async fn get_photo(&self, id: Id) -> Result<Option<Photo>>;
    /// Photos of one session, or of every session when `session_id` is `None`, newest first
    async fn list_photos(&self, session_id: Option<Id>) -> Result<Vec<Photo>>;
    async fn count_photos_for_session(&self, session_id: Id) -> Result<i64>;
    async fn delete_photo(&self, id: Id) -> Result<bool>;
}

pub trait Store: UserStore + SessionStore + PhotoStore + Send + Sync {}
