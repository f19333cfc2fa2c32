use anyhow::Result;
use chrono::Utc;
use itertools::Itertools;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::model::{CascadeReport, Id, Photo, Session, SessionDetails, Timestamp, User};
use crate::store::traits::{PhotoStore, SessionStore, Store, UserStore};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<Id, User>,
    sessions: BTreeMap<Id, Session>,
    photos: BTreeMap<Id, Photo>,
    last_user_id: Id,
    last_session_id: Id,
    last_photo_id: Id,
    last_stamp: Option<Timestamp>,
}

impl Tables {
    /// Creation stamps never go backwards, even if the wall clock does
    fn stamp(&mut self) -> Timestamp {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    fn remove_sessions(&mut self, session_ids: &[Id], report: &mut CascadeReport) {
        let before = self.photos.len();
        self.photos
            .retain(|_, photo| !session_ids.contains(&photo.session_id));
        report.photos += (before - self.photos.len()) as u64;

        for session_id in session_ids {
            if self.sessions.remove(session_id).is_some() {
                report.sessions += 1;
            }
        }
    }
}

fn next_id(last: &mut Id) -> Id {
    *last += 1;
    *last
}

fn newest_first(a_stamp: &Timestamp, a_id: Id, b_stamp: &Timestamp, b_id: Id) -> Ordering {
    b_stamp.cmp(a_stamp).then(b_id.cmp(&a_id))
}

/// Process-local store for tests and development runs.
///
/// Every operation takes the table lock exactly once, which gives the same
/// atomicity the PostgreSQL store gets from transactions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, name: &str) -> Result<User> {
        let mut tables = self.tables.write();
        let user = User {
            id: next_id(&mut tables.last_user_id),
            name: name.to_string(),
            created_at: tables.stamp(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Id) -> Result<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let tables = self.tables.read();
        Ok(tables
            .users
            .values()
            .sorted_by(|a, b| newest_first(&a.created_at, a.id, &b.created_at, b.id))
            .cloned()
            .collect())
    }

    async fn user_exists_by_name(&self, name: &str) -> Result<bool> {
        Ok(self.tables.read().users.values().any(|user| user.name == name))
    }

    async fn delete_user_cascade(&self, id: Id) -> Result<Option<CascadeReport>> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&id) {
            return Ok(None);
        }

        let session_ids = tables
            .sessions
            .values()
            .filter(|session| session.user_id == id)
            .map(|session| session.id)
            .collect_vec();

        let mut report = CascadeReport::default();
        tables.remove_sessions(&session_ids, &mut report);
        tables.users.remove(&id);
        report.users = 1;

        Ok(Some(report))
    }
}

#[async_trait::async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, user_id: Id) -> Result<Option<Session>> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&user_id) {
            return Ok(None);
        }

        let session = Session {
            id: next_id(&mut tables.last_session_id),
            user_id,
            created_at: tables.stamp(),
        };
        tables.sessions.insert(session.id, session.clone());
        Ok(Some(session))
    }

    async fn get_session(&self, id: Id) -> Result<Option<Session>> {
        Ok(self.tables.read().sessions.get(&id).cloned())
    }

    async fn get_session_details(&self, id: Id) -> Result<Option<SessionDetails>> {
        let tables = self.tables.read();
        let Some(session) = tables.sessions.get(&id).cloned() else {
            return Ok(None);
        };

        let user = tables
            .users
            .get(&session.user_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Session {} references missing user {}", id, session.user_id))?;

        let photos = tables
            .photos
            .values()
            .filter(|photo| photo.session_id == id)
            .sorted_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .cloned()
            .collect();

        Ok(Some(SessionDetails {
            session,
            user,
            photos,
        }))
    }

    async fn list_sessions_for_user(&self, user_id: Id) -> Result<Vec<Session>> {
        let tables = self.tables.read();
        Ok(tables
            .sessions
            .values()
            .filter(|session| session.user_id == user_id)
            .sorted_by(|a, b| newest_first(&a.created_at, a.id, &b.created_at, b.id))
            .cloned()
            .collect())
    }

    async fn delete_session_cascade(&self, id: Id) -> Result<Option<CascadeReport>> {
        let mut tables = self.tables.write();
        if !tables.sessions.contains_key(&id) {
            return Ok(None);
        }

        let mut report = CascadeReport::default();
        tables.remove_sessions(&[id], &mut report);
        Ok(Some(report))
    }
}

#[async_trait::async_trait]
impl PhotoStore for MemoryStore {
    async fn insert_photo(&self, session_id: Id, image_url: &str) -> Result<Option<Photo>> {
        let mut tables = self.tables.write();
        if !tables.sessions.contains_key(&session_id) {
            return Ok(None);
        }

        let photo = Photo {
            id: next_id(&mut tables.last_photo_id),
            session_id,
            image_url: image_url.to_string(),
            created_at: tables.stamp(),
        };
        tables.photos.insert(photo.id, photo.clone());
        Ok(Some(photo))
    }

    async fn get_photo(&self, id: Id) -> Result<Option<Photo>> {
        Ok(self.tables.read().photos.get(&id).cloned())
    }

    async fn list_photos(&self, session_id: Option<Id>) -> Result<Vec<Photo>> {
        let tables = self.tables.read();
        Ok(tables
            .photos
            .values()
            .filter(|photo| session_id.map_or(true, |id| photo.session_id == id))
            .sorted_by(|a, b| newest_first(&a.created_at, a.id, &b.created_at, b.id))
            .cloned()
            .collect())
    }

    async fn count_photos_for_session(&self, session_id: Id) -> Result<i64> {
        let tables = self.tables.read();
        let count = tables
            .photos
            .values()
            .filter(|photo| photo.session_id == session_id)
            .count();
        Ok(count as i64)
    }

    async fn delete_photo(&self, id: Id) -> Result<bool> {
        Ok(self.tables.write().photos.remove(&id).is_some())
    }
}

impl Store for MemoryStore {}
