use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};

use crate::model::{CascadeReport, Id, Photo, Session, SessionDetails, User};
use crate::store::traits::{PhotoStore, SessionStore, Store, UserStore};

const USER_COLUMNS: &str = "id, name, created_at";
const SESSION_COLUMNS: &str = "id, user_id, created_at";
const PHOTO_COLUMNS: &str = "id, session_id, image_url, created_at";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded migrations in `migrations/`
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .context("Failed to begin transaction")
    }

    /// Read-only transaction where every statement sees the same snapshot
    async fn begin_snapshot(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .context("Failed to set snapshot isolation")?;
        Ok(tx)
    }
}

/// Delete the photos and sessions of the given session ids inside `tx`
async fn delete_sessions_in(
    tx: &mut Transaction<'static, Postgres>,
    session_ids: &[Id],
) -> Result<CascadeReport> {
    let photos = sqlx::query("DELETE FROM photos WHERE session_id = ANY($1)")
        .bind(session_ids)
        .execute(&mut **tx)
        .await
        .context("Failed to delete photos")?
        .rows_affected();

    let sessions = sqlx::query("DELETE FROM sessions WHERE id = ANY($1)")
        .bind(session_ids)
        .execute(&mut **tx)
        .await
        .context("Failed to delete sessions")?
        .rows_affected();

    Ok(CascadeReport {
        users: 0,
        sessions,
        photos,
    })
}

#[async_trait::async_trait]
impl UserStore for PostgresStore {
    async fn insert_user(&self, name: &str) -> Result<User> {
        let query = format!(
            "INSERT INTO users (name, created_at) VALUES ($1, $2) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(name)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .context("Failed to insert user")
    }

    async fn get_user(&self, id: Id) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user")
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let query = format!(
            "SELECT {} FROM users ORDER BY created_at DESC, id DESC",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")
    }

    async fn user_exists_by_name(&self, name: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE name = $1)")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check user name")
    }

    async fn delete_user_cascade(&self, id: Id) -> Result<Option<CascadeReport>> {
        let mut tx = self.begin().await?;

        let locked: Option<Id> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to lock user")?;

        if locked.is_none() {
            tx.rollback().await.context("Failed to roll back")?;
            return Ok(None);
        }

        let session_ids: Vec<Id> =
            sqlx::query_scalar("SELECT id FROM sessions WHERE user_id = $1 FOR UPDATE")
                .bind(id)
                .fetch_all(&mut *tx)
                .await
                .context("Failed to collect user sessions")?;

        let mut report = delete_sessions_in(&mut tx, &session_ids).await?;

        report.users = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete user")?
            .rows_affected();

        tx.commit().await.context("Failed to commit user delete")?;
        Ok(Some(report))
    }
}

#[async_trait::async_trait]
impl SessionStore for PostgresStore {
    async fn insert_session(&self, user_id: Id) -> Result<Option<Session>> {
        let mut tx = self.begin().await?;

        // Key-share lock keeps the owner alive until the insert commits
        let owner: Option<Id> =
            sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR KEY SHARE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await
                .context("Failed to lock session owner")?;

        if owner.is_none() {
            tx.rollback().await.context("Failed to roll back")?;
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO sessions (user_id, created_at) VALUES ($1, $2) RETURNING {}",
            SESSION_COLUMNS
        );
        let session = sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .context("Failed to insert session")?;

        tx.commit().await.context("Failed to commit session")?;
        Ok(Some(session))
    }

    async fn get_session(&self, id: Id) -> Result<Option<Session>> {
        let query = format!("SELECT {} FROM sessions WHERE id = $1", SESSION_COLUMNS);
        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch session")
    }

    async fn get_session_details(&self, id: Id) -> Result<Option<SessionDetails>> {
        let mut tx = self.begin_snapshot().await?;

        let query = format!("SELECT {} FROM sessions WHERE id = $1", SESSION_COLUMNS);
        let Some(session) = sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to fetch session")?
        else {
            tx.rollback().await.context("Failed to roll back")?;
            return Ok(None);
        };

        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(session.user_id)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to fetch session owner")?;

        let query = format!(
            "SELECT {} FROM photos WHERE session_id = $1 ORDER BY created_at, id",
            PHOTO_COLUMNS
        );
        let photos = sqlx::query_as::<_, Photo>(&query)
            .bind(id)
            .fetch_all(&mut *tx)
            .await
            .context("Failed to fetch session photos")?;

        tx.commit().await.context("Failed to close snapshot")?;

        Ok(Some(SessionDetails {
            session,
            user,
            photos,
        }))
    }

    async fn list_sessions_for_user(&self, user_id: Id) -> Result<Vec<Session>> {
        let query = format!(
            "SELECT {} FROM sessions WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            SESSION_COLUMNS
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list sessions")
    }

    async fn delete_session_cascade(&self, id: Id) -> Result<Option<CascadeReport>> {
        let mut tx = self.begin().await?;

        let locked: Option<Id> =
            sqlx::query_scalar("SELECT id FROM sessions WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .context("Failed to lock session")?;

        if locked.is_none() {
            tx.rollback().await.context("Failed to roll back")?;
            return Ok(None);
        }

        let report = delete_sessions_in(&mut tx, &[id]).await?;
        tx.commit().await.context("Failed to commit session delete")?;
        Ok(Some(report))
    }
}

#[async_trait::async_trait]
impl PhotoStore for PostgresStore {
    async fn insert_photo(&self, session_id: Id, image_url: &str) -> Result<Option<Photo>> {
        let mut tx = self.begin().await?;

        let owner: Option<Id> =
            sqlx::query_scalar("SELECT id FROM sessions WHERE id = $1 FOR KEY SHARE")
                .bind(session_id)
                .fetch_optional(&mut *tx)
                .await
                .context("Failed to lock photo session")?;

        if owner.is_none() {
            tx.rollback().await.context("Failed to roll back")?;
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO photos (session_id, image_url, created_at) VALUES ($1, $2, $3) RETURNING {}",
            PHOTO_COLUMNS
        );
        let photo = sqlx::query_as::<_, Photo>(&query)
            .bind(session_id)
            .bind(image_url)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .context("Failed to insert photo")?;

        tx.commit().await.context("Failed to commit photo")?;
        Ok(Some(photo))
    }

    async fn get_photo(&self, id: Id) -> Result<Option<Photo>> {
        let query = format!("SELECT {} FROM photos WHERE id = $1", PHOTO_COLUMNS);
        sqlx::query_as::<_, Photo>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch photo")
    }

    async fn list_photos(&self, session_id: Option<Id>) -> Result<Vec<Photo>> {
        let photos = match session_id {
            Some(session_id) => {
                let query = format!(
                    "SELECT {} FROM photos WHERE session_id = $1 ORDER BY created_at DESC, id DESC",
                    PHOTO_COLUMNS
                );
                sqlx::query_as::<_, Photo>(&query)
                    .bind(session_id)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {} FROM photos ORDER BY created_at DESC, id DESC",
                    PHOTO_COLUMNS
                );
                sqlx::query_as::<_, Photo>(&query)
                    .fetch_all(&self.pool)
                    .await
            }
        };

        photos.context("Failed to list photos")
    }

    async fn count_photos_for_session(&self, session_id: Id) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM photos WHERE session_id = $1")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count photos")
    }

    async fn delete_photo(&self, id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM photos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete photo")?;

        Ok(result.rows_affected() > 0)
    }
}

impl Store for PostgresStore {}

#[cfg(test)]
mod tests {
    use super::*;

    /// Runs only when TEST_DATABASE_URL points at a scratch database
    async fn test_store() -> Option<PostgresStore> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let store = PostgresStore::new(&url, 2).await.ok()?;
        store.migrate().await.ok()?;
        Some(store)
    }

    #[tokio::test]
    async fn test_postgres_cascade_delete() {
        let Some(store) = test_store().await else {
            println!("TEST_DATABASE_URL not set, skipping");
            return;
        };

        let user = store.insert_user("Cascade Tester").await.unwrap();
        let session = store.insert_session(user.id).await.unwrap().unwrap();
        store
            .insert_photo(session.id, "https://x/a.jpg")
            .await
            .unwrap()
            .unwrap();
        store
            .insert_photo(session.id, "https://x/b.jpg")
            .await
            .unwrap()
            .unwrap();

        let details = store.get_session_details(session.id).await.unwrap().unwrap();
        assert_eq!(details.user.id, user.id);
        assert_eq!(details.photos.len(), 2);
        assert_eq!(details.photos[0].image_url, "https://x/a.jpg");

        let report = store.delete_user_cascade(user.id).await.unwrap().unwrap();
        assert_eq!(report.total(), 4);
        assert!(store.get_session(session.id).await.unwrap().is_none());
        assert_eq!(store.count_photos_for_session(session.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_postgres_rejects_orphan_insert() {
        let Some(store) = test_store().await else {
            println!("TEST_DATABASE_URL not set, skipping");
            return;
        };

        assert!(store.insert_session(i64::MAX).await.unwrap().is_none());
        assert!(store.insert_photo(i64::MAX, "x").await.unwrap().is_none());
    }
}
