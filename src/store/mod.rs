//! Record store: the traits the services talk to and their implementations.
//!
//! [`PgUserRepository`] and [`PgNoteRepository`] back the running server;
//! [`InMemoryStore`] implements both traits without a database.

pub mod memory;
pub mod note;
pub mod query;
pub mod user;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Note, NoteId, User};

pub use memory::InMemoryStore;
pub use note::PgNoteRepository;
pub use query::{NoteQuery, SearchField};
pub use user::PgUserRepository;

/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint `{constraint}` violated")]
    UniqueViolation { constraint: String },

    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return StoreError::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                };
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug {
    async fn insert(&self, username: &str, email: &str, password_hash: &str) -> StoreResult<User>;

    /// Persists `username`, `email` and `password_hash` of an existing user.
    async fn update(&self, user: &User) -> StoreResult<User>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn exists_by_username(&self, username: &str) -> StoreResult<bool>;

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool>;
}

/// Every method that addresses a single note takes the owner alongside the id.
#[async_trait]
pub trait NoteStore: Send + Sync + std::fmt::Debug {
    async fn insert(&self, owner: Uuid, title: &str, content: &str) -> StoreResult<Note>;

    /// Returns `None` when no note with `id` belongs to `owner`.
    async fn update(
        &self,
        id: NoteId,
        owner: Uuid,
        title: &str,
        content: &str,
    ) -> StoreResult<Option<Note>>;

    async fn find_one(&self, id: NoteId, owner: Uuid) -> StoreResult<Option<Note>>;

    /// Notes matching `query`, most recently updated first.
    async fn find(&self, query: &NoteQuery) -> StoreResult<Vec<Note>>;

    async fn count(&self, owner: Uuid) -> StoreResult<i64>;

    /// Returns `true` if a row was removed.
    async fn delete(&self, id: NoteId, owner: Uuid) -> StoreResult<bool>;
}
