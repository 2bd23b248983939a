use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::instrument;
use uuid::Uuid;

use super::{StoreResult, UserStore};
use crate::models::User;

const COLUMNS: &str = "id, username, email, password_hash, created_at";

#[derive(Clone, Debug)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn find_by(&self, column: &str, value: &str) -> StoreResult<Option<User>> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE {column} = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch user: {:?}", e);
                e
            })?;
        Ok(user)
    }

    async fn exists_by(&self, column: &str, value: &str) -> StoreResult<bool> {
        let query = format!("SELECT EXISTS(SELECT 1 FROM users WHERE {column} = $1)");
        let exists = sqlx::query_scalar::<_, bool>(&query)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    #[instrument(name = "Saving new user to database", skip(self, password_hash))]
    async fn insert(&self, username: &str, email: &str, password_hash: &str) -> StoreResult<User> {
        let query = format!(
            "INSERT INTO users (id, username, email, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to execute query: {:?}", e);
                e
            })?;
        Ok(user)
    }

    #[instrument(name = "Updating user in database", skip(self, user), fields(user_id = %user.id))]
    async fn update(&self, user: &User) -> StoreResult<User> {
        let query = format!(
            "UPDATE users SET username = $2, email = $3, password_hash = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    #[instrument(name = "Fetching user by id from database", skip(self))]
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    #[instrument(name = "Fetching user by username from database", skip(self))]
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.find_by("username", username).await
    }

    #[instrument(name = "Fetching user by email from database", skip(self))]
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.find_by("email", email).await
    }

    async fn exists_by_username(&self, username: &str) -> StoreResult<bool> {
        self.exists_by("username", username).await
    }

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        self.exists_by("email", email).await
    }
}
