use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::instrument;
use uuid::Uuid;

use super::{NoteQuery, NoteStore, StoreResult};
use crate::models::{Note, NoteId};

const COLUMNS: &str = "id, user_id, title, content, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteStore for PgNoteRepository {
    #[instrument(name = "Saving new note to database", skip(self, title, content))]
    async fn insert(&self, owner: Uuid, title: &str, content: &str) -> StoreResult<Note> {
        let query = format!(
            "INSERT INTO notes (user_id, title, content)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let note = sqlx::query_as::<_, Note>(&query)
            .bind(owner)
            .bind(title)
            .bind(content)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to execute query: {:?}", e);
                e
            })?;
        Ok(note)
    }

    #[instrument(name = "Updating note in database", skip(self, title, content))]
    async fn update(
        &self,
        id: NoteId,
        owner: Uuid,
        title: &str,
        content: &str,
    ) -> StoreResult<Option<Note>> {
        let query = format!(
            "UPDATE notes SET title = $3, content = $4, updated_at = now()
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        let note = sqlx::query_as::<_, Note>(&query)
            .bind(id)
            .bind(owner)
            .bind(title)
            .bind(content)
            .fetch_optional(&self.pool)
            .await?;
        Ok(note)
    }

    #[instrument(name = "Fetching note from database", skip(self))]
    async fn find_one(&self, id: NoteId, owner: Uuid) -> StoreResult<Option<Note>> {
        let query = format!("SELECT {COLUMNS} FROM notes WHERE id = $1 AND user_id = $2");
        let note = sqlx::query_as::<_, Note>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        Ok(note)
    }

    #[instrument(name = "Listing notes from database", skip(self, query), fields(user_id = %query.owner()))]
    async fn find(&self, query: &NoteQuery) -> StoreResult<Vec<Note>> {
        let mut qb = query.select(COLUMNS);
        let notes = qb
            .build_query_as::<Note>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list notes: {:?}", e);
                e
            })?;
        Ok(notes)
    }

    async fn count(&self, owner: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notes WHERE user_id = $1")
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    #[instrument(name = "Deleting note from database", skip(self))]
    async fn delete(&self, id: NoteId, owner: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
