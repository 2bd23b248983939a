use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{NoteQuery, NoteStore, StoreError, StoreResult, UserStore};
use crate::models::{Note, NoteId, User};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    notes: HashMap<NoteId, Note>,
    last_note_id: NoteId,
}

impl Tables {
    fn check_unique(&self, user: &User) -> StoreResult<()> {
        for other in self.users.values().filter(|u| u.id != user.id) {
            if other.username == user.username {
                return Err(StoreError::UniqueViolation {
                    constraint: "users_username_key".into(),
                });
            }
            if other.email == user.email {
                return Err(StoreError::UniqueViolation {
                    constraint: "users_email_key".into(),
                });
            }
        }
        Ok(())
    }
}

/// In-process store with the same constraints as the PostgreSQL schema.
/// Clones share the same tables.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert(&self, username: &str, email: &str, password_hash: &str) -> StoreResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        let mut tables = self.lock();
        tables.check_unique(&user)?;
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> StoreResult<User> {
        let mut tables = self.lock();
        tables.check_unique(user)?;
        let stored = tables
            .users
            .get_mut(&user.id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        stored.username = user.username.clone();
        stored.email = user.email.clone();
        stored.password_hash = user.password_hash.clone();
        Ok(stored.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.lock().users.values().find(|u| u.email == email).cloned())
    }

    async fn exists_by_username(&self, username: &str) -> StoreResult<bool> {
        Ok(self.lock().users.values().any(|u| u.username == username))
    }

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        Ok(self.lock().users.values().any(|u| u.email == email))
    }
}

#[async_trait]
impl NoteStore for InMemoryStore {
    async fn insert(&self, owner: Uuid, title: &str, content: &str) -> StoreResult<Note> {
        let mut tables = self.lock();
        tables.last_note_id += 1;
        let now = Utc::now();
        let note = Note {
            id: tables.last_note_id,
            user_id: owner,
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn update(
        &self,
        id: NoteId,
        owner: Uuid,
        title: &str,
        content: &str,
    ) -> StoreResult<Option<Note>> {
        let mut tables = self.lock();
        let Some(note) = tables.notes.get_mut(&id).filter(|n| n.user_id == owner) else {
            return Ok(None);
        };
        note.title = title.to_string();
        note.content = content.to_string();
        note.updated_at = Utc::now();
        Ok(Some(note.clone()))
    }

    async fn find_one(&self, id: NoteId, owner: Uuid) -> StoreResult<Option<Note>> {
        Ok(self
            .lock()
            .notes
            .get(&id)
            .filter(|n| n.user_id == owner)
            .cloned())
    }

    async fn find(&self, query: &NoteQuery) -> StoreResult<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .lock()
            .notes
            .values()
            .filter(|n| query.matches(n))
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(notes)
    }

    async fn count(&self, owner: Uuid) -> StoreResult<i64> {
        let count = self
            .lock()
            .notes
            .values()
            .filter(|n| n.user_id == owner)
            .count();
        Ok(count as i64)
    }

    async fn delete(&self, id: NoteId, owner: Uuid) -> StoreResult<bool> {
        let mut tables = self.lock();
        if tables.notes.get(&id).is_some_and(|n| n.user_id == owner) {
            tables.notes.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}
