//! Note access, always scoped to the acting user.
//!
//! Every operation takes the owner explicitly and every store call carries
//! it, so there is no path that reads or writes a note by id alone.
//! Lookups that miss for any reason fail with
//! [`ServiceError::NotFoundOrDenied`]: callers cannot tell a missing note
//! from another user's note.

use std::sync::Arc;

use tracing::instrument;

use crate::errors::ServiceError;
use crate::models::{Note, NoteDraft, NoteId, User};
use crate::store::{NoteQuery, NoteStore, SearchField};

#[derive(Clone, Debug)]
pub struct NoteService {
    store: Arc<dyn NoteStore>,
}

impl NoteService {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self { store }
    }

    /// All of `user`'s notes, most recently updated first.
    pub async fn get_all_notes_by_user(&self, user: &User) -> Result<Vec<Note>, ServiceError> {
        self.find(NoteQuery::owned_by(user.id)).await
    }

    #[instrument(name = "NoteService: Get note", skip(self, user), fields(user_id = %user.id))]
    pub async fn get_note_by_id_and_user(
        &self,
        id: NoteId,
        user: &User,
    ) -> Result<Note, ServiceError> {
        self.store
            .find_one(id, user.id)
            .await?
            .ok_or(ServiceError::NotFoundOrDenied)
    }

    /// Inserts a new draft or updates an existing one owned by `draft.user_id`.
    #[instrument(name = "NoteService: Save note", skip(self, draft), fields(note_id = ?draft.id, user_id = %draft.user_id))]
    pub async fn save_note(&self, draft: NoteDraft) -> Result<Note, ServiceError> {
        if draft.title.trim().is_empty() {
            return Err(ServiceError::Validation("Note title cannot be empty".into()));
        }

        match draft.id {
            None => Ok(self
                .store
                .insert(draft.user_id, &draft.title, &draft.content)
                .await?),
            Some(id) => self
                .store
                .update(id, draft.user_id, &draft.title, &draft.content)
                .await?
                .ok_or(ServiceError::NotFoundOrDenied),
        }
    }

    #[instrument(name = "NoteService: Delete note", skip(self, user), fields(user_id = %user.id))]
    pub async fn delete_note_by_id_and_user(
        &self,
        id: NoteId,
        user: &User,
    ) -> Result<(), ServiceError> {
        let note = self.get_note_by_id_and_user(id, user).await?;
        if !self.store.delete(note.id, user.id).await? {
            // Removed by a concurrent request between lookup and delete.
            return Err(ServiceError::NotFoundOrDenied);
        }
        tracing::info!(note_id = id, "Note deleted");
        Ok(())
    }

    /// Title-or-content search. A missing or blank term lists everything.
    pub async fn search_notes(
        &self,
        user: &User,
        term: Option<&str>,
    ) -> Result<Vec<Note>, ServiceError> {
        match term.map(str::trim).filter(|t| !t.is_empty()) {
            None => self.get_all_notes_by_user(user).await,
            Some(term) => {
                self.find(NoteQuery::owned_by(user.id).containing(SearchField::TitleOrContent, term))
                    .await
            }
        }
    }

    pub async fn search_notes_by_title(
        &self,
        user: &User,
        title: &str,
    ) -> Result<Vec<Note>, ServiceError> {
        self.find(NoteQuery::owned_by(user.id).containing(SearchField::Title, title))
            .await
    }

    pub async fn search_notes_by_content(
        &self,
        user: &User,
        content: &str,
    ) -> Result<Vec<Note>, ServiceError> {
        self.find(NoteQuery::owned_by(user.id).containing(SearchField::Content, content))
            .await
    }

    pub async fn count_notes_by_user(&self, user: &User) -> Result<i64, ServiceError> {
        Ok(self.store.count(user.id).await?)
    }

    pub async fn create_note(
        &self,
        title: &str,
        content: &str,
        user: &User,
    ) -> Result<Note, ServiceError> {
        self.save_note(NoteDraft::new(title, content, user.id)).await
    }

    pub async fn update_note(
        &self,
        id: NoteId,
        title: &str,
        content: &str,
        user: &User,
    ) -> Result<Note, ServiceError> {
        let mut draft = NoteDraft::from(self.get_note_by_id_and_user(id, user).await?);
        draft.title = title.to_string();
        draft.content = content.to_string();
        self.save_note(draft).await
    }

    async fn find(&self, query: NoteQuery) -> Result<Vec<Note>, ServiceError> {
        Ok(self.store.find(&query).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::store::InMemoryStore;

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    fn service() -> NoteService {
        NoteService::new(Arc::new(InMemoryStore::new()))
    }

    fn titles(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.title.as_str()).collect()
    }

    // Keeps successive `updated_at` values apart on coarse clocks.
    async fn tick() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    #[tokio::test]
    async fn other_users_cannot_read_a_note() {
        let notes = service();
        let alice = user("alice");
        let bob = user("bob");
        let note = notes.create_note("Secret", "plans", &alice).await.unwrap();

        let err = notes.get_note_by_id_and_user(note.id, &bob).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFoundOrDenied));

        let missing = notes.get_note_by_id_and_user(9_999, &alice).await.unwrap_err();
        assert_eq!(missing.to_string(), err.to_string());
    }

    #[tokio::test]
    async fn other_users_cannot_update_or_delete_a_note() {
        let notes = service();
        let alice = user("alice");
        let bob = user("bob");
        let note = notes.create_note("Secret", "plans", &alice).await.unwrap();

        let err = notes
            .update_note(note.id, "Mine now", "", &bob)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFoundOrDenied));

        // A forged draft naming bob as owner cannot reach alice's row either.
        let forged = NoteDraft {
            id: Some(note.id),
            user_id: bob.id,
            title: "Mine now".into(),
            content: String::new(),
        };
        let err = notes.save_note(forged).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFoundOrDenied));

        let err = notes
            .delete_note_by_id_and_user(note.id, &bob)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFoundOrDenied));

        let kept = notes.get_note_by_id_and_user(note.id, &alice).await.unwrap();
        assert_eq!(kept.title, "Secret");
    }

    #[tokio::test]
    async fn blank_titles_are_rejected() {
        let notes = service();
        let alice = user("alice");

        for title in ["", "   ", "\t\n"] {
            let err = notes.create_note(title, "body", &alice).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "title {title:?}");
        }
        assert_eq!(notes.count_notes_by_user(&alice).await.unwrap(), 0);

        let empty_body = notes.create_note("Title only", "", &alice).await.unwrap();
        assert_eq!(empty_body.content, "");
    }

    #[tokio::test]
    async fn update_rejects_blank_title_and_keeps_the_old_one() {
        let notes = service();
        let alice = user("alice");
        let note = notes.create_note("Keep", "body", &alice).await.unwrap();

        let err = notes.update_note(note.id, " ", "new", &alice).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let stored = notes.get_note_by_id_and_user(note.id, &alice).await.unwrap();
        assert_eq!(stored.title, "Keep");
        assert_eq!(stored.content, "body");
    }

    #[tokio::test]
    async fn notes_are_listed_most_recently_updated_first() {
        let notes = service();
        let alice = user("alice");
        let first = notes.create_note("t1", "", &alice).await.unwrap();
        tick().await;
        notes.create_note("t2", "", &alice).await.unwrap();
        tick().await;
        notes.create_note("t3", "", &alice).await.unwrap();

        let all = notes.get_all_notes_by_user(&alice).await.unwrap();
        assert_eq!(titles(&all), vec!["t3", "t2", "t1"]);

        tick().await;
        let edited = notes
            .update_note(first.id, "t1 edited", "", &alice)
            .await
            .unwrap();
        assert!(edited.updated_at > first.updated_at);
        assert_eq!(edited.created_at, first.created_at);

        let all = notes.get_all_notes_by_user(&alice).await.unwrap();
        assert_eq!(titles(&all), vec!["t1 edited", "t3", "t2"]);
    }

    #[tokio::test]
    async fn blank_search_equals_listing() {
        let notes = service();
        let alice = user("alice");
        notes.create_note("One", "a", &alice).await.unwrap();
        notes.create_note("Two", "b", &alice).await.unwrap();
        notes.create_note("Other", "c", &user("bob")).await.unwrap();

        let all = notes.get_all_notes_by_user(&alice).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(notes.search_notes(&alice, None).await.unwrap(), all);
        assert_eq!(notes.search_notes(&alice, Some("")).await.unwrap(), all);
        assert_eq!(notes.search_notes(&alice, Some("   ")).await.unwrap(), all);
    }

    #[tokio::test]
    async fn search_matches_title_or_content_ignoring_case() {
        let notes = service();
        let alice = user("alice");
        notes
            .create_note("Meeting Notes", "agenda", &alice)
            .await
            .unwrap();
        notes
            .create_note("Groceries", "buy milk before the MEETING", &alice)
            .await
            .unwrap();
        notes.create_note("Ideas", "nothing", &alice).await.unwrap();
        notes
            .create_note("Meeting with bob", "", &user("bob"))
            .await
            .unwrap();

        let hits = notes.search_notes(&alice, Some("  meeting ")).await.unwrap();
        assert_eq!(titles(&hits), vec!["Groceries", "Meeting Notes"]);

        let by_title = notes.search_notes_by_title(&alice, "meeting").await.unwrap();
        assert_eq!(titles(&by_title), vec!["Meeting Notes"]);

        let by_content = notes.search_notes_by_content(&alice, "Meeting").await.unwrap();
        assert_eq!(titles(&by_content), vec!["Groceries"]);

        assert!(notes.search_notes(&alice, Some("absent")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_twice_reports_not_found() {
        let notes = service();
        let alice = user("alice");
        let note = notes.create_note("Temp", "", &alice).await.unwrap();

        notes.delete_note_by_id_and_user(note.id, &alice).await.unwrap();
        let err = notes
            .delete_note_by_id_and_user(note.id, &alice)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFoundOrDenied));
    }

    #[tokio::test]
    async fn count_tracks_creates_and_deletes() {
        let notes = service();
        let alice = user("alice");
        let a = notes.create_note("a", "", &alice).await.unwrap();
        notes.create_note("b", "", &alice).await.unwrap();
        notes.create_note("c", "", &alice).await.unwrap();
        notes.delete_note_by_id_and_user(a.id, &alice).await.unwrap();

        assert_eq!(notes.count_notes_by_user(&alice).await.unwrap(), 2);
        assert_eq!(notes.count_notes_by_user(&user("bob")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn save_note_inserts_then_updates() {
        let notes = service();
        let alice = user("alice");

        let created = notes
            .save_note(NoteDraft::new("Draft", "v1", alice.id))
            .await
            .unwrap();
        let mut draft = NoteDraft::from(created.clone());
        assert_eq!(draft.id, Some(created.id));
        draft.content = "v2".into();

        let saved = notes.save_note(draft).await.unwrap();
        assert_eq!(saved.id, created.id);
        assert_eq!(saved.content, "v2");
        assert_eq!(notes.count_notes_by_user(&alice).await.unwrap(), 1);
    }
}
