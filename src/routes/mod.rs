pub mod auth;
pub mod dashboard;
pub mod flash;
pub mod notes;

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::models::Note;

pub(crate) fn render<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render template: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

/// A note prepared for display.
#[derive(Debug, Clone)]
pub struct NoteView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub created_at: String,
    pub updated_at: String,
}

const EXCERPT_CHARS: usize = 150;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

impl From<Note> for NoteView {
    fn from(note: Note) -> Self {
        let excerpt = if note.content.chars().count() > EXCERPT_CHARS {
            let cut: String = note.content.chars().take(EXCERPT_CHARS).collect();
            format!("{}...", cut.trim_end())
        } else {
            note.content.clone()
        };
        Self {
            id: note.id,
            excerpt,
            created_at: note.created_at.format(TIMESTAMP_FORMAT).to_string(),
            updated_at: note.updated_at.format(TIMESTAMP_FORMAT).to_string(),
            title: note.title,
            content: note.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn note(content: &str) -> Note {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap();
        Note {
            id: 7,
            user_id: Uuid::new_v4(),
            title: "Pi day".into(),
            content: content.into(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn short_content_is_its_own_excerpt() {
        let view = NoteView::from(note("short"));
        assert_eq!(view.excerpt, "short");
        assert_eq!(view.updated_at, "2026-03-14 15:09");
    }

    #[test]
    fn long_content_is_cut_on_a_char_boundary() {
        let view = NoteView::from(note(&"é".repeat(200)));
        assert_eq!(view.excerpt.chars().count(), EXCERPT_CHARS + 3);
        assert!(view.excerpt.ends_with("..."));
        assert_eq!(view.content.chars().count(), 200);
    }
}
