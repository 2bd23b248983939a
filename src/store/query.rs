//! Explicit predicates for note reads.
//!
//! A [`NoteQuery`] is always scoped to one owner. It optionally narrows the
//! result to notes whose title and/or content contain a term, compared
//! case-insensitively. The same query is evaluated in memory by
//! [`NoteQuery::matches`] and rendered to SQL by [`NoteQuery::select`], so
//! both stores agree on what a search returns.

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::Note;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Content,
    TitleOrContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TextFilter {
    field: SearchField,
    needle: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteQuery {
    owner: Uuid,
    filter: Option<TextFilter>,
}

impl NoteQuery {
    pub fn owned_by(owner: Uuid) -> Self {
        Self {
            owner,
            filter: None,
        }
    }

    pub fn containing(mut self, field: SearchField, term: impl Into<String>) -> Self {
        self.filter = Some(TextFilter {
            field,
            needle: term.into(),
        });
        self
    }

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    pub fn matches(&self, note: &Note) -> bool {
        if note.user_id != self.owner {
            return false;
        }
        let Some(filter) = &self.filter else {
            return true;
        };
        let needle = filter.needle.to_lowercase();
        let hit = |haystack: &str| haystack.to_lowercase().contains(&needle);
        match filter.field {
            SearchField::Title => hit(&note.title),
            SearchField::Content => hit(&note.content),
            SearchField::TitleOrContent => hit(&note.title) || hit(&note.content),
        }
    }

    /// `SELECT {columns} FROM notes` restricted by this query, newest first.
    pub fn select(&self, columns: &str) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT {columns} FROM notes WHERE user_id = "));
        qb.push_bind(self.owner);

        if let Some(filter) = &self.filter {
            match filter.field {
                SearchField::Title => push_contains(&mut qb, "title", &filter.needle),
                SearchField::Content => push_contains(&mut qb, "content", &filter.needle),
                SearchField::TitleOrContent => {
                    qb.push(" AND (");
                    push_contains_expr(&mut qb, "title", &filter.needle);
                    qb.push(" OR ");
                    push_contains_expr(&mut qb, "content", &filter.needle);
                    qb.push(")");
                }
            }
        }

        qb.push(" ORDER BY updated_at DESC, id DESC");
        qb
    }
}

fn push_contains(qb: &mut QueryBuilder<'static, Postgres>, column: &str, needle: &str) {
    qb.push(" AND ");
    push_contains_expr(qb, column, needle);
}

// strpos rather than LIKE so `%` and `_` in the term match literally.
fn push_contains_expr(qb: &mut QueryBuilder<'static, Postgres>, column: &str, needle: &str) {
    qb.push(format!("strpos(lower({column}), lower("));
    qb.push_bind(needle.to_string());
    qb.push(")) > 0");
}
