//! One-shot messages carried across a redirect in a cookie.
//!
//! The cookie holds a short code rather than the text, so message wording
//! stays server-side and nothing needs escaping.

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    Registered,
    NoteCreated,
    NoteUpdated,
    NoteDeleted,
    NoteNotFound,
    Unexpected,
}

impl Flash {
    const ALL: [Flash; 6] = [
        Flash::Registered,
        Flash::NoteCreated,
        Flash::NoteUpdated,
        Flash::NoteDeleted,
        Flash::NoteNotFound,
        Flash::Unexpected,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Flash::Registered => "registered",
            Flash::NoteCreated => "note_created",
            Flash::NoteUpdated => "note_updated",
            Flash::NoteDeleted => "note_deleted",
            Flash::NoteNotFound => "note_not_found",
            Flash::Unexpected => "unexpected",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.code() == code)
    }

    pub fn message(self) -> &'static str {
        match self {
            Flash::Registered => "Registration successful! Please log in with your credentials.",
            Flash::NoteCreated => "Note created successfully!",
            Flash::NoteUpdated => "Note updated successfully!",
            Flash::NoteDeleted => "Note deleted successfully!",
            Flash::NoteNotFound => "Note not found or access denied",
            Flash::Unexpected => "Something went wrong. Please try again.",
        }
    }

    pub fn is_error(self) -> bool {
        matches!(self, Flash::NoteNotFound | Flash::Unexpected)
    }

    pub fn set(self, jar: CookieJar) -> CookieJar {
        let cookie = Cookie::build((FLASH_COOKIE, self.code()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax);
        jar.add(cookie)
    }

    /// Reads the pending message, if any, and clears the cookie.
    pub fn take(jar: CookieJar) -> (CookieJar, Option<Flash>) {
        let Some(cookie) = jar.get(FLASH_COOKIE) else {
            return (jar, None);
        };
        let flash = Flash::from_code(cookie.value());
        (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), flash)
    }
}

/// Success and error banners shown at the top of every page.
#[derive(Debug, Clone, Default)]
pub struct Banners {
    pub notice: Option<String>,
    pub alert: Option<String>,
}

impl Banners {
    pub fn alert(message: impl Into<String>) -> Self {
        Self {
            notice: None,
            alert: Some(message.into()),
        }
    }
}

impl From<Option<Flash>> for Banners {
    fn from(flash: Option<Flash>) -> Self {
        match flash {
            Some(f) if f.is_error() => Self::alert(f.message()),
            Some(f) => Self {
                notice: Some(f.message().to_string()),
                alert: None,
            },
            None => Self::default(),
        }
    }
}
