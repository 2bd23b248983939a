pub mod note;
pub mod user;

pub use note::{Note, NoteDraft, NoteId};
pub use user::{NewUser, User};
