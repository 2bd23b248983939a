pub mod auth;
pub mod note;
pub mod password;
pub mod user;

pub use auth::{AuthService, Claims, Keys};
pub use note::NoteService;
pub use password::{Argon2Hasher, CredentialHasher};
pub use user::UserService;
