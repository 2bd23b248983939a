use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Username,
    Email,
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityField::Username => f.write_str("Username"),
            IdentityField::Email => f.write_str("Email"),
        }
    }
}

/// Failures of the user and note services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} already exists")]
    DuplicateIdentity(IdentityField),

    #[error("{0}")]
    Validation(String),

    /// Deliberately the same for a missing note and someone else's note.
    #[error("Note not found or access denied")]
    NotFoundOrDenied,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServiceError::DuplicateIdentity(_) => (StatusCode::CONFLICT, self.to_string()),
            ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServiceError::NotFoundOrDenied => (StatusCode::NOT_FOUND, self.to_string()),
            ServiceError::Hashing(_) | ServiceError::Store(_) => {
                tracing::error!(error = %self, "Internal service error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Wrong credentials")]
    WrongCredentials,

    #[error("Token creation error")]
    TokenCreation,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::WrongCredentials => Redirect::to("/login?error").into_response(),
            AuthError::InvalidToken => Redirect::to("/login").into_response(),
            AuthError::TokenCreation => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate session",
            )
                .into_response(),
            AuthError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred",
            )
                .into_response(),
        }
    }
}
