use std::fmt;
use std::sync::Arc;

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AuthError;
use crate::models::User;
use crate::services::user::UserService;

pub struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

impl fmt::Debug for Keys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Keys([REDACTED])")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)
    }
}

/// Login and session tokens. Passwords are checked through the user
/// directory's hasher.
#[derive(Clone, Debug)]
pub struct AuthService {
    users: UserService,
    keys: Arc<Keys>,
    session_lifetime: chrono::Duration,
}

impl AuthService {
    pub fn new(users: UserService, keys: Keys, session_lifetime: chrono::Duration) -> Self {
        Self {
            users,
            keys: Arc::new(keys),
            session_lifetime,
        }
    }

    #[instrument(
        name = "AuthService: Login attempt",
        skip(self, password),
        fields(username = %username)
    )]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let user = self.users.find_by_username(username).await.map_err(|e| {
            tracing::error!("Database error during login: {:?}", e);
            AuthError::Internal
        })?;

        let user = match user {
            Some(u) => u,
            None => {
                tracing::warn!("Login failed: User not found");
                return Err(AuthError::WrongCredentials);
            }
        };

        let verified = self
            .users
            .hasher()
            .verify(password, &user.password_hash)
            .map_err(|e| {
                tracing::error!("Password verification failed: {:?}", e);
                AuthError::Internal
            })?;

        if !verified {
            tracing::warn!("Login failed: Invalid password provided");
            return Err(AuthError::WrongCredentials);
        }

        tracing::info!(user_id = %user.id, "User authenticated successfully");
        Ok(user)
    }

    pub fn issue_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (chrono::Utc::now() + self.session_lifetime).timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.keys.encoding).map_err(|e| {
            tracing::error!("JWT Encoding failed: {:?}", e);
            AuthError::TokenCreation
        })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(token, &self.keys.decoding, &Validation::default())
            .map_err(|e| {
                tracing::warn!("JWT decoding failed: {:?}", e);
                AuthError::InvalidToken
            })?;
        Ok(token_data.claims)
    }

    /// Resolves a session token to the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let user_id = self.verify_token(token)?.user_id()?;
        self.users
            .find_by_id(user_id)
            .await
            .map_err(|e| {
                tracing::error!("Database error while resolving session: {:?}", e);
                AuthError::Internal
            })?
            .ok_or(AuthError::InvalidToken)
    }
}
