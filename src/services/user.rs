use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::errors::{IdentityField, ServiceError};
use crate::models::{NewUser, User};
use crate::services::password::CredentialHasher;
use crate::store::{StoreError, UserStore};

/// User directory: registration, lookups and credential updates.
#[derive(Clone, Debug)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn CredentialHasher>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { store, hasher }
    }

    pub fn hasher(&self) -> &dyn CredentialHasher {
        self.hasher.as_ref()
    }

    /// Username is checked before email, so a request colliding on both
    /// reports the username.
    #[instrument(
        name = "UserService: Register",
        skip(self, user),
        fields(username = %user.username, email = %user.email)
    )]
    pub async fn register(&self, user: NewUser) -> Result<User, ServiceError> {
        if self.store.exists_by_username(&user.username).await? {
            tracing::warn!("Registration rejected: username taken");
            return Err(ServiceError::DuplicateIdentity(IdentityField::Username));
        }
        if self.store.exists_by_email(&user.email).await? {
            tracing::warn!("Registration rejected: email taken");
            return Err(ServiceError::DuplicateIdentity(IdentityField::Email));
        }

        let password_hash = self.hash(&user.password)?;
        let created = self
            .store
            .insert(&user.username, &user.email, &password_hash)
            .await
            .map_err(duplicate_from_constraint)?;

        tracing::info!(user_id = %created.id, "User registered");
        Ok(created)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.store.find_by_username(username).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.store.find_by_email(email).await?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ServiceError> {
        Ok(self.store.find_by_id(id).await?)
    }

    pub async fn exists_by_username(&self, username: &str) -> Result<bool, ServiceError> {
        Ok(self.store.exists_by_username(username).await?)
    }

    pub async fn exists_by_email(&self, email: &str) -> Result<bool, ServiceError> {
        Ok(self.store.exists_by_email(email).await?)
    }

    /// The caller is responsible for having confirmed the user's identity.
    #[instrument(name = "UserService: Update password", skip(self, user, new_password), fields(user_id = %user.id))]
    pub async fn update_password(
        &self,
        mut user: User,
        new_password: &str,
    ) -> Result<User, ServiceError> {
        user.password_hash = self.hash(new_password)?;
        self.update_user(user).await
    }

    pub async fn update_user(&self, user: User) -> Result<User, ServiceError> {
        self.store
            .update(&user)
            .await
            .map_err(duplicate_from_constraint)
    }

    fn hash(&self, plaintext: &str) -> Result<String, ServiceError> {
        self.hasher
            .hash(plaintext)
            .map_err(|e| ServiceError::Hashing(e.to_string()))
    }
}

/// A unique violation that slipped past the pre-checks still names its field.
fn duplicate_from_constraint(err: StoreError) -> ServiceError {
    match &err {
        StoreError::UniqueViolation { constraint } if constraint.contains("username") => {
            ServiceError::DuplicateIdentity(IdentityField::Username)
        }
        StoreError::UniqueViolation { constraint } if constraint.contains("email") => {
            ServiceError::DuplicateIdentity(IdentityField::Email)
        }
        _ => ServiceError::Store(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::password::cheap_hasher;
    use crate::store::InMemoryStore;

    fn service() -> UserService {
        UserService::new(Arc::new(InMemoryStore::new()), Arc::new(cheap_hasher()))
    }

    #[tokio::test]
    async fn register_hashes_the_password() {
        let users = service();
        let user = users
            .register(NewUser::new("ada", "ada@example.com", "analytical"))
            .await
            .unwrap();

        assert_ne!(user.password_hash, "analytical");
        assert!(users.hasher().verify("analytical", &user.password_hash).unwrap());
        assert!(users.exists_by_username("ada").await.unwrap());
        assert!(users.exists_by_email("ada@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let users = service();
        users
            .register(NewUser::new("ada", "ada@example.com", "secret"))
            .await
            .unwrap();

        let err = users
            .register(NewUser::new("ada", "lovelace@example.com", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::DuplicateIdentity(IdentityField::Username)
        ));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let users = service();
        users
            .register(NewUser::new("ada", "ada@example.com", "secret"))
            .await
            .unwrap();

        let err = users
            .register(NewUser::new("lovelace", "ada@example.com", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::DuplicateIdentity(IdentityField::Email)
        ));
    }

    #[tokio::test]
    async fn username_is_checked_before_email() {
        let users = service();
        users
            .register(NewUser::new("ada", "ada@example.com", "secret"))
            .await
            .unwrap();

        let err = users
            .register(NewUser::new("ada", "ada@example.com", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::DuplicateIdentity(IdentityField::Username)
        ));
    }

    #[tokio::test]
    async fn lookups_return_none_for_unknown_users() {
        let users = service();
        let ada = users
            .register(NewUser::new("ada", "ada@example.com", "secret"))
            .await
            .unwrap();

        assert_eq!(users.find_by_id(ada.id).await.unwrap(), Some(ada.clone()));
        assert_eq!(users.find_by_username("ada").await.unwrap(), Some(ada.clone()));
        assert_eq!(users.find_by_email("ada@example.com").await.unwrap(), Some(ada));
        assert!(users.find_by_username("grace").await.unwrap().is_none());
        assert!(users.find_by_email("grace@example.com").await.unwrap().is_none());
        assert!(users.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_password_rehashes() {
        let users = service();
        let ada = users
            .register(NewUser::new("ada", "ada@example.com", "old-secret"))
            .await
            .unwrap();

        let updated = users.update_password(ada, "new-secret").await.unwrap();
        let stored = users.find_by_id(updated.id).await.unwrap().unwrap();

        assert!(users.hasher().verify("new-secret", &stored.password_hash).unwrap());
        assert!(!users.hasher().verify("old-secret", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn update_user_persists_mutated_fields() {
        let users = service();
        let mut ada = users
            .register(NewUser::new("ada", "ada@example.com", "secret"))
            .await
            .unwrap();

        ada.email = "countess@example.com".into();
        users.update_user(ada.clone()).await.unwrap();

        assert!(users.find_by_email("ada@example.com").await.unwrap().is_none());
        assert_eq!(
            users.find_by_email("countess@example.com").await.unwrap(),
            Some(ada)
        );
    }

    #[tokio::test]
    async fn update_user_into_a_taken_email_is_a_duplicate() {
        let users = service();
        users
            .register(NewUser::new("ada", "ada@example.com", "secret"))
            .await
            .unwrap();
        let mut grace = users
            .register(NewUser::new("grace", "grace@example.com", "secret"))
            .await
            .unwrap();

        grace.email = "ada@example.com".into();
        let err = users.update_user(grace).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::DuplicateIdentity(IdentityField::Email)
        ));
    }
}
