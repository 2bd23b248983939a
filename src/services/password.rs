//! One-way credential hashing.
//!
//! Services depend on [`CredentialHasher`] only; [`Argon2Hasher`] is the
//! implementation wired in at startup. Hashes are PHC strings, so the
//! algorithm parameters and salt travel with the stored value.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

pub trait CredentialHasher: Send + Sync + std::fmt::Debug {
    fn hash(&self, plaintext: &str) -> anyhow::Result<String>;

    /// `Ok(false)` for a wrong password, `Err` only for an unreadable hash.
    fn verify(&self, plaintext: &str, hash: &str) -> anyhow::Result<bool>;
}

#[derive(Clone, Debug)]
pub struct Argon2Hasher {
    params: Params,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Argon2Hasher {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, plaintext: &str, hash: &str) -> anyhow::Result<bool> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            tracing::error!("Critical: Failed to parse password hash from DB: {:?}", e);
            anyhow::anyhow!("stored password hash is malformed: {e}")
        })?;
        match self.argon2().verify_password(plaintext.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(anyhow::anyhow!("failed to verify password: {e}")),
        }
    }
}

#[cfg(test)]
pub(crate) fn cheap_hasher() -> Argon2Hasher {
    // Smallest parameters argon2 accepts; keeps debug-build tests fast.
    Argon2Hasher::new(Params::new(8, 1, 1, None).expect("valid argon2 params"))
}
