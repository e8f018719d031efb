//! Authentication collaborators: bearer-token resolution and the admin PIN gate

use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::db::DbError;
use crate::db::repository::UserRepository;

/// Resolves a credential to a stable user id
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// `Ok(None)` when the token is unknown or its user is inactive
    async fn authenticate(&self, token: &str) -> Result<Option<i64>, DbError>;
}

/// SHA-256 hex digest of a token, as stored in `api_tokens`
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Looks tokens up by hash; tokens are issued outside this service
pub struct TokenAuthenticator {
    users: Arc<dyn UserRepository>,
}

impl TokenAuthenticator {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Option<i64>, DbError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }

        match self.users.find_by_token_hash(&hash_token(token)).await? {
            Some(user) if user.is_active => Ok(Some(user.id)),
            Some(user) => {
                tracing::warn!(user_id = user.id, "Token presented for inactive user");
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

/// Checks the PIN protecting the admin endpoints
#[derive(Debug, Clone)]
pub struct AdminPinGate {
    pin: String,
}

impl AdminPinGate {
    pub fn new(pin: impl Into<String>) -> Self {
        Self { pin: pin.into() }
    }

    pub fn verify(&self, candidate: &str) -> bool {
        let expected = self.pin.as_bytes();
        let candidate = candidate.as_bytes();
        if expected.len() != candidate.len() {
            return false;
        }
        // constant time over equal-length inputs
        expected
            .iter()
            .zip(candidate)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryRepository;

    #[test]
    fn test_hash_token() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_admin_pin() {
        let gate = AdminPinGate::new("1234");
        assert!(gate.verify("1234"));
        assert!(!gate.verify("1235"));
        assert!(!gate.verify("12345"));
        assert!(!gate.verify(""));
    }

    #[tokio::test]
    async fn test_token_authenticator() {
        let repo = Arc::new(MemoryRepository::new());
        let user_id = repo.add_user("pemilik@umkm.id");
        repo.add_token(user_id, "secret-token");

        let auth = TokenAuthenticator::new(repo.clone());
        assert_eq!(auth.authenticate("secret-token").await.unwrap(), Some(user_id));
        assert_eq!(auth.authenticate("other").await.unwrap(), None);
        assert_eq!(auth.authenticate("  ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_inactive_user_is_rejected() {
        let repo = Arc::new(MemoryRepository::new());
        let user_id = repo.add_user("lama@umkm.id");
        repo.add_token(user_id, "old-token");
        repo.deactivate_user(user_id);

        let auth = TokenAuthenticator::new(repo);
        assert_eq!(auth.authenticate("old-token").await.unwrap(), None);
    }
}
