//! Credential verification.
//!
//! Stored credentials are the lowercase hex SHA-256 of the UTF-8 password.
//! Verification is a one-shot check; there is no session renewal.

use sha2::{Digest, Sha256};

use crate::db::{DbError, ReviewDb};
use crate::error::ReviewError;
use crate::types::ReviewerIdentity;

pub trait CredentialVerifier {
    /// Returns the reviewer on a match, `ReviewError::AuthFailure` otherwise.
    fn verify(&self, username: &str, password: &str) -> Result<ReviewerIdentity, ReviewError>;
}

/// Hash a password the way the `users` table stores it.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare two hex digests without short-circuiting on the first mismatch.
fn digests_match(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Create or reset a reviewer account.
pub fn provision_reviewer(db: &ReviewDb, username: &str, password: &str) -> Result<(), DbError> {
    db.insert_user(username, &hash_password(password))?;
    log::info!("Provisioned reviewer {}", username);
    Ok(())
}

impl CredentialVerifier for ReviewDb {
    fn verify(&self, username: &str, password: &str) -> Result<ReviewerIdentity, ReviewError> {
        let user = self
            .get_user(username)
            .map_err(|e| ReviewError::Load(e.to_string()))?;

        match user {
            Some(identity) if digests_match(&identity.credential_hash, &hash_password(password)) => {
                Ok(identity)
            }
            _ => {
                log::warn!("Rejected login for {}", username);
                Err(ReviewError::AuthFailure)
            }
        }
    }
}
