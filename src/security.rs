//! Room password hashing.
//!
//! Passwords are never stored in clear: a random 16-byte salt is hashed
//! together with the password and both are kept base64-encoded. Verification
//! compares digests in constant time.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngExt;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const SALT_LEN: usize = 16;

/// A salted SHA-256 password digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    salt: String,
    digest: String,
}

impl PasswordHash {
    /// Hash a password with a fresh random salt.
    pub fn new(password: &str) -> Self {
        let mut rng = rand::rng();
        let mut salt = [0u8; SALT_LEN];
        rng.fill(&mut salt);

        let digest = digest_with_salt(&salt, password);
        Self {
            salt: BASE64.encode(salt),
            digest: BASE64.encode(digest),
        }
    }

    /// Constant-time verification of a password attempt.
    pub fn verify(&self, attempt: &str) -> bool {
        let Ok(salt) = BASE64.decode(&self.salt) else {
            return false;
        };
        let Ok(stored) = BASE64.decode(&self.digest) else {
            return false;
        };
        let computed = digest_with_salt(&salt, attempt);
        stored.as_slice().ct_eq(&computed).into()
    }
}

fn digest_with_salt(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_only_the_original_password() {
        let hash = PasswordHash::new("hunter2");
        assert!(hash.verify("hunter2"));
        assert!(!hash.verify("hunter3"));
        assert!(!hash.verify(""));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = PasswordHash::new("hunter2");
        let b = PasswordHash::new("hunter2");
        assert_ne!(a, b, "two hashes of the same password should not collide");
        assert!(a.verify("hunter2") && b.verify("hunter2"));
    }
}
