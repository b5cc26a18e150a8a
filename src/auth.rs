//! Password digests for user credentials.
//!
//! Digests are stored as `<salt>$<hex(sha256(salt || password))>` with a
//! fresh random salt per user, so identical passwords never share a digest.
//! The raw password is never written anywhere.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Digest a password with a fresh salt.
pub fn digest(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let hash = hash_with_salt(&salt, password);
    format!("{salt}${hash}")
}

/// Check a password against a stored digest.
///
/// A digest that doesn't parse never verifies.
pub fn verify(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    hash_with_salt(salt, password) == expected
}

fn hash_with_salt(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_verifies_its_own_password() {
        let d = digest("hunter2");
        assert!(verify("hunter2", &d));
    }

    #[test]
    fn wrong_password_rejected() {
        let d = digest("hunter2");
        assert!(!verify("hunter3", &d));
    }

    #[test]
    fn same_password_digests_differently() {
        // Fresh salt per call.
        assert_ne!(digest("hunter2"), digest("hunter2"));
    }

    #[test]
    fn malformed_digest_never_verifies() {
        assert!(!verify("hunter2", "no-separator-here"));
        assert!(!verify("hunter2", ""));
    }
}
