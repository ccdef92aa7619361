use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::AuthError;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
pub const SALT_LENGTH: usize = 32;
pub const HASH_LENGTH: usize = 32;
pub const MIN_PASSWORD_LENGTH: usize = 8;

const SCHEME: &str = "pbkdf2-sha256";

/// PBKDF2-HMAC-SHA256 password hasher.
///
/// Stored format: `pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>`.
/// Verification reads the iteration count from the stored hash, so
/// changing the configured count only affects new hashes.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(PBKDF2_ITERATIONS)
    }
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut salt);

        let mut hash = [0u8; HASH_LENGTH];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, self.iterations, &mut hash);

        format!(
            "{SCHEME}${}${}${}",
            self.iterations,
            STANDARD.encode(salt),
            STANDARD.encode(hash)
        )
    }

    /// Constant-time comparison against a stored hash. An empty stored
    /// hash (OAuth account) never matches.
    pub fn verify(&self, password: &str, stored: &str) -> Result<bool, AuthError> {
        if stored.is_empty() {
            return Ok(false);
        }

        let mut parts = stored.split('$');
        let (Some(SCHEME), Some(iterations), Some(salt), Some(expected), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(AuthError::Hashing("unrecognized hash format".into()));
        };

        let iterations: u32 = iterations
            .parse()
            .map_err(|_| AuthError::Hashing("invalid iteration count".into()))?;
        let salt = STANDARD
            .decode(salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        let expected = STANDARD
            .decode(expected)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        let mut actual = vec![0u8; expected.len()];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut actual);

        Ok(actual.ct_eq(&expected).into())
    }
}
