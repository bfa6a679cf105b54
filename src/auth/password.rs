//! Password hashing and verification (bcrypt).

use super::error::{AuthError, AuthResult};
use std::sync::OnceLock;

/// Default bcrypt cost factor.
pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

/// bcrypt only reads the first 72 bytes of its input. Anything longer would
/// let two different passwords share a secret, so it is refused outright.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Plaintext used to build the throwaway secret checked when a username
/// does not exist, so unknown and known users cost the same.
const DUMMY_PASSWORD: &str = "userauth-timing-equalizer";

/// Derives and checks salted bcrypt secrets.
#[derive(Debug)]
pub struct PasswordHasher {
    cost: u32,
    dummy_secret: OnceLock<Option<String>>,
}

impl PasswordHasher {
    /// Cost must be within bcrypt's 4..=31; config validation enforces it.
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            dummy_secret: OnceLock::new(),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash `plaintext` with a fresh random salt.
    ///
    /// Two calls on the same input give different secrets. Input longer than
    /// [`MAX_PASSWORD_BYTES`] is rejected.
    pub fn derive(&self, plaintext: &str) -> AuthResult<String> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::Validation(format!(
                "password must be at most {MAX_PASSWORD_BYTES} bytes"
            )));
        }
        bcrypt::hash(plaintext, self.cost).map_err(|e| AuthError::Crypto(e.to_string()))
    }

    /// Check `plaintext` against a stored secret.
    ///
    /// A malformed secret is a mismatch, not an error. So is plaintext longer
    /// than [`MAX_PASSWORD_BYTES`], which bcrypt would otherwise truncate.
    pub fn verify(&self, plaintext: &str, secret: &str) -> bool {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            tracing::debug!(len = plaintext.len(), "Password exceeds bcrypt input limit");
            return false;
        }
        match bcrypt::verify(plaintext, secret) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::debug!("Stored password secret is malformed: {e}");
                false
            }
        }
    }

    /// Burn one verification's worth of work against a throwaway secret.
    pub fn verify_dummy(&self, plaintext: &str) {
        if let Some(secret) = self.dummy_secret() {
            let _ = self.verify(plaintext, secret);
        }
    }

    /// Built on first use at the configured cost. If that cost is unusable
    /// the default cost stands in, since stored secrets still carry their
    /// own cost and must not become distinguishable by timing.
    fn dummy_secret(&self) -> Option<&str> {
        self.dummy_secret
            .get_or_init(|| match bcrypt::hash(DUMMY_PASSWORD, self.cost) {
                Ok(secret) => Some(secret),
                Err(e) => {
                    tracing::warn!(
                        cost = self.cost,
                        "Dummy secret at configured cost failed ({e}); using default cost"
                    );
                    bcrypt::hash(DUMMY_PASSWORD, DEFAULT_BCRYPT_COST)
                        .map_err(|e| tracing::error!("Dummy secret unavailable: {e}"))
                        .ok()
                }
            })
            .as_deref()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}
