//! Authentication workflow errors.

/// Failure of a register / authenticate / fetch-profile workflow.
///
/// Everything above `Storage` is an expected outcome with a fixed,
/// client-safe message. The remaining variants are unexpected and must not
/// leak their detail past the boundary.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Register-time uniqueness violation.
    #[error("Username already exists")]
    DuplicateUsername,

    /// Unknown username or wrong password. Never distinguish the two.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// No bearer token was presented.
    #[error("Please provide a JWT token for authentication")]
    MissingToken,

    /// Token malformed, expired, or carrying a bad signature.
    #[error("JWT Verification Failed")]
    InvalidToken,

    /// Token decoded fine but names an account that no longer exists.
    #[error("User not found")]
    UserNotFound,

    /// Input rejected before reaching the workflows.
    #[error("{0}")]
    Validation(String),

    /// Record store unreadable, unwritable, or corrupt.
    #[error("storage error: {0}")]
    Storage(#[source] anyhow::Error),

    /// bcrypt or token signing failed.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Anything else that is not the caller's fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Wrap an unexpected store failure.
    #[inline]
    pub fn storage<E: Into<anyhow::Error>>(err: E) -> Self {
        Self::Storage(err.into())
    }

    /// Whether this is an unexpected failure rather than a client mistake.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Crypto(_) | Self::Internal(_))
    }

    /// Message safe to hand to a client.
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
