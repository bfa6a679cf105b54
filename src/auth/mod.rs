//! Username/password authentication.
//!
//! Provides:
//! - Flat JSON-file user record store (full load / full replace)
//! - Password hashing with bcrypt (per-secret salt, configurable cost)
//! - Signed bearer tokens (JWT, HS256, one-hour default lifetime)
//! - Register / authenticate / fetch-profile workflows
//!
//! ## Design Decisions
//! - The store has no index; the workflow layer scans the loaded sequence.
//!   Uniqueness of `username` is enforced only by register, under a
//!   process-wide lock.
//! - Token decode failures are tagged (`Expired`, `BadSignature`,
//!   `Malformed`) for logging, then collapsed to "invalid" for callers.
//! - Profiles omit the stored password secret unless
//!   `auth.expose_password_hash` is set.

pub mod error;
pub mod keys;
pub mod password;
pub mod record;
pub mod service;
pub mod store;
pub mod token;
pub mod validate;

pub use error::{AuthError, AuthResult};
pub use password::PasswordHasher;
pub use record::{Profile, UserRecord};
pub use service::AuthService;
pub use store::{JsonFileStore, MemoryStore, RecordStore};
pub use token::{DecodeFailure, IdentityClaims, SignedClaims, TokenService};
