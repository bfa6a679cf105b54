//! Register, authenticate and fetch-profile workflows.
//!
//! Each call is a single request/response with no state carried between
//! calls beyond the record store. Register's load→mutate→save runs under one
//! process-wide lock so two concurrent sign-ups cannot both pass the
//! uniqueness check. Writers in *other* processes sharing the same file are
//! not coordinated.

use super::error::{AuthError, AuthResult};
use super::keys::resolve_signing_key;
use super::password::PasswordHasher;
use super::record::{find_by_username, Profile, UserRecord};
use super::store::{JsonFileStore, RecordStore};
use super::token::{fingerprint, IdentityClaims, TokenService};
use crate::config::Config;
use parking_lot::Mutex;
use std::sync::Arc;

pub struct AuthService {
    store: Arc<dyn RecordStore>,
    hasher: PasswordHasher,
    tokens: TokenService,
    expose_password_hash: bool,
    write_lock: Mutex<()>,
}

impl AuthService {
    pub fn new(store: Arc<dyn RecordStore>, hasher: PasswordHasher, tokens: TokenService) -> Self {
        Self {
            store,
            hasher,
            tokens,
            expose_password_hash: false,
            write_lock: Mutex::new(()),
        }
    }

    /// Include the stored password secret in profiles.
    pub fn with_expose_password_hash(mut self, expose: bool) -> Self {
        self.expose_password_hash = expose;
        self
    }

    /// Wire up the JSON file store, bcrypt cost and signing key from config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = JsonFileStore::new(config.users_path());
        let key = resolve_signing_key(config.auth.jwt_secret.as_deref(), &config.key_path())?;
        let tokens = TokenService::new(&key, config.auth.token_ttl_secs);
        let hasher = PasswordHasher::new(config.auth.bcrypt_cost);

        tracing::info!(
            store = %store.path().display(),
            bcrypt_cost = hasher.cost(),
            token_ttl_secs = tokens.ttl_secs(),
            "Auth service initialized"
        );

        Ok(Self::new(Arc::new(store), hasher, tokens)
            .with_expose_password_hash(config.auth.expose_password_hash))
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    fn load(&self) -> AuthResult<Vec<UserRecord>> {
        self.store.load_all().map_err(AuthError::storage)
    }

    /// Create an account. Fails with `DuplicateUsername` if taken.
    pub fn register(
        &self,
        username: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> AuthResult<()> {
        let _guard = self.write_lock.lock();

        let mut records = self.load()?;
        if find_by_username(&records, username).is_some() {
            tracing::info!(username, "Registration rejected: username taken");
            return Err(AuthError::DuplicateUsername);
        }

        let secret = self.hasher.derive(password)?;
        let record = UserRecord::new(username, secret, first_name, last_name);
        let user_id = record.user_id.clone();
        records.push(record);
        self.store.save_all(&records).map_err(AuthError::storage)?;

        tracing::info!(username, user_id = %user_id, "User registered");
        Ok(())
    }

    /// Check credentials and mint a bearer token.
    pub fn authenticate(&self, username: &str, password: &str) -> AuthResult<String> {
        let records = self.load()?;

        let Some(record) = find_by_username(&records, username) else {
            // Same work as a real check so response time does not reveal
            // whether the account exists.
            self.hasher.verify_dummy(password);
            tracing::warn!(username, "Sign-in failed");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &record.password_secret) {
            tracing::warn!(username, "Sign-in failed");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(IdentityClaims {
                username: record.username.clone(),
                first_name: record.first_name.clone(),
                user_id: record.user_id.clone(),
            })
            .map_err(|e| AuthError::Crypto(e.to_string()))?;

        tracing::info!(username, token = %fingerprint(&token), "Sign-in succeeded");
        Ok(token)
    }

    /// Resolve a bearer token to the caller's profile.
    pub fn fetch_profile(&self, token: Option<&str>) -> AuthResult<Profile> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = self.tokens.decode(token).ok_or(AuthError::InvalidToken)?;

        let records = self.load()?;
        let record = find_by_username(&records, &claims.identity.username)
            .ok_or(AuthError::UserNotFound)?;

        Ok(record.to_profile(self.expose_password_hash))
    }
}
