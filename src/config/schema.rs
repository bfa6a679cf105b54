use crate::auth::password::DEFAULT_BCRYPT_COST;
use crate::auth::token::{DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "userauth";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the user store and generated signing key.
    pub data_dir: PathBuf,
    pub auth: AuthConfig,
    pub gateway: GatewayConfig,
}

/// Credential and token settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// User store file, relative to `data_dir` unless absolute.
    pub users_file: PathBuf,
    /// Generated signing key file, relative to `data_dir` unless absolute.
    /// Unused when `jwt_secret` is set.
    pub key_file: PathBuf,
    /// Explicit HS256 signing secret.
    pub jwt_secret: Option<String>,
    /// Bearer token lifetime in seconds.
    pub token_ttl_secs: u64,
    /// bcrypt cost factor (4..=31).
    pub bcrypt_cost: u32,
    /// Return the stored password secret in profile responses. Only for
    /// clients that still expect it.
    pub expose_password_hash: bool,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            auth: AuthConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            users_file: PathBuf::from("users.json"),
            key_file: PathBuf::from("jwt.key"),
            jwt_secret: None,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            expose_password_hash: false,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}

impl Config {
    /// `<platform config dir>/userauth/config.toml`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from `path` (must exist) or from the default location (may be
    /// absent), then apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(p) => Self::from_file(&p)?,
                None => Self::default(),
            },
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Overlay environment values. `lookup` is injected for tests.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("USERAUTH_DATA_DIR").filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(secret) = lookup("USERAUTH_JWT_SECRET").filter(|v| !v.is_empty()) {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(host) = lookup("USERAUTH_HOST").filter(|v| !v.is_empty()) {
            self.gateway.host = host;
        }
        if let Some(port) = lookup("USERAUTH_PORT").filter(|v| !v.is_empty()) {
            self.gateway.port = port
                .parse()
                .with_context(|| format!("USERAUTH_PORT is not a port number: {port}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            anyhow::bail!(
                "auth.bcrypt_cost must be between 4 and 31, got {}",
                self.auth.bcrypt_cost
            );
        }
        if self.auth.token_ttl_secs == 0 {
            anyhow::bail!("auth.token_ttl_secs must be greater than zero");
        }
        if self.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            anyhow::bail!(
                "auth.token_ttl_secs must be at most {MAX_TOKEN_TTL_SECS}, got {}",
                self.auth.token_ttl_secs
            );
        }
        if self.auth.users_file.as_os_str().is_empty() {
            anyhow::bail!("auth.users_file must not be empty");
        }
        Ok(())
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(&self.auth.users_file)
    }

    pub fn key_path(&self) -> PathBuf {
        self.data_dir.join(&self.auth.key_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.auth.bcrypt_cost, DEFAULT_BCRYPT_COST);
        assert_eq!(config.auth.users_file, PathBuf::from("users.json"));
        assert!(config.auth.jwt_secret.is_none());
        assert!(!config.auth.expose_password_hash);
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.gateway.port, 8000);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            data_dir = "/srv/userauth"

            [auth]
            token_ttl_secs = 600
            expose_password_hash = true
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/userauth"));
        assert_eq!(config.auth.token_ttl_secs, 600);
        assert!(config.auth.expose_password_hash);
        assert_eq!(config.auth.bcrypt_cost, DEFAULT_BCRYPT_COST);
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(
            config.users_path(),
            PathBuf::from("/srv/userauth/users.json")
        );
        assert_eq!(config.key_path(), PathBuf::from("/srv/userauth/jwt.key"));
    }

    #[test]
    fn absolute_users_file_ignores_data_dir() {
        let config = Config::from_toml(
            r#"
            data_dir = "/srv/userauth"
            [auth]
            users_file = "/elsewhere/people.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.users_path(), PathBuf::from("/elsewhere/people.json"));
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(Config::from_toml("[gateway]\nport = \"eighty\"").is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::default();
        config
            .apply_env_overrides(env(&[
                ("USERAUTH_DATA_DIR", "/tmp/ua"),
                ("USERAUTH_JWT_SECRET", "from-env"),
                ("USERAUTH_HOST", "0.0.0.0"),
                ("USERAUTH_PORT", "9001"),
            ]))
            .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/ua"));
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("from-env"));
        assert_eq!(config.gateway.host, "0.0.0.0");
        assert_eq!(config.gateway.port, 9001);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = Config::default();
        config.auth.jwt_secret = Some("from-file".into());
        config
            .apply_env_overrides(env(&[("USERAUTH_JWT_SECRET", "")]))
            .unwrap();
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("from-file"));
    }

    #[test]
    fn bad_port_env_is_an_error() {
        let mut config = Config::default();
        let err = config
            .apply_env_overrides(env(&[("USERAUTH_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("USERAUTH_PORT"));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = Config::default();
        config.auth.bcrypt_cost = 3;
        assert!(config.validate().is_err());

        config.auth.bcrypt_cost = 32;
        assert!(config.validate().is_err());

        config.auth.bcrypt_cost = 10;
        config.auth.token_ttl_secs = 0;
        assert!(config.validate().is_err());

        config.auth.token_ttl_secs = 60;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_caps_token_ttl() {
        let mut config = Config::default();
        config.auth.token_ttl_secs = MAX_TOKEN_TTL_SECS;
        assert!(config.validate().is_ok());

        config.auth.token_ttl_secs = MAX_TOKEN_TTL_SECS + 1;
        assert!(config.validate().is_err());

        config.auth.token_ttl_secs = u64::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("token_ttl_secs"));
    }

    #[test]
    fn load_from_explicit_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[auth]\nbcrypt_cost = 6\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.auth.bcrypt_cost, 6);
    }

    #[test]
    fn load_missing_explicit_file_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(Config::load(Some(tmp.path().join("absent.toml").as_path())).is_err());
    }

    #[test]
    fn load_rejects_invalid_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[auth]\nbcrypt_cost = 99\n").unwrap();

        let err = Config::load(Some(path.as_path())).unwrap_err();
        assert!(err.to_string().contains("bcrypt_cost"));
    }
}
