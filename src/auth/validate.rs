//! Request field patterns, checked before any workflow runs.

use super::error::{AuthError, AuthResult};
use super::password::MAX_PASSWORD_BYTES;
use regex::Regex;
use std::sync::LazyLock;

pub const MIN_USERNAME_LEN: usize = 4;
pub const MIN_PASSWORD_LEN: usize = 5;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+$").expect("username pattern"));
static PASSWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9@#$%^&*!?\-_.]+$").expect("password pattern"));
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+$").expect("name pattern"));

fn reject(msg: impl Into<String>) -> AuthError {
    AuthError::Validation(msg.into())
}

pub fn username(value: &str) -> AuthResult<()> {
    if value.chars().count() < MIN_USERNAME_LEN {
        return Err(reject(format!(
            "username must be at least {MIN_USERNAME_LEN} characters"
        )));
    }
    if !USERNAME_RE.is_match(value) {
        return Err(reject("username must be lowercase letters and digits only"));
    }
    Ok(())
}

/// Password rules for new accounts.
pub fn new_password(value: &str) -> AuthResult<()> {
    login_password(value)?;
    if value.len() > MAX_PASSWORD_BYTES {
        return Err(reject(format!(
            "password must be at most {MAX_PASSWORD_BYTES} characters"
        )));
    }
    if !PASSWORD_RE.is_match(value) {
        return Err(reject(
            "password may only contain letters, digits and @#$%^&*!?-_.",
        ));
    }
    Ok(())
}

/// Sign-in only checks length; the charset may have been looser when the
/// account was created.
pub fn login_password(value: &str) -> AuthResult<()> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(reject(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn name(field: &str, value: &str) -> AuthResult<()> {
    if !NAME_RE.is_match(value) {
        return Err(reject(format!("{field} must contain letters only")));
    }
    Ok(())
}

pub fn signup(user: &str, password: &str, fname: &str, lname: &str) -> AuthResult<()> {
    username(user)?;
    new_password(password)?;
    name("fname", fname)?;
    name("lname", lname)
}

pub fn signin(user: &str, password: &str) -> AuthResult<()> {
    username(user)?;
    login_password(password)
}
