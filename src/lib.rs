#![forbid(unsafe_code)]

//! userauth — username/password accounts with signed bearer tokens.
//!
//! - [`auth`]: record store, bcrypt credentials, JWT tokens, workflows
//! - [`config`]: TOML + environment configuration
//! - [`gateway`]: axum HTTP surface (`/signup`, `/signin`, `/user/me`)

pub mod auth;
pub mod config;
pub mod gateway;

pub use auth::{AuthError, AuthService};
pub use config::Config;
