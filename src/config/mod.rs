//! Service configuration.
//!
//! Loaded from TOML; every field has a default so an empty or missing file
//! is valid. A handful of environment variables override the file:
//!
//! | Variable              | Field               |
//! |-----------------------|---------------------|
//! | `USERAUTH_DATA_DIR`   | `data_dir`          |
//! | `USERAUTH_JWT_SECRET` | `auth.jwt_secret`   |
//! | `USERAUTH_HOST`       | `gateway.host`      |
//! | `USERAUTH_PORT`       | `gateway.port`      |

pub mod schema;

pub use schema::{AuthConfig, Config, GatewayConfig};
