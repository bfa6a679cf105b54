use serde::{Deserialize, Serialize};

/// A registered account, exactly as persisted in `users.json`.
///
/// Field names on disk are fixed (`userId`, `fname`, `lname`, `password`)
/// so existing stores keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
    #[serde(rename = "fname")]
    pub first_name: String,
    #[serde(rename = "lname")]
    pub last_name: String,
    /// bcrypt secret, never the plaintext.
    #[serde(rename = "password")]
    pub password_secret: String,
}

impl UserRecord {
    /// Build a record with a fresh v4 id.
    pub fn new(
        username: &str,
        password_secret: String,
        first_name: &str,
        last_name: &str,
    ) -> Self {
        Self {
            user_id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            password_secret,
        }
    }

    /// Profile view of this record.
    pub fn to_profile(&self, include_secret: bool) -> Profile {
        Profile {
            user_id: self.user_id.clone(),
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            password_secret: include_secret.then(|| self.password_secret.clone()),
        }
    }
}

/// What `fetch_profile` hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
    #[serde(rename = "fname")]
    pub first_name: String,
    #[serde(rename = "lname")]
    pub last_name: String,
    /// Only present when `auth.expose_password_hash` is on.
    #[serde(
        rename = "password",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub password_secret: Option<String>,
}

/// Find a record by exact username.
pub fn find_by_username<'a>(records: &'a [UserRecord], username: &str) -> Option<&'a UserRecord> {
    records.iter().find(|r| r.username == username)
}
