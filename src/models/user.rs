use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// How an account authenticates.
/// Corresponds to the `auth_provider` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "auth_provider", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    /// Email + password account.
    Local,
    /// Account created or linked through Google sign-in.
    Google,
}

/// A user record as stored in the database.
///
/// An account is usable for local login only when `password_hash` is present,
/// and for Google login only when `google_id` is present. A local account
/// that later links Google carries both.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub google_access_token: Option<String>,
    pub google_refresh_token: Option<String>,
    pub auth_provider: AuthProvider,
    pub calendar_sync_enabled: bool,
    pub last_synced: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Column list for runtime `query_as` calls, kept in one place so every
    /// SELECT/RETURNING produces rows `FromRow` can map.
    pub const COLUMNS: &'static str = "id, email, name, password_hash, google_id, \
        google_access_token, google_refresh_token, auth_provider, \
        calendar_sync_enabled, last_synced, created_at";

    /// Whether the account holds Google credentials usable for calendar calls.
    pub fn has_google_credentials(&self) -> bool {
        self.google_access_token.is_some()
    }
}

/// Public projection of a user, safe to return to clients.
/// Never includes the password hash or Google tokens.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub auth_provider: AuthProvider,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            auth_provider: user.auth_provider,
        }
    }
}
