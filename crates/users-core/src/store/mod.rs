//! SQLite storage for accounts, clients, and sessions
//!
//! One store backs all three auth-core seams; hand it out behind an `Arc`
//! and coerce to whichever trait object a consumer needs.

use std::collections::HashSet;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use openlot_auth_core::Result as AuthResult;
use openlot_auth_core::{
    ApiClient, AuthError, Claim, ClientStore, Session, SessionStore, UserRecord, UserStore,
};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::warn;

use crate::error::{Error, Result};
use crate::types::UserAccount;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS user_account (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    security_question TEXT,
    security_answer_hash TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_account_claim (
    user_account_id INTEGER NOT NULL REFERENCES user_account(id) ON DELETE CASCADE,
    claim TEXT NOT NULL,
    PRIMARY KEY (user_account_id, claim)
);

CREATE TABLE IF NOT EXISTS oauth_client (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id TEXT NOT NULL UNIQUE,
    secret TEXT NOT NULL,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS oauth_client_session (
    refresh_token TEXT PRIMARY KEY,
    client_id TEXT NOT NULL REFERENCES oauth_client(client_id) ON DELETE CASCADE,
    user_account_id INTEGER REFERENCES user_account(id) ON DELETE CASCADE,
    expires_at_ms INTEGER NOT NULL
);
";

/// SQLite-backed store for user accounts, API clients, and sessions.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect (creating the file when the URL says `mode=rwc`) and make
    /// sure the schema exists.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        for statement in SCHEMA.split(';') {
            let statement = statement.trim();
            if !statement.is_empty() {
                sqlx::query(statement).execute(&pool).await?;
            }
        }
        Ok(SqliteStore { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ---- user accounts -----------------------------------------------

    pub async fn insert_user(
        &self,
        username: &str,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
        security_question: Option<&str>,
        security_answer_hash: Option<&str>,
    ) -> Result<UserAccount> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO user_account \
             (username, first_name, last_name, password_hash, security_question, security_answer_hash, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(username)
        .bind(first_name)
        .bind(last_name)
        .bind(password_hash)
        .bind(security_question)
        .bind(security_answer_hash)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if Error::is_unique_violation(&e) {
                Error::DuplicateUsername(username.to_string())
            } else {
                e.into()
            }
        })?;

        Ok(UserAccount {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            password_hash: password_hash.to_string(),
            security_question: security_question.map(str::to_string),
            security_answer_hash: security_answer_hash.map(str::to_string),
            created_at,
        })
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<UserAccount>> {
        let row = sqlx::query("SELECT * FROM user_account WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| user_from_row(&r)).transpose().map_err(Into::into)
    }

    pub async fn user_by_id(&self, id: i64) -> Result<Option<UserAccount>> {
        let row = sqlx::query("SELECT * FROM user_account WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| user_from_row(&r)).transpose().map_err(Into::into)
    }

    pub async fn update_password_hash(&self, user_id: i64, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE user_account SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ---- claims ------------------------------------------------------

    pub async fn add_claim(&self, user_id: i64, claim: Claim) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO user_account_claim (user_account_id, claim) VALUES (?, ?)",
        )
        .bind(user_id)
        .bind(claim.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_claim(&self, user_id: i64, claim: Claim) -> Result<()> {
        sqlx::query("DELETE FROM user_account_claim WHERE user_account_id = ? AND claim = ?")
            .bind(user_id)
            .bind(claim.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn claims_for(&self, user_id: i64) -> Result<HashSet<Claim>> {
        let rows = sqlx::query("SELECT claim FROM user_account_claim WHERE user_account_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let mut claims = HashSet::new();
        for row in rows {
            let stored: String = row.try_get("claim")?;
            match Claim::parse(&stored) {
                Some(claim) => {
                    claims.insert(claim);
                }
                None => warn!(claim = %stored, user_id, "skipping unknown stored claim"),
            }
        }
        Ok(claims)
    }

    // ---- API clients -------------------------------------------------

    pub async fn insert_client(&self, client: &ApiClient) -> Result<()> {
        sqlx::query("INSERT INTO oauth_client (client_id, secret, name) VALUES (?, ?, ?)")
            .bind(&client.client_id)
            .bind(&client.secret)
            .bind(&client.name)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if Error::is_unique_violation(&e) {
                    Error::DuplicateClientName(client.name.clone())
                } else {
                    e.into()
                }
            })?;
        Ok(())
    }

    pub async fn client_by_name(&self, name: &str) -> Result<Option<ApiClient>> {
        let row = sqlx::query("SELECT client_id, secret, name FROM oauth_client WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| client_from_row(&r)).transpose().map_err(Into::into)
    }
}

fn user_from_row(row: &SqliteRow) -> sqlx::Result<UserAccount> {
    Ok(UserAccount {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        password_hash: row.try_get("password_hash")?,
        security_question: row.try_get("security_question")?,
        security_answer_hash: row.try_get("security_answer_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

fn client_from_row(row: &SqliteRow) -> sqlx::Result<ApiClient> {
    Ok(ApiClient {
        client_id: row.try_get("client_id")?,
        secret: row.try_get("secret")?,
        name: row.try_get("name")?,
    })
}

fn session_from_row(row: &SqliteRow) -> sqlx::Result<Session> {
    let expires_at_ms: i64 = row.try_get("expires_at_ms")?;
    let expires_at = DateTime::from_timestamp_millis(expires_at_ms).ok_or_else(|| {
        sqlx::Error::Decode(format!("expiry out of range: {expires_at_ms}").into())
    })?;
    Ok(Session {
        refresh_token: row.try_get("refresh_token")?,
        client_id: row.try_get("client_id")?,
        user_id: row.try_get("user_account_id")?,
        expires_at,
    })
}

#[async_trait]
impl ClientStore for SqliteStore {
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<ApiClient>> {
        let row = sqlx::query("SELECT client_id, secret, name FROM oauth_client WHERE client_id = ?")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AuthError::store)?;
        row.map(|r| client_from_row(&r))
            .transpose()
            .map_err(AuthError::store)
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash FROM user_account WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(AuthError::store)?;

        row.map(|r| -> sqlx::Result<UserRecord> {
            Ok(UserRecord {
                id: r.try_get("id")?,
                username: r.try_get("username")?,
                password_hash: r.try_get("password_hash")?,
            })
        })
        .transpose()
        .map_err(AuthError::store)
    }

    async fn claims_of(&self, user_id: i64) -> AuthResult<HashSet<Claim>> {
        self.claims_for(user_id)
            .await
            .map_err(AuthError::store)
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn save(&self, session: Session) -> AuthResult<Session> {
        sqlx::query(
            "INSERT INTO oauth_client_session (refresh_token, client_id, user_account_id, expires_at_ms) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&session.refresh_token)
        .bind(&session.client_id)
        .bind(session.user_id)
        .bind(session.expires_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(AuthError::store)?;
        Ok(session)
    }

    async fn find_by_refresh_token(&self, refresh_token: &str) -> AuthResult<Option<Session>> {
        let row = sqlx::query("SELECT * FROM oauth_client_session WHERE refresh_token = ?")
            .bind(refresh_token)
            .fetch_optional(&self.pool)
            .await
            .map_err(AuthError::store)?;
        row.map(|r| session_from_row(&r))
            .transpose()
            .map_err(AuthError::store)
    }

    async fn delete(&self, refresh_token: &str) -> AuthResult<bool> {
        // A single DELETE is the atomic consume: of two racing rotations,
        // exactly one observes an affected row.
        let result = sqlx::query("DELETE FROM oauth_client_session WHERE refresh_token = ?")
            .bind(refresh_token)
            .execute(&self.pool)
            .await
            .map_err(AuthError::store)?;
        Ok(result.rows_affected() > 0)
    }
}
