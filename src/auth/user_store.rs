//! User Storage
//! Mission: Securely store and manage user accounts with SQLite

use crate::auth::models::{Role, User};
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{info, warn};
use uuid::Uuid;

/// Confirmation links stay valid for a day.
const CONFIRMATION_TOKEN_HOURS: i64 = 24;

lazy_static! {
    // Hash verified against when a login targets an unknown email, so the
    // missing-user path costs the same as a real password check.
    static ref DUMMY_HASH: String =
        hash("logitrack-dummy-password", DEFAULT_COST).unwrap_or_default();
}

/// Outcome of an email-confirmation attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Flag is set (or was already set; confirmation is safe to retry).
    Confirmed,
    UserNotFound,
    /// Wrong value or expired token.
    InvalidToken,
}

/// User and role storage with SQLite backend
pub struct UserStore {
    db_path: String,
}

impl UserStore {
    /// Create a new user store and initialize the schema
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn conn(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(conn)
    }

    fn init_db(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                email_confirmed INTEGER NOT NULL DEFAULT 0,
                confirmation_token TEXT,
                confirmation_expires_at TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS roles (
                name TEXT PRIMARY KEY
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS user_roles (
                user_id TEXT NOT NULL REFERENCES users(id),
                role TEXT NOT NULL REFERENCES roles(name),
                PRIMARY KEY (user_id, role)
            )",
            [],
        )?;

        Ok(())
    }

    fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            email: row.get(1)?,
            password_hash: row.get(2)?,
            email_confirmed: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    /// Create a new user with the email-confirmed flag off.
    /// Fails on duplicate email (UNIQUE constraint).
    pub fn create_user(&self, email: &str, password: &str) -> Result<User> {
        let password_hash = hash(password, DEFAULT_COST).context("Failed to hash password")?;

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash,
            email_confirmed: false,
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (id, email, password_hash, email_confirmed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id.to_string(),
                user.email,
                user.password_hash,
                user.email_confirmed,
                user.created_at,
            ],
        )
        .context("Failed to insert user")?;

        info!("✅ Created user: {}", user.email);

        Ok(user)
    }

    /// Get user by email
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, email, password_hash, email_confirmed, created_at
             FROM users WHERE email = ?1",
        )?;

        stmt.query_row(params![email], Self::row_to_user)
            .optional()
            .map_err(Into::into)
    }

    /// Get user by id
    pub fn find_by_id(&self, user_id: &Uuid) -> Result<Option<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, email, password_hash, email_confirmed, created_at
             FROM users WHERE id = ?1",
        )?;

        stmt.query_row(params![user_id.to_string()], Self::row_to_user)
            .optional()
            .map_err(Into::into)
    }

    /// Verify email and password.
    ///
    /// When the email is unknown, a dummy bcrypt verification still runs
    /// so the response time does not reveal whether the account exists.
    pub fn verify_password(&self, email: &str, password: &str) -> Result<bool> {
        match self.find_by_email(email)? {
            Some(user) => {
                let valid =
                    verify(password, &user.password_hash).context("Failed to verify password")?;
                Ok(valid)
            }
            None => {
                let _ = verify(password, &DUMMY_HASH);
                Ok(false)
            }
        }
    }

    /// Create the role if it does not exist yet
    pub fn ensure_role(&self, role: Role) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO roles (name) VALUES (?1)",
            params![role.as_str()],
        )?;
        Ok(())
    }

    /// Grant a role to a user (idempotent)
    pub fn add_role(&self, user_id: &Uuid, role: Role) -> Result<()> {
        self.ensure_role(role)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?1, ?2)",
            params![user_id.to_string(), role.as_str()],
        )
        .context("Failed to grant role")?;
        Ok(())
    }

    /// Role names held by a user
    pub fn get_roles(&self, user_id: &Uuid) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT role FROM user_roles WHERE user_id = ?1 ORDER BY role")?;
        let roles = stmt
            .query_map(params![user_id.to_string()], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(roles)
    }

    /// Whether any account holds the given role. Used by startup seeding.
    pub fn any_user_with_role(&self, role: Role) -> Result<bool> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM user_roles WHERE role = ?1",
            params![role.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Flip the email-confirmed flag on. One-way transition.
    pub fn mark_email_confirmed(&self, user_id: &Uuid) -> Result<()> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE users SET email_confirmed = 1 WHERE id = ?1",
            params![user_id.to_string()],
        )?;
        if rows == 0 {
            anyhow::bail!("User not found");
        }
        Ok(())
    }

    /// Issue a fresh, time-bounded confirmation token for a user.
    ///
    /// The token is kept on the user row until it expires, so a retried
    /// confirmation link keeps working (confirmation is idempotent).
    pub fn issue_confirmation_token(&self, user_id: &Uuid) -> Result<String> {
        let token: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();
        let expires_at = Utc::now() + chrono::Duration::hours(CONFIRMATION_TOKEN_HOURS);

        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE users SET confirmation_token = ?1, confirmation_expires_at = ?2 WHERE id = ?3",
            params![token, expires_at.to_rfc3339(), user_id.to_string()],
        )?;
        if rows == 0 {
            anyhow::bail!("User not found");
        }

        Ok(token)
    }

    /// Validate a confirmation token and mark the user's email confirmed.
    pub fn confirm_email(&self, user_id: &Uuid, token: &str) -> Result<ConfirmOutcome> {
        let conn = self.conn()?;

        let stored: Option<(Option<String>, Option<String>)> = conn
            .query_row(
                "SELECT confirmation_token, confirmation_expires_at FROM users WHERE id = ?1",
                params![user_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((stored_token, expires_at)) = stored else {
            return Ok(ConfirmOutcome::UserNotFound);
        };

        let (Some(stored_token), Some(expires_at)) = (stored_token, expires_at) else {
            warn!("Confirmation attempt for user {} without issued token", user_id);
            return Ok(ConfirmOutcome::InvalidToken);
        };

        if stored_token != token {
            warn!("Confirmation token mismatch for user {}", user_id);
            return Ok(ConfirmOutcome::InvalidToken);
        }

        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .map(|d| d.with_timezone(&Utc))
            .context("Corrupt confirmation expiry")?;
        if Utc::now() > expires_at {
            warn!("Expired confirmation token for user {}", user_id);
            return Ok(ConfirmOutcome::InvalidToken);
        }

        self.mark_email_confirmed(user_id)?;
        Ok(ConfirmOutcome::Confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (UserStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let store = UserStore::new(db_path).unwrap();
        (store, temp_file)
    }

    #[test]
    fn test_create_and_retrieve_user() {
        let (store, _temp) = create_test_store();

        let user = store.create_user("samir@example.com", "Password1!").unwrap();
        assert!(!user.email_confirmed);

        let retrieved = store.find_by_email("samir@example.com").unwrap().unwrap();
        assert_eq!(retrieved.id, user.id);
        assert_eq!(retrieved.email, "samir@example.com");

        let by_id = store.find_by_id(&user.id).unwrap().unwrap();
        assert_eq!(by_id.email, "samir@example.com");
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let (store, _temp) = create_test_store();

        store.create_user("samir@example.com", "Password1!").unwrap();
        assert!(store.create_user("samir@example.com", "Other1!aa").is_err());
    }

    #[test]
    fn test_password_verification() {
        let (store, _temp) = create_test_store();
        store.create_user("samir@example.com", "Password1!").unwrap();

        assert!(store.verify_password("samir@example.com", "Password1!").unwrap());
        assert!(!store.verify_password("samir@example.com", "wrong").unwrap());
        assert!(!store.verify_password("nobody@example.com", "Password1!").unwrap());
    }

    #[test]
    fn test_roles_granted_and_listed() {
        let (store, _temp) = create_test_store();
        let user = store.create_user("samir@example.com", "Password1!").unwrap();

        store.add_role(&user.id, Role::User).unwrap();
        store.add_role(&user.id, Role::Manager).unwrap();
        // Granting twice is a no-op
        store.add_role(&user.id, Role::Manager).unwrap();

        let roles = store.get_roles(&user.id).unwrap();
        assert_eq!(roles, vec!["Manager".to_string(), "User".to_string()]);

        assert!(store.any_user_with_role(Role::Manager).unwrap());
    }

    #[test]
    fn test_confirmation_happy_path() {
        let (store, _temp) = create_test_store();
        let user = store.create_user("samir@example.com", "Password1!").unwrap();
        let token = store.issue_confirmation_token(&user.id).unwrap();

        let outcome = store.confirm_email(&user.id, &token).unwrap();
        assert_eq!(outcome, ConfirmOutcome::Confirmed);
        assert!(store.find_by_id(&user.id).unwrap().unwrap().email_confirmed);
    }

    #[test]
    fn test_confirmation_is_idempotent() {
        let (store, _temp) = create_test_store();
        let user = store.create_user("samir@example.com", "Password1!").unwrap();
        let token = store.issue_confirmation_token(&user.id).unwrap();

        assert_eq!(store.confirm_email(&user.id, &token).unwrap(), ConfirmOutcome::Confirmed);
        // Re-clicking the same link reports success, not an error
        assert_eq!(store.confirm_email(&user.id, &token).unwrap(), ConfirmOutcome::Confirmed);
    }

    #[test]
    fn test_confirmation_rejects_wrong_token() {
        let (store, _temp) = create_test_store();
        let user = store.create_user("samir@example.com", "Password1!").unwrap();
        store.issue_confirmation_token(&user.id).unwrap();

        let outcome = store.confirm_email(&user.id, "not-the-token").unwrap();
        assert_eq!(outcome, ConfirmOutcome::InvalidToken);
        assert!(!store.find_by_id(&user.id).unwrap().unwrap().email_confirmed);
    }

    #[test]
    fn test_confirmation_unknown_user() {
        let (store, _temp) = create_test_store();
        let outcome = store.confirm_email(&Uuid::new_v4(), "whatever").unwrap();
        assert_eq!(outcome, ConfirmOutcome::UserNotFound);
    }

    #[test]
    fn test_confirmation_without_issued_token() {
        let (store, _temp) = create_test_store();
        let user = store.create_user("samir@example.com", "Password1!").unwrap();

        let outcome = store.confirm_email(&user.id, "anything").unwrap();
        assert_eq!(outcome, ConfirmOutcome::InvalidToken);
    }
}
