//! Key/value storage with `local` and `session` scopes.

use crate::db::pool::DbPool;
use crate::error::AppError;
use std::time::{SystemTime, UNIX_EPOCH};

/// Local key: preferred UI language (`fi-FI` or `en-US`).
pub const LANGUAGE_KEY: &str = "language";

/// Local key: route to return to after a successful login.
pub const REDIRECT_URL_KEY: &str = "REDIRECT_URL";

/// Local key: the user declined data consent (`"true"` when set).
pub const NO_DATA_CONSENT_KEY: &str = "NO_DATA_CONSENT";

/// Session key: whether the application runs embedded in a frame.
pub const IN_IFRAME_KEY: &str = "IN-IFRAME";

/// Which storage area an item lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageScope {
    /// Survives restarts.
    Local,
    /// Cleared whenever the database is initialized.
    Session,
}

impl StorageScope {
    fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Session => "session",
        }
    }
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Storage handle shared by services and views.
#[derive(Debug, Clone)]
pub struct BrowserStorage {
    pool: DbPool,
}

impl BrowserStorage {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Read an item, `None` when the key is unset.
    pub async fn get_item(&self, scope: StorageScope, key: &str) -> Result<Option<String>, AppError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM storage_items WHERE scope = ? AND key = ?")
                .bind(scope.as_str())
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Insert or replace an item.
    pub async fn set_item(&self, scope: StorageScope, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO storage_items (scope, key, value, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(scope, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(scope.as_str())
        .bind(key)
        .bind(value)
        .bind(now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::storage_with_op(e.to_string(), "set_item"))?;

        Ok(())
    }

    /// Remove an item. Removing a missing key is not an error.
    pub async fn remove_item(&self, scope: StorageScope, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM storage_items WHERE scope = ? AND key = ?")
            .bind(scope.as_str())
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Read a `"true"`/`"false"` flag; anything else reads as `false`.
    pub async fn get_flag(&self, scope: StorageScope, key: &str) -> Result<bool, AppError> {
        Ok(self.get_item(scope, key).await?.as_deref() == Some("true"))
    }

    /// Shortcut for `Local` items.
    pub async fn local(&self, key: &str) -> Result<Option<String>, AppError> {
        self.get_item(StorageScope::Local, key).await
    }

    /// Shortcut for writing `Local` items.
    pub async fn set_local(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.set_item(StorageScope::Local, key, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_scopes_are_separate() {
        let dir = tempdir().unwrap();
        let pool = db::initialize(&db::get_db_path(dir.path())).await.unwrap();
        let storage = BrowserStorage::new(pool);

        storage.set_local(LANGUAGE_KEY, "en-US").await.unwrap();
        assert_eq!(storage.local(LANGUAGE_KEY).await.unwrap().as_deref(), Some("en-US"));
        assert_eq!(
            storage.get_item(StorageScope::Session, LANGUAGE_KEY).await.unwrap(),
            None
        );

        storage.set_local(LANGUAGE_KEY, "fi-FI").await.unwrap();
        assert_eq!(storage.local(LANGUAGE_KEY).await.unwrap().as_deref(), Some("fi-FI"));

        storage.remove_item(StorageScope::Local, LANGUAGE_KEY).await.unwrap();
        assert_eq!(storage.local(LANGUAGE_KEY).await.unwrap(), None);
        // Removing twice is fine
        storage.remove_item(StorageScope::Local, LANGUAGE_KEY).await.unwrap();
    }

    #[tokio::test]
    async fn test_session_scope_cleared_on_restart() {
        let dir = tempdir().unwrap();
        let db_path = db::get_db_path(dir.path());

        {
            let storage = BrowserStorage::new(db::initialize(&db_path).await.unwrap());
            storage
                .set_item(StorageScope::Session, IN_IFRAME_KEY, "true")
                .await
                .unwrap();
            storage.set_local(NO_DATA_CONSENT_KEY, "true").await.unwrap();
            assert!(storage.get_flag(StorageScope::Session, IN_IFRAME_KEY).await.unwrap());
        }

        let storage = BrowserStorage::new(db::initialize(&db_path).await.unwrap());
        assert!(!storage.get_flag(StorageScope::Session, IN_IFRAME_KEY).await.unwrap());
        assert!(storage.get_flag(StorageScope::Local, NO_DATA_CONSENT_KEY).await.unwrap());
    }
}
