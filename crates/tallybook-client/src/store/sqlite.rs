use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::ffi::ErrorCode;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::import::now_timestamp;
use crate::migrations::{REQUIRED_META_KEYS, REQUIRED_TABLE_NAMES, run_pending};
use crate::store::{
    CATEGORIES_KEY, CREDENTIALS_KEY, EXPENSES_KEY, FullState, SETTINGS_KEY, SUBCATEGORIES_KEY,
    StateStore, USE_CASE_KEY, USERS_KEY,
};
use crate::{ClientError, ClientResult};

const BUSY_TIMEOUT: Duration = Duration::from_millis(250);

/// String-keyed JSON values in a single SQLite table; one key per collection.
pub struct SqliteStore {
    connection: Connection,
    db_path: PathBuf,
    default_use_case: String,
}

impl SqliteStore {
    pub fn open(db_path: &Path, default_use_case: &str) -> ClientResult<Self> {
        let connection =
            Connection::open(db_path).map_err(|error| map_sqlite_error(db_path, &error))?;
        connection
            .busy_timeout(BUSY_TIMEOUT)
            .map_err(|error| map_sqlite_error(db_path, &error))?;
        Self::prepare(connection, db_path.to_path_buf(), default_use_case)
    }

    pub fn open_in_memory(default_use_case: &str) -> ClientResult<Self> {
        let db_path = PathBuf::from(":memory:");
        let connection =
            Connection::open_in_memory().map_err(|error| map_sqlite_error(&db_path, &error))?;
        Self::prepare(connection, db_path, default_use_case)
    }

    fn prepare(
        mut connection: Connection,
        db_path: PathBuf,
        default_use_case: &str,
    ) -> ClientResult<Self> {
        connection
            .query_row("PRAGMA schema_version", [], |row| row.get::<_, i64>(0))
            .map_err(|error| map_sqlite_error(&db_path, &error))?;
        run_pending(&mut connection)
            .map_err(|error| ClientError::store_failed(&db_path, &error.to_string()))?;
        info!(path = %db_path.display(), "opened data store");
        Ok(Self {
            connection,
            db_path,
            default_use_case: default_use_case.to_string(),
        })
    }

    pub fn get(&self, key: &str) -> ClientResult<Option<Value>> {
        let raw = self
            .connection
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|error| map_sqlite_error(&self.db_path, &error))?;

        raw.map(|text| {
            serde_json::from_str::<Value>(&text).map_err(|error| {
                ClientError::store_corrupt(&self.db_path, &format!("key `{key}`: {error}"))
            })
        })
        .transpose()
    }

    pub fn set(&mut self, key: &str, value: &Value) -> ClientResult<()> {
        upsert(&self.connection, &self.db_path, key, value, &now_timestamp())
    }

    /// Confirms the tables and metadata rows the store relies on are present.
    pub fn verify_schema(&self) -> ClientResult<()> {
        for table in REQUIRED_TABLE_NAMES {
            let found = self
                .connection
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    params![table],
                    |row| row.get::<_, i64>(0),
                )
                .map_err(|error| map_sqlite_error(&self.db_path, &error))?;
            if found == 0 {
                return Err(ClientError::store_corrupt(
                    &self.db_path,
                    &format!("missing table `{table}`"),
                ));
            }
        }

        for (key, _) in REQUIRED_META_KEYS {
            if self.meta(key)?.is_none() {
                return Err(ClientError::store_corrupt(
                    &self.db_path,
                    &format!("missing metadata `{key}`"),
                ));
            }
        }
        Ok(())
    }

    pub fn schema_version(&self) -> ClientResult<String> {
        Ok(self.meta("schema_version")?.unwrap_or_default())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn meta(&self, key: &str) -> ClientResult<Option<String>> {
        self.connection
            .query_row(
                "SELECT value FROM store_meta WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|error| map_sqlite_error(&self.db_path, &error))
    }

    fn read<T: DeserializeOwned>(&self, key: &str, fallback: T) -> ClientResult<T> {
        let Some(value) = self.get(key)? else {
            return Ok(fallback);
        };
        serde_json::from_value::<T>(value).map_err(|error| {
            ClientError::store_corrupt(&self.db_path, &format!("key `{key}`: {error}"))
        })
    }
}

impl StateStore for SqliteStore {
    fn get_full_state(&self) -> ClientResult<FullState> {
        Ok(FullState {
            users: self.read(USERS_KEY, Vec::new())?,
            categories: self.read(CATEGORIES_KEY, Vec::new())?,
            subcategories: self.read(SUBCATEGORIES_KEY, Vec::new())?,
            expenses: self.read(EXPENSES_KEY, Vec::new())?,
            credentials: self.read(CREDENTIALS_KEY, json!({}))?,
            settings: self.read(SETTINGS_KEY, json!({}))?,
            use_case: self.read(USE_CASE_KEY, self.default_use_case.clone())?,
        })
    }

    fn replace_full_state(&mut self, state: FullState) -> ClientResult<()> {
        let entries = [
            (USERS_KEY, Value::Array(state.users)),
            (CATEGORIES_KEY, Value::Array(state.categories)),
            (SUBCATEGORIES_KEY, Value::Array(state.subcategories)),
            (EXPENSES_KEY, Value::Array(state.expenses)),
            (CREDENTIALS_KEY, state.credentials),
            (SETTINGS_KEY, state.settings),
            (USE_CASE_KEY, Value::String(state.use_case)),
        ];

        let timestamp = now_timestamp();
        let transaction = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|error| map_sqlite_error(&self.db_path, &error))?;
        for (key, value) in &entries {
            upsert(&transaction, &self.db_path, key, value, &timestamp)?;
        }
        transaction
            .commit()
            .map_err(|error| map_sqlite_error(&self.db_path, &error))?;

        debug!(keys = entries.len(), "replaced full state");
        Ok(())
    }
}

fn upsert(
    connection: &Connection,
    db_path: &Path,
    key: &str,
    value: &Value,
    timestamp: &str,
) -> ClientResult<()> {
    connection
        .execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value.to_string(), timestamp],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}

/// Sorts SQLite failures into the store error families callers can act on.
pub(crate) fn map_sqlite_error(path: &Path, error: &rusqlite::Error) -> ClientError {
    let detail = error.to_string();
    match error.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
            ClientError::store_locked(path)
        }
        Some(ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt) => {
            ClientError::store_corrupt(path, &detail)
        }
        Some(ErrorCode::CannotOpen | ErrorCode::ReadOnly | ErrorCode::PermissionDenied) => {
            ClientError::store_unavailable(path, &detail)
        }
        _ => ClientError::store_failed(path, &detail),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use std::fs;

    use tempfile::tempdir;

    use super::SqliteStore;
    use crate::store::{FullState, StateStore};
    use crate::test_support::{sample_categories, sample_expense, sample_users};

    #[test]
    fn fresh_store_reads_as_empty_state() {
        let store = SqliteStore::open_in_memory("expenses");
        assert!(store.is_ok());
        if let Ok(opened) = store {
            let state = opened.get_full_state();
            assert_eq!(state.ok(), Some(FullState::empty("expenses")));
            assert!(opened.verify_schema().is_ok());
            assert_eq!(opened.schema_version().ok().as_deref(), Some("v1"));
        }
    }

    #[test]
    fn replaced_state_reads_back_unchanged() {
        let store = SqliteStore::open_in_memory("expenses");
        assert!(store.is_ok());
        if let Ok(mut opened) = store {
            let mut state = FullState::empty("household");
            assert!(state.append_users(&sample_users()).is_ok());
            assert!(state.append_categories(&sample_categories()).is_ok());
            assert!(state.append_expenses(&[sample_expense("e-1")]).is_ok());
            state.expenses[0]["legacyTag"] = json!("kept");
            state.credentials = json!({"1": {"hash": "abc"}});
            assert!(opened.replace_full_state(state.clone()).is_ok());
            assert_eq!(opened.get_full_state().ok(), Some(state));
        }
    }

    #[test]
    fn raw_keys_can_be_set_and_read() {
        let store = SqliteStore::open_in_memory("expenses");
        assert!(store.is_ok());
        if let Ok(mut opened) = store {
            assert!(opened.set("settings", &json!({"theme": "dark"})).is_ok());
            let value = opened.get("settings");
            assert_eq!(value.ok().flatten(), Some(json!({"theme": "dark"})));
            assert_eq!(opened.get("missing").ok().flatten(), None);
        }
    }

    #[test]
    fn file_that_is_not_a_database_reads_as_corrupt() {
        let dir = tempdir();
        assert!(dir.is_ok());
        if let Ok(dir) = dir {
            let path = dir.path().join("tallybook.db");
            assert!(fs::write(&path, "this is plain text, not sqlite pages").is_ok());
            let store = SqliteStore::open(&path, "expenses");
            assert!(store.is_err());
            if let Err(error) = store {
                assert_eq!(error.code, "store_corrupt");
            }
        }
    }
}
