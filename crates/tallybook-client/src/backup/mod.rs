pub(crate) mod integrity;
pub(crate) mod report;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::import::now_timestamp;
use crate::store::{FullState, StateStore};
use crate::{ClientError, ClientResult};

pub use integrity::check_integrity;
pub use report::render_text;

pub const BACKUP_FORMAT_VERSION: &str = "1.0.0";

const REQUIRED_ARRAYS: [&str; 3] = ["users", "categories", "expenses"];
const REQUIRED_PRESENT: [&str; 3] = ["credentials", "settings", "useCase"];

/// A complete snapshot of persisted state. Field order is the serialized key order.
///
/// Records are carried as written; only deep validation reads them as entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub version: String,
    pub timestamp: String,
    pub users: Vec<Value>,
    pub categories: Vec<Value>,
    pub subcategories: Vec<Value>,
    pub expenses: Vec<Value>,
    pub credentials: Value,
    pub settings: Value,
    pub use_case: String,
}

impl BackupDocument {
    pub fn from_state(state: FullState, timestamp: &str) -> Self {
        Self {
            version: BACKUP_FORMAT_VERSION.to_string(),
            timestamp: timestamp.to_string(),
            users: state.users,
            categories: state.categories,
            subcategories: state.subcategories,
            expenses: state.expenses,
            credentials: state.credentials,
            settings: state.settings,
            use_case: state.use_case,
        }
    }

    pub fn into_state(self) -> FullState {
        FullState {
            users: self.users,
            categories: self.categories,
            subcategories: self.subcategories,
            expenses: self.expenses,
            credentials: self.credentials,
            settings: self.settings,
            use_case: self.use_case,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct RestoreOptions {
    /// Also check ids and cross-references before anything is written.
    pub deep_validate: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestoreReport {
    pub version: String,
    pub timestamp: String,
    pub users: usize,
    pub categories: usize,
    pub subcategories: usize,
    pub expenses: usize,
    pub deep_validated: bool,
}

pub fn create_snapshot<S: StateStore + ?Sized>(store: &S) -> ClientResult<BackupDocument> {
    let state = store.get_full_state()?;
    let document = BackupDocument::from_state(state, &now_timestamp());
    info!(
        users = document.users.len(),
        categories = document.categories.len(),
        expenses = document.expenses.len(),
        "created backup snapshot"
    );
    Ok(document)
}

/// Pretty JSON with two-space indentation.
pub fn serialize(document: &BackupDocument) -> ClientResult<String> {
    serde_json::to_string_pretty(document)
        .map_err(|error| ClientError::internal_serialization(&error.to_string()))
}

/// Shallow gate: object shape only, never individual records.
pub fn validate_structure(candidate: &Value) -> bool {
    structure_problem(candidate).is_none()
}

fn structure_problem(candidate: &Value) -> Option<String> {
    let Some(object) = candidate.as_object() else {
        return Some("Backup must be a JSON object.".to_string());
    };

    for key in ["version", "timestamp"] {
        let present = object
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|text| !text.trim().is_empty());
        if !present {
            return Some(format!("Backup is missing `{key}`."));
        }
    }

    for key in REQUIRED_ARRAYS {
        if !object.get(key).is_some_and(Value::is_array) {
            return Some(format!("Backup is missing the `{key}` array."));
        }
    }

    if object
        .get("subcategories")
        .is_some_and(|value| !value.is_array())
    {
        return Some("Backup field `subcategories` must be an array.".to_string());
    }

    REQUIRED_PRESENT
        .iter()
        .find(|key| !object.contains_key(**key))
        .map(|key| format!("Backup is missing `{key}`."))
}

/// Parses backup text into a document, applying the structural gate.
pub fn parse_backup(text: &str) -> ClientResult<BackupDocument> {
    let candidate = serde_json::from_str::<Value>(text).map_err(|error| {
        ClientError::restore_error(&format!("Backup is not valid JSON: {error}"))
    })?;
    read_document(&candidate)
}

fn read_document(candidate: &Value) -> ClientResult<BackupDocument> {
    if let Some(problem) = structure_problem(candidate) {
        return Err(ClientError::restore_error(&problem));
    }
    let Some(object) = candidate.as_object() else {
        return Err(ClientError::restore_error("Backup must be a JSON object."));
    };

    Ok(BackupDocument {
        version: text_field(object, "version"),
        timestamp: text_field(object, "timestamp"),
        users: records(object, "users"),
        categories: records(object, "categories"),
        subcategories: records(object, "subcategories"),
        expenses: records(object, "expenses"),
        credentials: object.get("credentials").cloned().unwrap_or(Value::Null),
        settings: object.get("settings").cloned().unwrap_or(Value::Null),
        use_case: text_field(object, "useCase"),
    })
}

fn text_field(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn records(object: &Map<String, Value>, key: &str) -> Vec<Value> {
    object
        .get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Replaces the whole persisted state with `candidate`. Nothing is written unless every
/// check passes.
pub fn restore<S: StateStore + ?Sized>(
    store: &mut S,
    candidate: &Value,
    options: RestoreOptions,
) -> ClientResult<RestoreReport> {
    let document = read_document(candidate)
        .inspect_err(|error| warn!(reason = error.message.as_str(), "refused backup restore"))?;
    restore_document(store, document, options)
}

pub fn restore_text<S: StateStore + ?Sized>(
    store: &mut S,
    text: &str,
    options: RestoreOptions,
) -> ClientResult<RestoreReport> {
    let document = parse_backup(text)
        .inspect_err(|error| warn!(reason = error.message.as_str(), "refused backup restore"))?;
    restore_document(store, document, options)
}

fn restore_document<S: StateStore + ?Sized>(
    store: &mut S,
    document: BackupDocument,
    options: RestoreOptions,
) -> ClientResult<RestoreReport> {
    if options.deep_validate {
        let issues = check_integrity(&document);
        if !issues.is_empty() {
            warn!(issues = issues.len(), "backup failed integrity checks");
            return Err(ClientError::restore_integrity(issues));
        }
    }

    let report = RestoreReport {
        version: document.version.clone(),
        timestamp: document.timestamp.clone(),
        users: document.users.len(),
        categories: document.categories.len(),
        subcategories: document.subcategories.len(),
        expenses: document.expenses.len(),
        deep_validated: options.deep_validate,
    };
    store.replace_full_state(document.into_state())?;
    info!(
        version = report.version.as_str(),
        expenses = report.expenses,
        "restored backup"
    );
    Ok(report)
}
