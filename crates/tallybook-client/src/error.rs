use std::path::Path;

use serde_json::{Value, json};
use thiserror::Error;

use crate::contracts::types::ImportKind;

pub(crate) const BACKUP_HELP_SECTION_TITLE: &str = "Backup & Restore";
pub(crate) const IMPORT_HELP_SECTION_TITLE: &str = "Import Troubleshooting";

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
    pub data: Option<Value>,
}

impl ClientError {
    pub fn new(code: &str, message: &str, recovery_steps: Vec<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            recovery_steps,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    fn with_help_section(self, section: &str, data: Value) -> Self {
        self.with_data(merge_help_data(data, section))
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::new(
            "invalid_argument",
            message,
            vec!["Check the values passed to this operation and retry.".to_string()],
        )
    }

    /// The input text as a whole cannot be imported. Nothing was validated.
    pub fn format_error(kind: ImportKind, message: &str) -> Self {
        Self::new(
            "format_error",
            message,
            vec![
                "Make sure the first line is a header row followed by at least one data row."
                    .to_string(),
                format!(
                    "Download the {} template to compare the expected layout.",
                    kind.as_str()
                ),
            ],
        )
        .with_help_section(
            IMPORT_HELP_SECTION_TITLE,
            json!({
                "import_kind": kind.as_str(),
            }),
        )
    }

    pub fn missing_columns(kind: ImportKind, missing: Vec<String>, actual: Vec<String>) -> Self {
        Self::new(
            "format_error",
            &format!("Missing required columns: {}", missing.join(", ")),
            vec![
                "Add the missing columns to the header row; column names are not case-sensitive."
                    .to_string(),
                format!(
                    "Download the {} template to compare the expected layout.",
                    kind.as_str()
                ),
            ],
        )
        .with_help_section(
            IMPORT_HELP_SECTION_TITLE,
            json!({
                "import_kind": kind.as_str(),
                "missing_columns": missing,
                "actual_columns": actual,
            }),
        )
    }

    pub fn spreadsheet_unreadable(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "format_error",
            &format!("Could not read spreadsheet `{location}`: {detail}"),
            vec![
                "Save the workbook as .xlsx and make sure the first sheet holds the expenses."
                    .to_string(),
            ],
        )
        .with_help_section(
            IMPORT_HELP_SECTION_TITLE,
            json!({
                "import_kind": ImportKind::Spreadsheet.as_str(),
                "path": location,
            }),
        )
    }

    pub fn restore_error(message: &str) -> Self {
        Self::new(
            "restore_error",
            message,
            vec![
                "Select a .json file created by the backup export.".to_string(),
                "Your current data was not changed.".to_string(),
            ],
        )
        .with_help_section(BACKUP_HELP_SECTION_TITLE, json!({}))
    }

    pub fn restore_integrity(issues: Vec<String>) -> Self {
        let count = issues.len();
        Self::restore_error(&format!(
            "Backup failed integrity checks: {count} problems found. Nothing was restored."
        ))
        .with_help_section(
            BACKUP_HELP_SECTION_TITLE,
            json!({
                "issues": issues,
            }),
        )
    }

    pub fn internal_serialization(message: &str) -> Self {
        Self::new("internal_serialization_error", message, Vec::new())
    }

    pub fn config_invalid(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "config_invalid",
            &format!("Configuration at `{location}` could not be loaded: {detail}"),
            vec![format!(
                "Fix or remove `{location}`; defaults apply when the file is absent."
            )],
        )
    }

    pub fn store_unavailable(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "store_unavailable",
            &format!("Cannot open data store at `{location}`: {detail}"),
            vec![format!(
                "Grant write access to `{location}` or set `TALLYBOOK_HOME` to a writable directory."
            )],
        )
    }

    pub fn store_locked(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "store_locked",
            &format!("Data store is locked at `{location}`."),
            vec![format!(
                "Close other processes using `{location}` so the lock is released."
            )],
        )
    }

    pub fn store_corrupt(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "store_corrupt",
            &format!("Data store appears corrupt at `{location}`: {detail}"),
            vec!["Restore the data from a backup file.".to_string()],
        )
    }

    pub fn store_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "store_failed",
            &format!("Data store operation failed at `{location}`: {detail}"),
            Vec::new(),
        )
    }
}

fn merge_help_data(mut data: Value, section: &str) -> Value {
    if !data.is_object() {
        data = json!({});
    }

    if let Some(object) = data.as_object_mut() {
        object.insert(
            "help_section_title".to_string(),
            Value::String(section.to_string()),
        );
    }

    data
}

pub type ClientResult<T> = Result<T, ClientError>;
