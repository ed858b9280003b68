use std::fmt;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Expenses,
    Spreadsheet,
    Categories,
    Users,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expenses => "expenses",
            Self::Spreadsheet => "spreadsheet",
            Self::Categories => "categories",
            Self::Users => "users",
        }
    }
}

/// A failure scoped to one input row. Never stops the rest of the batch.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct RowError {
    pub row: i64,
    pub reason: String,
}

impl RowError {
    pub fn new(row: i64, reason: impl Into<String>) -> Self {
        Self {
            row,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.reason)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ImportSummary {
    pub rows_read: i64,
    pub rows_valid: i64,
    pub rows_invalid: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportOutcome<T> {
    pub accepted: Vec<T>,
    pub errors: Vec<RowError>,
    pub summary: ImportSummary,
}

impl<T> ImportOutcome<T> {
    pub(crate) fn new(rows_read: usize, accepted: Vec<T>, errors: Vec<RowError>) -> Self {
        let rows_invalid = errors
            .iter()
            .map(|error| error.row)
            .collect::<std::collections::HashSet<i64>>()
            .len() as i64;
        Self {
            summary: ImportSummary {
                rows_read: rows_read as i64,
                rows_valid: rows_read as i64 - rows_invalid,
                rows_invalid,
            },
            accepted,
            errors,
        }
    }

    /// Errors rendered as `Row {n}: {reason}`.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportData {
    pub kind: ImportKind,
    pub policy: Option<String>,
    pub message: String,
    pub summary: ImportSummary,
    pub accepted: Value,
    pub errors: Vec<String>,
    pub row_errors: Vec<RowError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitSummary {
    pub users_added: i64,
    pub categories_added: i64,
    pub subcategories_added: i64,
    pub expenses_added: i64,
    pub skipped_existing: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitData {
    pub message: String,
    pub summary: CommitSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateData {
    pub kind: ImportKind,
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpenseExportData {
    pub file_name: String,
    pub rows: i64,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupExportData {
    pub format: String,
    pub file_name: String,
    pub version: String,
    pub timestamp: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreSummary {
    pub users: i64,
    pub categories: i64,
    pub subcategories: i64,
    pub expenses: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreData {
    pub message: String,
    pub version: String,
    pub backup_timestamp: String,
    pub deep_validated: bool,
    pub summary: RestoreSummary,
}
