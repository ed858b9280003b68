use std::path::Path;

use crate::backup::{self, BackupDocument, RestoreOptions, render_text};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{BackupExportData, RestoreData, RestoreSummary};
use crate::setup::ensure_initialized_with_home_override;
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum BackupFormat {
    #[default]
    Json,
    /// Human-readable report; cannot be restored.
    Text,
}

impl BackupFormat {
    pub fn parse(value: &str) -> ClientResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            other => Err(ClientError::invalid_argument(&format!(
                "Unknown backup format `{other}`; use `json` or `text`."
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "txt",
        }
    }
}

#[derive(Debug, Default)]
pub struct BackupExportOptions<'a> {
    pub format: BackupFormat,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct BackupRestoreOptions<'a> {
    pub content: String,
    /// Overrides `[restore] deep_validate` from the configuration when set.
    pub deep_validate: Option<bool>,
    pub home_override: Option<&'a Path>,
}

pub fn export(format: BackupFormat) -> ClientResult<SuccessEnvelope> {
    export_with_options(BackupExportOptions {
        format,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn export_with_options(options: BackupExportOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = ensure_initialized_with_home_override(options.home_override)?;
    let document = backup::create_snapshot(&setup.store)?;
    let content = match options.format {
        BackupFormat::Json => backup::serialize(&document)?,
        BackupFormat::Text => render_text(&document),
    };

    let data = BackupExportData {
        format: options.format.as_str().to_string(),
        file_name: backup_file_name(&document, options.format),
        version: document.version,
        timestamp: document.timestamp,
        content,
    };
    success("backup export", data)
}

fn backup_file_name(document: &BackupDocument, format: BackupFormat) -> String {
    let day = document.timestamp.get(..10).unwrap_or(&document.timestamp);
    format!("expense-backup-{day}.{}", format.extension())
}

pub fn restore(content: String) -> ClientResult<SuccessEnvelope> {
    restore_with_options(BackupRestoreOptions {
        content,
        deep_validate: None,
        home_override: None,
    })
}

/// Replaces all stored data with the backup in `content`. On any error the store is left
/// exactly as it was.
#[doc(hidden)]
pub fn restore_with_options(options: BackupRestoreOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let mut setup = ensure_initialized_with_home_override(options.home_override)?;
    let deep_validate = options
        .deep_validate
        .unwrap_or(setup.config.restore.deep_validate);
    let report = backup::restore_text(
        &mut setup.store,
        &options.content,
        RestoreOptions { deep_validate },
    )?;

    let data = RestoreData {
        message: format!(
            "Restored {} users, {} categories and {} expenses from the backup of {}.",
            report.users, report.categories, report.expenses, report.timestamp
        ),
        version: report.version,
        backup_timestamp: report.timestamp,
        deep_validated: report.deep_validated,
        summary: RestoreSummary {
            users: report.users as i64,
            categories: report.categories as i64,
            subcategories: report.subcategories as i64,
            expenses: report.expenses as i64,
        },
    };
    success("backup restore", data)
}

#[cfg(test)]
mod tests {
    use super::BackupFormat;

    #[test]
    fn formats_parse_case_insensitively() {
        assert_eq!(BackupFormat::parse("JSON").ok(), Some(BackupFormat::Json));
        assert_eq!(BackupFormat::parse(" txt ").ok(), Some(BackupFormat::Text));
        let unknown = BackupFormat::parse("xml");
        assert!(unknown.is_err());
        if let Err(error) = unknown {
            assert_eq!(error.code, "invalid_argument");
        }
    }
}
