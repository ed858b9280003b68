use std::collections::HashMap;

use tracing::debug;

use crate::contracts::types::{ImportKind, RowError};
use crate::import::fields::split_fields;
use crate::{ClientError, ClientResult};

/// Column names one import kind understands. Matching is case-insensitive.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ColumnSpec {
    pub(crate) kind: ImportKind,
    pub(crate) required: &'static [&'static str],
    pub(crate) optional: &'static [&'static str],
}

impl ColumnSpec {
    pub(crate) fn all(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.required.iter().chain(self.optional.iter()).copied()
    }
}

/// Decoded but unvalidated values of one data row, keyed by canonical column name.
#[derive(Debug, Clone)]
pub(crate) struct RawRecord {
    pub(crate) row: i64,
    values: HashMap<&'static str, String>,
}

impl RawRecord {
    pub(crate) fn new(row: i64, values: HashMap<&'static str, String>) -> Self {
        Self { row, values }
    }

    /// Trimmed value, empty when the column is absent.
    pub(crate) fn get(&self, column: &str) -> &str {
        self.values
            .get(column)
            .map(|value| value.trim())
            .unwrap_or_default()
    }

    pub(crate) fn optional(&self, column: &str) -> Option<String> {
        let value = self.get(column);
        if value.is_empty() {
            return None;
        }
        Some(value.to_string())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct DecodedTable {
    pub(crate) rows: Vec<RawRecord>,
    pub(crate) errors: Vec<RowError>,
}

impl DecodedTable {
    pub(crate) fn rows_read(&self) -> usize {
        self.rows.len() + self.errors.len()
    }
}

pub(crate) fn decode(content: &str, spec: &ColumnSpec) -> ClientResult<DecodedTable> {
    let lines = content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect::<Vec<&str>>();
    let non_empty = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .count();

    if non_empty == 0 {
        return Err(ClientError::format_error(spec.kind, "The file is empty."));
    }
    if non_empty < 2 {
        return Err(ClientError::format_error(
            spec.kind,
            "The file must contain a header row and at least one data row.",
        ));
    }

    let Some(header_index) = lines.iter().position(|line| !line.trim().is_empty()) else {
        return Err(ClientError::format_error(spec.kind, "The file is empty."));
    };
    let header = split_fields(lines[header_index]);
    let positions = match_columns(&header, spec)?;

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    for (index, line) in lines.iter().enumerate().skip(header_index + 1) {
        if line.trim().is_empty() {
            continue;
        }

        let row = (index as i64) + 1;
        let fields = split_fields(line);
        if fields.len() < header.len() {
            errors.push(RowError::new(
                row,
                format!(
                    "Expected {} columns but found {}",
                    header.len(),
                    fields.len()
                ),
            ));
            continue;
        }

        let values = positions
            .iter()
            .map(|(column, position)| (*column, fields[*position].clone()))
            .collect::<HashMap<&'static str, String>>();
        rows.push(RawRecord::new(row, values));
    }

    debug!(
        kind = spec.kind.as_str(),
        rows = rows.len(),
        malformed = errors.len(),
        "decoded delimited text"
    );

    Ok(DecodedTable { rows, errors })
}

/// Maps each known column to its header position, failing once with every missing
/// required column.
pub(crate) fn match_columns(
    header: &[String],
    spec: &ColumnSpec,
) -> ClientResult<Vec<(&'static str, usize)>> {
    let mut positions = Vec::new();
    let mut missing = Vec::new();

    for column in spec.all() {
        let position = header
            .iter()
            .position(|cell| cell.trim().eq_ignore_ascii_case(column));
        match position {
            Some(index) => positions.push((column, index)),
            None if spec.required.contains(&column) => missing.push(column.to_string()),
            None => {}
        }
    }

    if !missing.is_empty() {
        return Err(ClientError::missing_columns(
            spec.kind,
            missing,
            header.iter().map(|cell| cell.trim().to_string()).collect(),
        ));
    }

    Ok(positions)
}
