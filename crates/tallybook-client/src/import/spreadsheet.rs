use std::collections::{BTreeSet, HashMap};
#[cfg(feature = "spreadsheet")]
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::contracts::types::{ImportKind, ImportOutcome, RowError};
use crate::import::expenses::{EXPENSE_SHEET, ExpenseImportPolicy, validate_expense_rows};
use crate::import::tabular::{DecodedTable, RawRecord, match_columns};
use crate::model::{Category, Expense, User};
use crate::{ClientError, ClientResult};

/// Strict import of spreadsheet rows given as a JSON array of objects keyed by header name.
/// Rows are numbered as sheet lines, so the first object is row 2.
pub fn import_expenses_sheet_json(
    content: &str,
    users: &[User],
    categories: &[Category],
) -> ClientResult<ImportOutcome<Expense>> {
    let table = decode_sheet_json(content)?;
    Ok(validate_expense_rows(
        table,
        users,
        categories,
        ExpenseImportPolicy::Strict,
    ))
}

/// Strict import of the first worksheet of an `.xlsx`, `.xls` or `.ods` workbook.
#[cfg(feature = "spreadsheet")]
pub fn import_expenses_workbook(
    path: &Path,
    users: &[User],
    categories: &[Category],
) -> ClientResult<ImportOutcome<Expense>> {
    let table = decode_workbook(path)?;
    Ok(validate_expense_rows(
        table,
        users,
        categories,
        ExpenseImportPolicy::Strict,
    ))
}

pub(crate) fn decode_sheet_json(content: &str) -> ClientResult<DecodedTable> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ClientError::format_error(
            ImportKind::Spreadsheet,
            "The spreadsheet is empty.",
        ));
    }

    let parsed = serde_json::from_str::<Value>(trimmed).map_err(|_| {
        ClientError::format_error(
            ImportKind::Spreadsheet,
            "Spreadsheet rows must be valid JSON.",
        )
    })?;
    let Some(items) = parsed.as_array() else {
        return Err(ClientError::format_error(
            ImportKind::Spreadsheet,
            "Spreadsheet rows must be a JSON array of row objects.",
        ));
    };
    if items.is_empty() {
        return Err(ClientError::format_error(
            ImportKind::Spreadsheet,
            "The spreadsheet must contain a header row and at least one data row.",
        ));
    }

    // converters drop empty cells, so the header is the union of keys seen on any row
    let mut header_set = BTreeSet::new();
    for object in items.iter().filter_map(Value::as_object) {
        header_set.extend(object.keys().cloned());
    }
    let header = header_set.into_iter().collect::<Vec<String>>();
    let positions = match_columns(&header, &EXPENSE_SHEET)?;

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let row = (index as i64) + 2;
        let Some(object) = item.as_object() else {
            errors.push(RowError::new(row, "Row must be an object of column values"));
            continue;
        };
        let values = positions
            .iter()
            .map(|(column, _)| (*column, object_cell(object, column)))
            .collect::<HashMap<&'static str, String>>();
        rows.push(RawRecord::new(row, values));
    }

    debug!(rows = rows.len(), malformed = errors.len(), "decoded spreadsheet rows");
    Ok(DecodedTable { rows, errors })
}

#[cfg(feature = "spreadsheet")]
pub(crate) fn decode_workbook(path: &Path) -> ClientResult<DecodedTable> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|error| ClientError::spreadsheet_unreadable(path, &error.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ClientError::spreadsheet_unreadable(path, "the workbook has no sheets"))?
        .map_err(|error| ClientError::spreadsheet_unreadable(path, &error.to_string()))?;

    let lines = range
        .rows()
        .map(|cells| {
            cells
                .iter()
                .map(|cell| match cell {
                    Data::String(text) => text.clone(),
                    Data::Float(number) => number.to_string(),
                    Data::Int(number) => number.to_string(),
                    Data::Bool(flag) => flag.to_string(),
                    Data::DateTime(moment) => moment.as_f64().to_string(),
                    Data::DateTimeIso(text) | Data::DurationIso(text) => text.clone(),
                    Data::Error(_) | Data::Empty => String::new(),
                })
                .collect::<Vec<String>>()
        })
        .collect::<Vec<Vec<String>>>();

    decode_sheet_lines(lines)
}

/// Physical sheet lines: the first non-blank one is the header.
#[cfg_attr(not(feature = "spreadsheet"), allow(dead_code))]
pub(crate) fn decode_sheet_lines(lines: Vec<Vec<String>>) -> ClientResult<DecodedTable> {
    let is_blank = |cells: &Vec<String>| cells.iter().all(|cell| cell.trim().is_empty());
    let Some(header_index) = lines.iter().position(|cells| !is_blank(cells)) else {
        return Err(ClientError::format_error(
            ImportKind::Spreadsheet,
            "The spreadsheet is empty.",
        ));
    };
    if lines.iter().skip(header_index + 1).all(is_blank) {
        return Err(ClientError::format_error(
            ImportKind::Spreadsheet,
            "The spreadsheet must contain a header row and at least one data row.",
        ));
    }

    let header = lines[header_index].clone();
    let positions = match_columns(&header, &EXPENSE_SHEET)?;

    let mut rows = Vec::new();
    for (index, cells) in lines.iter().enumerate().skip(header_index + 1) {
        if is_blank(cells) {
            continue;
        }
        let values = positions
            .iter()
            .map(|(column, position)| {
                let value = cells.get(*position).cloned().unwrap_or_default();
                (*column, value)
            })
            .collect::<HashMap<&'static str, String>>();
        rows.push(RawRecord::new((index as i64) + 1, values));
    }

    Ok(DecodedTable {
        rows,
        errors: Vec::new(),
    })
}

fn object_cell(object: &Map<String, Value>, column: &str) -> String {
    let cell = object
        .iter()
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(column))
        .map(|(_, value)| value);
    match cell {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_sheet_lines, import_expenses_sheet_json};
    use crate::test_support::{sample_categories, sample_users};

    #[test]
    fn strict_rows_require_description_positive_amount_and_date() {
        let content = r#"[
            {"User ID": "1", "Category ID": "1", "Subcategory ID": "1-1", "Amount": 4.2, "Description": "Bread", "Date": 45672},
            {"User ID": "1", "Category ID": "1", "Subcategory ID": "1-1", "Amount": 3, "Description": "", "Date": "2025-01-15"},
            {"User ID": "1", "Category ID": "1", "Subcategory ID": "1-1", "Amount": -3, "Description": "Refund", "Date": "2025-01-15"},
            {"User ID": "1", "Category ID": "1", "Subcategory ID": "1-1", "Amount": "x", "Description": "Bad", "Date": "2025-01-15"},
            {"User ID": "1", "Category ID": "1", "Subcategory ID": "1-1", "Amount": 8, "Description": "Later", "Date": "soon"},
            {"user id": "7", "category id": "1", "subcategory id": "1-1", "amount": 8, "description": "Who", "date": "2025-01-15"}
        ]"#;
        let outcome = import_expenses_sheet_json(content, &sample_users(), &sample_categories());
        assert!(outcome.is_ok());
        if let Ok(result) = outcome {
            assert_eq!(result.accepted.len(), 1);
            assert_eq!(result.accepted[0].date, "2025-01-15");
            assert_eq!(result.accepted[0].amount, 4.2);
            assert_eq!(
                result.error_messages(),
                vec![
                    "Row 3: Description is required",
                    "Row 4: Amount must be a positive number",
                    "Row 5: Amount must be a positive number",
                    "Row 6: Invalid date: soon",
                    "Row 7: User not found",
                ]
            );
        }
    }

    #[test]
    fn non_array_json_is_a_format_error() {
        let outcome =
            import_expenses_sheet_json(r#"{"rows": []}"#, &sample_users(), &sample_categories());
        assert!(outcome.is_err());
        if let Err(error) = outcome {
            assert_eq!(error.code, "format_error");
        }
    }

    #[test]
    fn sheet_lines_number_rows_by_position() {
        let lines = vec![
            vec![],
            ["User ID", "Category ID", "Subcategory ID", "Amount", "Description", "Date"]
                .iter()
                .map(|cell| cell.to_string())
                .collect(),
            vec![String::new(); 6],
            ["1", "1", "1-1", "2", "Tea"]
                .iter()
                .map(|cell| cell.to_string())
                .collect(),
        ];
        let table = decode_sheet_lines(lines);
        assert!(table.is_ok());
        if let Ok(decoded) = table {
            assert_eq!(decoded.rows.len(), 1);
            assert_eq!(decoded.rows[0].row, 4);
            assert_eq!(decoded.rows[0].get("Description"), "Tea");
            assert_eq!(decoded.rows[0].get("Date"), "");
        }
    }
}
