pub(crate) mod categories;
pub(crate) mod expenses;
pub(crate) mod fields;
pub(crate) mod ids;
pub(crate) mod resolve;
pub(crate) mod spreadsheet;
pub(crate) mod tabular;
pub(crate) mod templates;
pub(crate) mod users;

use chrono::{Duration, NaiveDate, Utc};

pub use categories::{CATEGORY_COLUMNS, import_categories_csv};
pub use expenses::{EXPENSE_COLUMNS, ExpenseImportPolicy, import_expenses_csv};
pub use ids::{IdCounters, expense_id};
pub use resolve::{EntityKind, NotFound, resolve_category, resolve_subcategory, resolve_user};
pub use spreadsheet::import_expenses_sheet_json;
#[cfg(feature = "spreadsheet")]
pub use spreadsheet::import_expenses_workbook;
pub use templates::{export_expenses_csv, template_csv, template_file_name};
pub use users::{USER_COLUMNS, import_users_csv};

/// ISO-8601 UTC timestamp with millisecond precision, the format stored in `createdAt`.
pub(crate) fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Accepts `YYYY-MM-DD` (optionally followed by a time), `MM/DD/YYYY`, or an Excel serial
/// day number, and returns `YYYY-MM-DD`.
pub(crate) fn parse_sheet_date(raw: &str) -> Option<String> {
    let raw = raw.trim();

    if let Some(prefix) = raw.get(..10)
        && let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
        && (raw.len() == 10 || raw[10..].starts_with(['T', ' ']))
    {
        return Some(date.format("%Y-%m-%d").to_string());
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%m/%d/%Y") {
        return Some(date.format("%Y-%m-%d").to_string());
    }

    let serial = raw.parse::<f64>().ok()?;
    excel_serial_to_date(serial)
}

fn excel_serial_to_date(serial: f64) -> Option<String> {
    // Excel day 1 is 1900-01-01; counting from 1899-12-30 absorbs its 1900 leap-year bug
    if !serial.is_finite() || !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = base.checked_add_signed(Duration::days(serial.trunc() as i64))?;
    Some(date.format("%Y-%m-%d").to_string())
}
