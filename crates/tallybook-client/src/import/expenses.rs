use serde::Serialize;
use tracing::{debug, info};

use crate::ClientResult;
use crate::contracts::types::{ImportKind, ImportOutcome, RowError};
use crate::import::ids::expense_id;
use crate::import::resolve::{category_from_fields, subcategory_from_fields, user_from_fields};
use crate::import::tabular::{ColumnSpec, DecodedTable, RawRecord, decode};
use crate::import::{now_timestamp, parse_sheet_date};
use crate::model::{Category, Expense, User};

pub const EXPENSE_COLUMNS: [&str; 15] = [
    "ID",
    "User ID",
    "User Name",
    "Username",
    "Email",
    "Category ID",
    "Category Name",
    "Subcategory ID",
    "Subcategory Name",
    "Amount",
    "Description",
    "Store Name",
    "Store Location",
    "Date",
    "Created At",
];

const REQUIRED_EXPENSE_COLUMNS: [&str; 6] = [
    "User ID",
    "Category ID",
    "Subcategory ID",
    "Amount",
    "Description",
    "Date",
];

const OPTIONAL_EXPENSE_COLUMNS: [&str; 9] = [
    "ID",
    "User Name",
    "Username",
    "Email",
    "Category Name",
    "Subcategory Name",
    "Store Name",
    "Store Location",
    "Created At",
];

pub(crate) const EXPENSE_CSV: ColumnSpec = ColumnSpec {
    kind: ImportKind::Expenses,
    required: &REQUIRED_EXPENSE_COLUMNS,
    optional: &OPTIONAL_EXPENSE_COLUMNS,
};

pub(crate) const EXPENSE_SHEET: ColumnSpec = ColumnSpec {
    kind: ImportKind::Spreadsheet,
    required: &REQUIRED_EXPENSE_COLUMNS,
    optional: &OPTIONAL_EXPENSE_COLUMNS,
};

/// How strictly expense fields are checked once references resolve.
///
/// `Lenient` is the CSV path: amount falls back to 0 when unparsable, date and description
/// are taken as written. `Strict` is the spreadsheet path: description must be present,
/// amount must be positive and the date must parse.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseImportPolicy {
    Lenient,
    Strict,
}

impl ExpenseImportPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lenient => "lenient",
            Self::Strict => "strict",
        }
    }
}

/// Lenient import of expense CSV text against the caller's users and categories.
pub fn import_expenses_csv(
    content: &str,
    users: &[User],
    categories: &[Category],
) -> ClientResult<ImportOutcome<Expense>> {
    let table = decode(content, &EXPENSE_CSV)?;
    Ok(validate_expense_rows(
        table,
        users,
        categories,
        ExpenseImportPolicy::Lenient,
    ))
}

pub(crate) fn validate_expense_rows(
    table: DecodedTable,
    users: &[User],
    categories: &[Category],
    policy: ExpenseImportPolicy,
) -> ImportOutcome<Expense> {
    let rows_read = table.rows_read();
    let created_default = now_timestamp();
    let mut accepted = Vec::new();
    let mut errors = table.errors;

    for record in &table.rows {
        match validate_expense(record, users, categories, policy, &created_default) {
            Ok(expense) => accepted.push(expense),
            Err(reason) => errors.push(RowError::new(record.row, reason)),
        }
    }

    errors.sort_by_key(|error| error.row);
    info!(
        policy = policy.as_str(),
        accepted = accepted.len(),
        rejected = errors.len(),
        "validated expense rows"
    );
    ImportOutcome::new(rows_read, accepted, errors)
}

fn validate_expense(
    record: &RawRecord,
    users: &[User],
    categories: &[Category],
    policy: ExpenseImportPolicy,
    created_default: &str,
) -> Result<Expense, String> {
    let checked = match policy {
        ExpenseImportPolicy::Strict => Some(strict_fields(record)?),
        ExpenseImportPolicy::Lenient => None,
    };

    let user = user_from_fields(
        record.get("User ID"),
        record.get("User Name"),
        record.get("Username"),
        record.get("Email"),
        users,
    )
    .map_err(|error| error.to_string())?;
    let category = category_from_fields(
        record.get("Category ID"),
        record.get("Category Name"),
        categories,
    )
    .map_err(|error| error.to_string())?;
    let subcategory = subcategory_from_fields(
        record.get("Subcategory ID"),
        record.get("Subcategory Name"),
        category,
    )
    .map_err(|error| error.to_string())?;

    let (amount, date) = match checked {
        Some(fields) => fields,
        None => (lenient_amount(record), record.get("Date").to_string()),
    };

    Ok(Expense {
        id: expense_id(record.optional("ID").as_deref()),
        user_id: user.id.clone(),
        category_id: category.id.clone(),
        subcategory_id: subcategory.id.clone(),
        amount,
        description: record.get("Description").to_string(),
        notes: None,
        attachments: None,
        store_name: record.optional("Store Name"),
        store_location: record.optional("Store Location"),
        date,
        created_at: record
            .optional("Created At")
            .unwrap_or_else(|| created_default.to_string()),
    })
}

fn lenient_amount(record: &RawRecord) -> f64 {
    let raw = record.get("Amount");
    match raw.parse::<f64>() {
        Ok(amount) if amount.is_finite() => amount,
        _ => {
            debug!(row = record.row, amount = raw, "unparsable amount imported as 0");
            0.0
        }
    }
}

fn strict_fields(record: &RawRecord) -> Result<(f64, String), String> {
    if record.get("Description").is_empty() {
        return Err("Description is required".to_string());
    }

    let amount = record
        .get("Amount")
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount > 0.0)
        .ok_or_else(|| "Amount must be a positive number".to_string())?;

    let raw_date = record.get("Date");
    if raw_date.is_empty() {
        return Err("Date is required".to_string());
    }
    let date = parse_sheet_date(raw_date).ok_or_else(|| format!("Invalid date: {raw_date}"))?;

    Ok((amount, date))
}

#[cfg(test)]
mod tests {
    use super::import_expenses_csv;
    use crate::test_support::{sample_categories, sample_users};

    const HEADER: &str = "ID,User ID,User Name,Username,Email,Category ID,Category Name,Subcategory ID,Subcategory Name,Amount,Description,Store Name,Store Location,Date,Created At";

    #[test]
    fn scenario_row_imports_with_quoted_description() {
        let content = format!(
            "{HEADER}\n1,1,Alex Chen,alexc,alex@x.com,1,Food,1-1,Groceries,12.50,\"Milk, eggs\",Market,Downtown,2025-01-15,2025-01-15T10:00:00Z\n"
        );
        let outcome = import_expenses_csv(&content, &sample_users(), &sample_categories());
        assert!(outcome.is_ok());
        if let Ok(result) = outcome {
            assert!(result.errors.is_empty());
            assert_eq!(result.accepted.len(), 1);
            let expense = &result.accepted[0];
            assert_eq!(expense.id, "1");
            assert_eq!(expense.amount, 12.5);
            assert_eq!(expense.description, "Milk, eggs");
            assert_eq!(expense.store_location.as_deref(), Some("Downtown"));
            assert_eq!(expense.created_at, "2025-01-15T10:00:00Z");
        }
    }

    #[test]
    fn references_fall_back_to_names_and_email() {
        let content = format!(
            "{HEADER}\n,,,,SAM@x.com,,food,,restaurants,abc,Dinner,,,2025-02-01,\n"
        );
        let outcome = import_expenses_csv(&content, &sample_users(), &sample_categories());
        assert!(outcome.is_ok());
        if let Ok(result) = outcome {
            assert_eq!(result.accepted.len(), 1);
            let expense = &result.accepted[0];
            assert_eq!(expense.user_id, "2");
            assert_eq!(expense.subcategory_id, "1-2");
            assert_eq!(expense.amount, 0.0);
            assert_eq!(expense.id.len(), 36);
            assert!(expense.store_name.is_none());
            assert!(!expense.created_at.is_empty());
        }
    }

    #[test]
    fn each_failed_reference_is_one_row_error() {
        let content = format!(
            "{HEADER}\n\
             a,9,,,,1,,1-1,,5,Ok,,,2025-01-01,\n\
             b,1,,,,9,,1-1,,5,Ok,,,2025-01-01,\n\
             c,1,,,,1,,2-1,,5,Ok,,,2025-01-01,\n\
             d,1,,,,1,,1-1,,5,Ok,,,2025-01-01,\n"
        );
        let outcome = import_expenses_csv(&content, &sample_users(), &sample_categories());
        assert!(outcome.is_ok());
        if let Ok(result) = outcome {
            assert_eq!(result.accepted.len(), 1);
            assert_eq!(
                result.error_messages(),
                vec![
                    "Row 2: User not found",
                    "Row 3: Category not found",
                    "Row 4: Subcategory not found",
                ]
            );
            assert_eq!(result.summary.rows_read, 4);
            assert_eq!(result.summary.rows_invalid, 3);
        }
    }

    #[test]
    fn short_rows_and_rejected_rows_share_one_sorted_outcome() {
        let content = format!(
            "{HEADER}\n\
             a,1,,,,1,,1-1,,5,Ok,,,2025-01-01,\n\
             b,1,Alex\n\
             c,9,,,,1,,1-1,,5,Ok,,,2025-01-01,\n\
             d,1,,,,1,,1-2,,7,Ok,,,2025-01-02,\n"
        );
        let outcome = import_expenses_csv(&content, &sample_users(), &sample_categories());
        assert!(outcome.is_ok());
        if let Ok(result) = outcome {
            assert_eq!(
                result.error_messages(),
                vec![
                    "Row 3: Expected 15 columns but found 3",
                    "Row 4: User not found",
                ]
            );
            let ids = result
                .accepted
                .iter()
                .map(|expense| expense.id.as_str())
                .collect::<Vec<&str>>();
            assert_eq!(ids, vec!["a", "d"]);
            assert_eq!(result.summary.rows_read, 4);
            assert_eq!(result.summary.rows_valid, 2);
            assert_eq!(result.summary.rows_invalid, 2);
        }
    }

    #[test]
    fn missing_required_columns_fail_the_whole_import() {
        let outcome = import_expenses_csv(
            "ID,User ID,Category ID,Subcategory ID,Description\n1,1,1,1-1,x\n",
            &sample_users(),
            &sample_categories(),
        );
        assert!(outcome.is_err());
        if let Err(error) = outcome {
            assert_eq!(error.message, "Missing required columns: Amount, Date");
        }
    }
}
