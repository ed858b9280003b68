use std::collections::HashSet;
use std::path::Path;
#[cfg(feature = "spreadsheet")]
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{
    CommitData, CommitSummary, ExpenseExportData, ImportData, ImportKind, ImportOutcome,
    TemplateData,
};
use crate::import::{
    self, ExpenseImportPolicy, IdCounters, export_expenses_csv, template_csv, template_file_name,
};
use crate::model::{Category, Expense, User};
use crate::setup::ensure_initialized_with_home_override;
use crate::store::{StateStore, record_text};
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
pub struct ImportTextOptions<'a> {
    pub content: String,
    pub home_override: Option<&'a Path>,
}

#[cfg(feature = "spreadsheet")]
#[derive(Debug, Default)]
pub struct ImportFileOptions<'a> {
    pub path: PathBuf,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct CommitOptions<'a> {
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct ExportOptions<'a> {
    pub home_override: Option<&'a Path>,
}

/// Records accepted by an import preview, ready to be appended to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "records", rename_all = "snake_case")]
pub enum ImportBatch {
    Expenses(Vec<Expense>),
    Categories(Vec<Category>),
    Users(Vec<User>),
}

pub fn expenses_csv(content: String) -> ClientResult<SuccessEnvelope> {
    expenses_csv_with_options(ImportTextOptions {
        content,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn expenses_csv_with_options(options: ImportTextOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = ensure_initialized_with_home_override(options.home_override)?;
    let state = setup.store.get_full_state()?;
    let outcome =
        import::import_expenses_csv(&options.content, &state.users(), &state.nested_categories())?;
    preview(
        "import expenses",
        ImportKind::Expenses,
        Some(ExpenseImportPolicy::Lenient),
        outcome,
    )
}

pub fn spreadsheet_rows(content: String) -> ClientResult<SuccessEnvelope> {
    spreadsheet_rows_with_options(ImportTextOptions {
        content,
        home_override: None,
    })
}

/// Strict expense import of spreadsheet rows given as a JSON array of objects.
#[doc(hidden)]
pub fn spreadsheet_rows_with_options(
    options: ImportTextOptions<'_>,
) -> ClientResult<SuccessEnvelope> {
    let setup = ensure_initialized_with_home_override(options.home_override)?;
    let state = setup.store.get_full_state()?;
    let outcome = import::import_expenses_sheet_json(
        &options.content,
        &state.users(),
        &state.nested_categories(),
    )?;
    preview(
        "import spreadsheet",
        ImportKind::Spreadsheet,
        Some(ExpenseImportPolicy::Strict),
        outcome,
    )
}

#[cfg(feature = "spreadsheet")]
pub fn spreadsheet_file(path: PathBuf) -> ClientResult<SuccessEnvelope> {
    spreadsheet_file_with_options(ImportFileOptions {
        path,
        home_override: None,
    })
}

#[cfg(feature = "spreadsheet")]
#[doc(hidden)]
pub fn spreadsheet_file_with_options(
    options: ImportFileOptions<'_>,
) -> ClientResult<SuccessEnvelope> {
    let setup = ensure_initialized_with_home_override(options.home_override)?;
    let state = setup.store.get_full_state()?;
    let outcome = import::import_expenses_workbook(
        &options.path,
        &state.users(),
        &state.nested_categories(),
    )?;
    preview(
        "import spreadsheet",
        ImportKind::Spreadsheet,
        Some(ExpenseImportPolicy::Strict),
        outcome,
    )
}

pub fn categories_csv(content: String) -> ClientResult<SuccessEnvelope> {
    categories_csv_with_options(ImportTextOptions {
        content,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn categories_csv_with_options(
    options: ImportTextOptions<'_>,
) -> ClientResult<SuccessEnvelope> {
    let setup = ensure_initialized_with_home_override(options.home_override)?;
    let state = setup.store.get_full_state()?;
    let mut counters = IdCounters::from_existing(&state.users(), &state.nested_categories());
    let outcome = import::import_categories_csv(&options.content, &mut counters)?;
    preview("import categories", ImportKind::Categories, None, outcome)
}

pub fn users_csv(content: String) -> ClientResult<SuccessEnvelope> {
    users_csv_with_options(ImportTextOptions {
        content,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn users_csv_with_options(options: ImportTextOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = ensure_initialized_with_home_override(options.home_override)?;
    let state = setup.store.get_full_state()?;
    let users = state.users();
    let categories = state.nested_categories();
    let mut counters = IdCounters::from_existing(&users, &categories);
    let outcome = import::import_users_csv(&options.content, &users, &categories, &mut counters)?;
    preview("import users", ImportKind::Users, None, outcome)
}

fn preview<T: Serialize>(
    command: &str,
    kind: ImportKind,
    policy: Option<ExpenseImportPolicy>,
    outcome: ImportOutcome<T>,
) -> ClientResult<SuccessEnvelope> {
    let summary = outcome.summary.clone();
    info!(
        kind = kind.as_str(),
        rows_read = summary.rows_read,
        rows_valid = summary.rows_valid,
        rows_invalid = summary.rows_invalid,
        "import preview ready"
    );

    let message = if summary.rows_invalid == 0 {
        format!(
            "{} of {} rows are ready to import.",
            outcome.accepted.len(),
            summary.rows_read
        )
    } else {
        format!(
            "{} of {} rows are ready to import; {} rows have errors.",
            outcome.accepted.len(),
            summary.rows_read,
            summary.rows_invalid
        )
    };

    let accepted = serde_json::to_value(&outcome.accepted)
        .map_err(|error| ClientError::internal_serialization(&error.to_string()))?;
    let data = ImportData {
        kind,
        policy: policy.map(|policy| policy.as_str().to_string()),
        message,
        summary,
        accepted,
        errors: outcome.error_messages(),
        row_errors: outcome.errors,
    };
    success(command, data)
}

pub fn commit(batch: ImportBatch) -> ClientResult<SuccessEnvelope> {
    commit_with_options(batch, CommitOptions::default())
}

/// Appends a previewed batch. Existing records are never modified; a batch whose ids were
/// assigned against a store that has since changed is refused.
#[doc(hidden)]
pub fn commit_with_options(
    batch: ImportBatch,
    options: CommitOptions<'_>,
) -> ClientResult<SuccessEnvelope> {
    let mut setup = ensure_initialized_with_home_override(options.home_override)?;
    let mut state = setup.store.get_full_state()?;
    let mut summary = CommitSummary {
        users_added: 0,
        categories_added: 0,
        subcategories_added: 0,
        expenses_added: 0,
        skipped_existing: 0,
    };

    match batch {
        ImportBatch::Users(users) => {
            check_new_users(&users, &state.users)?;
            summary.users_added = users.len() as i64;
            state.append_users(&users)?;
        }
        ImportBatch::Categories(categories) => {
            check_new_categories(&categories, &state.categories, &state.subcategories)?;
            summary.categories_added = categories.len() as i64;
            summary.subcategories_added = categories
                .iter()
                .map(|category| category.subcategories.len() as i64)
                .sum();
            state.append_categories(&categories)?;
        }
        ImportBatch::Expenses(expenses) => {
            check_expense_references(&expenses, &state.users(), &state.nested_categories())?;
            let mut known = state
                .expenses
                .iter()
                .filter_map(|expense| record_text(expense, "id"))
                .map(str::to_string)
                .collect::<HashSet<String>>();
            let mut fresh = Vec::new();
            for expense in expenses {
                if known.insert(expense.id.clone()) {
                    fresh.push(expense);
                } else {
                    summary.skipped_existing += 1;
                }
            }
            summary.expenses_added = fresh.len() as i64;
            state.append_expenses(&fresh)?;
        }
    }

    setup.store.replace_full_state(state)?;
    info!(
        users = summary.users_added,
        categories = summary.categories_added,
        expenses = summary.expenses_added,
        skipped = summary.skipped_existing,
        "committed import"
    );

    let message = commit_message(&summary);
    success("import commit", CommitData { message, summary })
}

fn commit_message(summary: &CommitSummary) -> String {
    let mut parts = Vec::new();
    if summary.users_added > 0 {
        parts.push(format!("{} users", summary.users_added));
    }
    if summary.categories_added > 0 {
        parts.push(format!(
            "{} categories with {} subcategories",
            summary.categories_added, summary.subcategories_added
        ));
    }
    if summary.expenses_added > 0 {
        parts.push(format!("{} expenses", summary.expenses_added));
    }

    let mut message = if parts.is_empty() {
        "Nothing new was added.".to_string()
    } else {
        format!("Added {}.", parts.join(" and "))
    };
    if summary.skipped_existing > 0 {
        message.push_str(&format!(
            " Skipped {} expenses that already exist.",
            summary.skipped_existing
        ));
    }
    message
}

fn stale_batch(detail: &str) -> ClientError {
    ClientError::invalid_argument(&format!(
        "{detail} The data changed since this import was previewed; run the import again."
    ))
}

/// Stored records are compared by their raw fields, so a record that no longer reads as a
/// full entity still blocks a colliding batch.
fn stored_texts<'a>(records: &'a [Value], key: &str) -> HashSet<&'a str> {
    records
        .iter()
        .filter_map(|record| record_text(record, key))
        .collect()
}

fn stored_lowercase(records: &[Value], key: &str) -> HashSet<String> {
    stored_texts(records, key)
        .into_iter()
        .map(str::to_lowercase)
        .collect()
}

fn check_new_users(users: &[User], existing: &[Value]) -> ClientResult<()> {
    let ids = stored_texts(existing, "id");
    let usernames = stored_lowercase(existing, "username");
    let emails = stored_lowercase(existing, "email");

    for user in users {
        if ids.contains(user.id.as_str()) {
            return Err(stale_batch(&format!("User id '{}' is already taken.", user.id)));
        }
        if usernames.contains(&user.username.to_lowercase()) {
            return Err(stale_batch(&format!(
                "Username '{}' already exists.",
                user.username
            )));
        }
        if emails.contains(&user.email.to_lowercase()) {
            return Err(stale_batch(&format!("Email '{}' already exists.", user.email)));
        }
    }
    Ok(())
}

fn check_new_categories(
    categories: &[Category],
    existing: &[Value],
    existing_subcategories: &[Value],
) -> ClientResult<()> {
    let category_ids = stored_texts(existing, "id");
    let subcategory_ids = stored_texts(existing_subcategories, "id");

    for category in categories {
        if category_ids.contains(category.id.as_str()) {
            return Err(stale_batch(&format!(
                "Category id '{}' is already taken.",
                category.id
            )));
        }
        if let Some(subcategory) = category
            .subcategories
            .iter()
            .find(|subcategory| subcategory_ids.contains(subcategory.id.as_str()))
        {
            return Err(stale_batch(&format!(
                "Subcategory id '{}' is already taken.",
                subcategory.id
            )));
        }
    }
    Ok(())
}

fn check_expense_references(
    expenses: &[Expense],
    users: &[User],
    categories: &[Category],
) -> ClientResult<()> {
    for expense in expenses {
        if !users.iter().any(|user| user.id == expense.user_id) {
            return Err(stale_batch(&format!(
                "Expense '{}' refers to unknown user '{}'.",
                expense.id, expense.user_id
            )));
        }
        let owned = categories
            .iter()
            .find(|category| category.id == expense.category_id)
            .is_some_and(|category| {
                category
                    .subcategories
                    .iter()
                    .any(|subcategory| subcategory.id == expense.subcategory_id)
            });
        if !owned {
            return Err(stale_batch(&format!(
                "Expense '{}' refers to an unknown category or subcategory.",
                expense.id
            )));
        }
    }
    Ok(())
}

/// Example CSV for one import kind. Needs no data home.
pub fn template(kind: ImportKind) -> ClientResult<SuccessEnvelope> {
    let data = TemplateData {
        kind,
        file_name: template_file_name(kind),
        content: template_csv(kind)?,
    };
    success("import template", data)
}

pub fn export_expenses() -> ClientResult<SuccessEnvelope> {
    export_expenses_with_options(ExportOptions::default())
}

#[doc(hidden)]
pub fn export_expenses_with_options(options: ExportOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = ensure_initialized_with_home_override(options.home_override)?;
    let state = setup.store.get_full_state()?;
    let expenses = state.expenses();
    let content = export_expenses_csv(&expenses, &state.users(), &state.nested_categories())?;
    let data = ExpenseExportData {
        file_name: "expenses_export.csv".to_string(),
        rows: expenses.len() as i64,
        content,
    };
    success("export expenses", data)
}
