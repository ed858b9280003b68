use std::path::{Path, PathBuf};

use serde_json::Value;
use tallybook_client::commands::import;
use tallybook_client::commands::import::{
    CommitOptions, ExportOptions, ImportBatch, ImportTextOptions,
};
use tallybook_client::contracts::envelope::failure_from_error;
use tallybook_client::contracts::types::ImportKind;
use tallybook_client::model::{Category, Expense, User};
use tallybook_client::{ClientResult, SuccessEnvelope};
use tempfile::tempdir;

const CATEGORY_CSV: &str = "Category ID,Category Name,Category Icon,Category Color,Subcategory ID,Subcategory Name
1,\"Food & Dining\",UtensilsCrossed,text-orange-600,1,Groceries
1,\"Food & Dining\",UtensilsCrossed,text-orange-600,2,Restaurants
2,Transportation,Car,not-a-color,3,Fuel
";

const USER_CSV: &str = "Name,Username,Email,Default Category ID
Alex Chen,AlexC,Alex@Example.com,Transportation
Sam Lee,sa,sam@example.com,
";

const EXPENSE_HEADER: &str = "ID,User ID,User Name,Username,Email,Category ID,Category Name,Subcategory ID,Subcategory Name,Amount,Description,Store Name,Store Location,Date,Created At";

fn temp_home() -> std::io::Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempdir()?;
    let home = dir.path().join("tally-home");
    Ok((dir, home))
}

fn text_options<'a>(home: &'a Path, content: &str) -> ImportTextOptions<'a> {
    ImportTextOptions {
        content: content.to_string(),
        home_override: Some(home),
    }
}

fn commit(home: &Path, batch: ImportBatch) -> ClientResult<SuccessEnvelope> {
    import::commit_with_options(
        batch,
        CommitOptions {
            home_override: Some(home),
        },
    )
}

fn accepted<T: serde::de::DeserializeOwned>(envelope: &SuccessEnvelope) -> Vec<T> {
    serde_json::from_value::<Vec<T>>(envelope.data["accepted"].clone()).unwrap_or_default()
}

fn seed_categories_and_users(home: &Path) -> (Vec<Category>, Vec<User>) {
    let categories = import::categories_csv_with_options(text_options(home, CATEGORY_CSV));
    assert!(categories.is_ok());
    let categories = categories
        .map(|envelope| accepted::<Category>(&envelope))
        .unwrap_or_default();
    assert!(commit(home, ImportBatch::Categories(categories.clone())).is_ok());

    let users = import::users_csv_with_options(text_options(home, USER_CSV));
    assert!(users.is_ok());
    let users = users.map(|envelope| accepted::<User>(&envelope)).unwrap_or_default();
    assert!(commit(home, ImportBatch::Users(users.clone())).is_ok());

    (categories, users)
}

#[test]
fn category_preview_merges_rows_and_assigns_fresh_ids() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let result = import::categories_csv_with_options(text_options(&home, CATEGORY_CSV));
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            assert_eq!(envelope.command, "import categories");
            assert_eq!(envelope.data["summary"]["rows_read"], 3);
            assert_eq!(envelope.data["summary"]["rows_invalid"], 0);

            let categories = accepted::<Category>(&envelope);
            assert_eq!(categories.len(), 2);
            assert_eq!(categories[0].name, "Food & Dining");
            assert_eq!(categories[0].subcategories.len(), 2);
            assert_ne!(
                categories[0].subcategories[0].id,
                categories[0].subcategories[1].id
            );
            assert_eq!(categories[1].color, "text-blue-600");
        }
    }
}

#[test]
fn user_preview_lowercases_and_reports_rows() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let categories = import::categories_csv_with_options(text_options(&home, CATEGORY_CSV));
        let categories = categories
        .map(|envelope| accepted::<Category>(&envelope))
        .unwrap_or_default();
        assert!(commit(&home, ImportBatch::Categories(categories.clone())).is_ok());

        let result = import::users_csv_with_options(text_options(&home, USER_CSV));
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            let users = accepted::<User>(&envelope);
            assert_eq!(users.len(), 1);
            assert_eq!(users[0].id, "1");
            assert_eq!(users[0].username, "alexc");
            assert_eq!(users[0].email, "alex@example.com");
            assert_eq!(
                users[0].default_category_id.as_deref(),
                Some(categories[1].id.as_str())
            );
            assert_eq!(
                envelope.data["errors"][0],
                "Row 3: Username 'sa' must be 3-20 characters of letters, numbers, or underscores"
            );
        }
    }
}

#[test]
fn expense_import_resolves_names_and_commit_skips_known_ids() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let (categories, users) = seed_categories_and_users(&home);
        assert_eq!(users.len(), 1);

        let content = format!(
            "{EXPENSE_HEADER}\n,,,,alex@example.com,,food & dining,,groceries,12.50,\"Milk, eggs\",Market,,2025-01-15,\n,9,Nobody,,,1,,1,,3,Tea,,,2025-01-16,\n"
        );
        let result = import::expenses_csv_with_options(text_options(&home, &content));
        assert!(result.is_ok());
        let Ok(envelope) = result else {
            return;
        };
        assert_eq!(envelope.data["policy"], "lenient");
        assert_eq!(envelope.data["errors"][0], "Row 3: User not found");

        let expenses = accepted::<Expense>(&envelope);
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].user_id, users[0].id);
        assert_eq!(expenses[0].category_id, categories[0].id);
        assert_eq!(expenses[0].subcategory_id, categories[0].subcategories[0].id);
        assert_eq!(expenses[0].amount, 12.5);
        assert_eq!(expenses[0].id.len(), 36);

        let first = commit(&home, ImportBatch::Expenses(expenses.clone()));
        assert!(first.is_ok());
        if let Ok(envelope) = first {
            assert_eq!(envelope.data["summary"]["expenses_added"], 1);
        }

        let again = commit(&home, ImportBatch::Expenses(expenses));
        assert!(again.is_ok());
        if let Ok(envelope) = again {
            assert_eq!(envelope.data["summary"]["expenses_added"], 0);
            assert_eq!(envelope.data["summary"]["skipped_existing"], 1);
        }

        let exported = import::export_expenses_with_options(ExportOptions {
            home_override: Some(&home),
        });
        assert!(exported.is_ok());
        if let Ok(envelope) = exported {
            assert_eq!(envelope.data["rows"], 1);
            let text = envelope.data["content"].as_str().unwrap_or_default();
            assert!(text.starts_with(EXPENSE_HEADER));
            assert!(text.contains("\"Milk, eggs\""));
            assert!(text.contains("Food & Dining"));
        }
    }
}

#[test]
fn stale_user_batch_is_refused() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let (_, users) = seed_categories_and_users(&home);
        let result = commit(&home, ImportBatch::Users(users));
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "invalid_argument");
            assert!(error.message.contains("run the import again"));
        }
    }
}

#[test]
fn missing_columns_fail_the_whole_import() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let result = import::users_csv_with_options(text_options(&home, "Name\nAlex Chen\n"));
        assert!(result.is_err());
        if let Err(error) = result {
            let failure = failure_from_error(&error);
            assert!(!failure.ok);
            assert_eq!(failure.error.code, "format_error");
            assert_eq!(
                failure.error.message,
                "Missing required columns: Username, Email"
            );
        }
    }
}

#[test]
fn spreadsheet_rows_use_strict_policy() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        seed_categories_and_users(&home);
        let rows = r#"[
            {"User ID": "1", "Category ID": "1", "Subcategory ID": "1", "Amount": 5, "Description": "Bread", "Date": 45672},
            {"user id": "1", "category id": "1", "subcategory id": "1", "amount": "-2", "description": "Refund", "date": "2025-01-16"}
        ]"#;
        let result = import::spreadsheet_rows_with_options(text_options(&home, rows));
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            assert_eq!(envelope.data["policy"], "strict");
            let expenses = accepted::<Expense>(&envelope);
            assert_eq!(expenses.len(), 1);
            assert_eq!(expenses[0].date, "2025-01-15");
            assert_eq!(
                envelope.data["errors"][0],
                "Row 3: Amount must be a positive number"
            );
        }
    }
}

#[test]
fn templates_reimport_cleanly() {
    let template = import::template(ImportKind::Categories);
    assert!(template.is_ok());
    if let Ok(envelope) = template {
        assert_eq!(envelope.data["file_name"], "categories_template.csv");
        let content = envelope.data["content"].as_str().unwrap_or_default().to_string();

        let temp = temp_home();
        assert!(temp.is_ok());
        if let Ok((_dir, home)) = temp {
            let result = import::categories_csv_with_options(text_options(&home, &content));
            assert!(result.is_ok());
            if let Ok(preview) = result {
                assert_eq!(preview.data["summary"]["rows_invalid"], Value::from(0));
            }
        }
    }
}
