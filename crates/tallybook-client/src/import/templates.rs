use crate::contracts::types::ImportKind;
use crate::import::categories::CATEGORY_COLUMNS;
use crate::import::expenses::EXPENSE_COLUMNS;
use crate::import::users::USER_COLUMNS;
use crate::model::{Category, Expense, User};
use crate::{ClientError, ClientResult};

const EXPENSE_EXAMPLES: [[&str; 15]; 2] = [
    [
        "1",
        "1",
        "Alex Chen",
        "alexc",
        "alex@example.com",
        "1",
        "Food & Dining",
        "1",
        "Groceries",
        "12.50",
        "Milk, eggs",
        "Market",
        "Downtown",
        "2025-01-15",
        "2025-01-15T10:00:00.000Z",
    ],
    [
        "",
        "",
        "",
        "",
        "alex@example.com",
        "",
        "Transportation",
        "",
        "Fuel",
        "40.00",
        "Fill up",
        "",
        "",
        "2025-01-16",
        "",
    ],
];

const CATEGORY_EXAMPLES: [[&str; 6]; 4] = [
    ["1", "Food & Dining", "UtensilsCrossed", "text-orange-600", "1", "Groceries"],
    ["1", "Food & Dining", "UtensilsCrossed", "text-orange-600", "2", "Restaurants"],
    ["2", "Transportation", "Car", "text-blue-600", "3", "Fuel"],
    ["3", "Gifts", "Gift", "text-pink-600", "", ""],
];

const USER_EXAMPLES: [[&str; 9]; 2] = [
    ["1", "Alex Chen", "alexc", "alex@example.com", "AC", "bg-blue-500", "1", "1", "Downtown"],
    ["2", "Sam Lee", "sam_lee", "sam@example.com", "", "bg-green-500", "", "", ""],
];

/// Example CSV for a kind: the header row followed by sample rows.
pub fn template_csv(kind: ImportKind) -> ClientResult<String> {
    match kind {
        ImportKind::Expenses | ImportKind::Spreadsheet => write_rows(
            &EXPENSE_COLUMNS,
            EXPENSE_EXAMPLES.iter().map(|row| row.to_vec()),
        ),
        ImportKind::Categories => write_rows(
            &CATEGORY_COLUMNS,
            CATEGORY_EXAMPLES.iter().map(|row| row.to_vec()),
        ),
        ImportKind::Users => {
            write_rows(&USER_COLUMNS, USER_EXAMPLES.iter().map(|row| row.to_vec()))
        }
    }
}

pub fn template_file_name(kind: ImportKind) -> String {
    format!("{}_template.csv", kind.as_str())
}

/// Renders expenses in the expense import layout, with user and category names filled in
/// so the file re-imports even where ids differ.
pub fn export_expenses_csv(
    expenses: &[Expense],
    users: &[User],
    categories: &[Category],
) -> ClientResult<String> {
    let rows = expenses.iter().map(|expense| {
        let user = users.iter().find(|user| user.id == expense.user_id);
        let category = categories
            .iter()
            .find(|category| category.id == expense.category_id);
        let subcategory = category.and_then(|category| {
            category
                .subcategories
                .iter()
                .find(|subcategory| subcategory.id == expense.subcategory_id)
        });

        vec![
            expense.id.clone(),
            expense.user_id.clone(),
            user.map(|user| user.name.clone()).unwrap_or_default(),
            user.map(|user| user.username.clone()).unwrap_or_default(),
            user.map(|user| user.email.clone()).unwrap_or_default(),
            expense.category_id.clone(),
            category
                .map(|category| category.name.clone())
                .unwrap_or_default(),
            expense.subcategory_id.clone(),
            subcategory
                .map(|subcategory| subcategory.name.clone())
                .unwrap_or_default(),
            format!("{:.2}", expense.amount),
            expense.description.clone(),
            expense.store_name.clone().unwrap_or_default(),
            expense.store_location.clone().unwrap_or_default(),
            expense.date.clone(),
            expense.created_at.clone(),
        ]
    });
    write_rows(&EXPENSE_COLUMNS, rows)
}

fn write_rows<I, R, F>(header: &[&str], rows: I) -> ClientResult<String>
where
    I: Iterator<Item = R>,
    R: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer
        .write_record(header)
        .map_err(|error| ClientError::internal_serialization(&error.to_string()))?;
    for row in rows {
        writer
            .write_record(row)
            .map_err(|error| ClientError::internal_serialization(&error.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|error| ClientError::internal_serialization(&error.to_string()))?;
    String::from_utf8(bytes)
        .map_err(|error| ClientError::internal_serialization(&error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{export_expenses_csv, template_csv, template_file_name};
    use crate::contracts::types::ImportKind;
    use crate::import::categories::import_categories_csv;
    use crate::import::expenses::import_expenses_csv;
    use crate::import::ids::IdCounters;
    use crate::test_support::{sample_categories, sample_expense, sample_users};

    #[test]
    fn category_template_imports_cleanly() {
        let template = template_csv(ImportKind::Categories);
        assert!(template.is_ok());
        if let Ok(content) = template {
            assert!(content.starts_with("Category ID,Category Name,"));
            let mut counters = IdCounters::default();
            let outcome = import_categories_csv(&content, &mut counters);
            assert!(outcome.is_ok());
            if let Ok(result) = outcome {
                assert!(result.errors.is_empty());
                assert_eq!(result.accepted.len(), 3);
                assert_eq!(result.accepted[0].subcategories.len(), 2);
            }
        }
        assert_eq!(template_file_name(ImportKind::Users), "users_template.csv");
    }

    #[test]
    fn exported_expenses_reimport_through_the_csv_path() {
        let mut expense = sample_expense("e-1");
        expense.description = "Milk, \"organic\" eggs".to_string();
        let users = sample_users();
        let categories = sample_categories();
        let exported = export_expenses_csv(&[expense.clone()], &users, &categories);
        assert!(exported.is_ok());
        if let Ok(content) = exported {
            let outcome = import_expenses_csv(&content, &users, &categories);
            assert!(outcome.is_ok());
            if let Ok(result) = outcome {
                assert!(result.errors.is_empty());
                assert_eq!(result.accepted, vec![expense]);
            }
        }
    }
}
