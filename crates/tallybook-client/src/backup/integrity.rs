use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::backup::BackupDocument;
use crate::model::{CategoryRecord, Expense, Subcategory, User};
use crate::store::read_records;

/// Every problem deep validation finds in a backup, in collection order. Empty when
/// consistent.
///
/// Records that do not read as entities are reported and left out of the reference
/// checks. Subcategory ids only need to be unique within their category.
pub fn check_integrity(document: &BackupDocument) -> Vec<String> {
    let mut issues = Vec::new();

    let users = typed::<User>("User", &document.users, &mut issues);
    let categories = typed::<CategoryRecord>("Category", &document.categories, &mut issues);
    let subcategories = typed::<Subcategory>("Subcategory", &document.subcategories, &mut issues);
    let expenses = typed::<Expense>("Expense", &document.expenses, &mut issues);

    let user_ids = unique_ids("user", users.iter().map(|user| user.id.as_str()), &mut issues);
    let category_ids = unique_ids(
        "category",
        categories.iter().map(|category| category.id.as_str()),
        &mut issues,
    );
    unique_ids(
        "expense",
        expenses.iter().map(|expense| expense.id.as_str()),
        &mut issues,
    );

    let mut owned = HashSet::<(&str, &str)>::new();
    let mut subcategory_ids = HashSet::<&str>::new();
    for subcategory in &subcategories {
        let id = subcategory.id.as_str();
        let category_id = subcategory.category_id.as_str();
        if id.trim().is_empty() {
            issues.push("A subcategory has an empty id".to_string());
        } else if !owned.insert((category_id, id)) {
            issues.push(format!(
                "Duplicate subcategory id '{id}' in category '{category_id}'"
            ));
        }
        subcategory_ids.insert(id);
        if !category_ids.contains(category_id) {
            issues.push(format!(
                "Subcategory '{id}' references missing category '{category_id}'"
            ));
        }
    }

    for expense in &expenses {
        if !user_ids.contains(expense.user_id.as_str()) {
            issues.push(format!(
                "Expense '{}' references missing user '{}'",
                expense.id, expense.user_id
            ));
        }
        if !category_ids.contains(expense.category_id.as_str()) {
            issues.push(format!(
                "Expense '{}' references missing category '{}'",
                expense.id, expense.category_id
            ));
        }
        let pair = (expense.category_id.as_str(), expense.subcategory_id.as_str());
        if owned.contains(&pair) {
            continue;
        }
        if subcategory_ids.contains(expense.subcategory_id.as_str()) {
            issues.push(format!(
                "Expense '{}' subcategory '{}' does not belong to category '{}'",
                expense.id, expense.subcategory_id, expense.category_id
            ));
        } else {
            issues.push(format!(
                "Expense '{}' references missing subcategory '{}'",
                expense.id, expense.subcategory_id
            ));
        }
    }

    issues
}

fn typed<T: DeserializeOwned>(
    label: &str,
    records: &[Value],
    issues: &mut Vec<String>,
) -> Vec<T> {
    let (typed, unreadable) = read_records::<T>(records);
    for (index, reason) in unreadable {
        issues.push(format!("{label} record {} cannot be read: {reason}", index + 1));
    }
    typed
}

fn unique_ids<'a>(
    label: &str,
    ids: impl Iterator<Item = &'a str>,
    issues: &mut Vec<String>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            issues.push(format!("A {label} has an empty id"));
        } else if !seen.insert(id) {
            issues.push(format!("Duplicate {label} id '{id}'"));
        }
    }
    seen
}
