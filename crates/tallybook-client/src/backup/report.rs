use std::collections::HashMap;

use serde_json::Value;

use crate::backup::BackupDocument;
use crate::store::record_text;

const RULE: &str = "==============================";

/// Plain-text rendering of a backup for people to read. Never parsed back.
pub fn render_text(document: &BackupDocument) -> String {
    let mut lines = vec![
        RULE.to_string(),
        "EXPENSE TRACKER BACKUP".to_string(),
        RULE.to_string(),
        format!("Backup Date: {}", document.timestamp),
        format!("Version: {}", document.version),
        format!("Use Case: {}", document.use_case),
        String::new(),
        "USERS:".to_string(),
    ];

    if document.users.is_empty() {
        lines.push("No users found".to_string());
    }
    for user in &document.users {
        let active = user.get("isActive").and_then(Value::as_bool).unwrap_or(true);
        let status = if active { "active" } else { "inactive" };
        lines.push(format!(
            "- {} (@{}) <{}> [{status}]",
            text(user, "name"),
            text(user, "username"),
            text(user, "email")
        ));
    }
    lines.push(String::new());

    lines.push("CATEGORIES:".to_string());
    if document.categories.is_empty() {
        lines.push("No categories found".to_string());
    }
    for category in &document.categories {
        let id = record_text(category, "id");
        let names = document
            .subcategories
            .iter()
            .filter(|sub| id.is_some() && record_text(sub, "categoryId") == id)
            .map(|sub| text(sub, "name"))
            .collect::<Vec<_>>();
        if names.is_empty() {
            lines.push(format!("- {}", text(category, "name")));
        } else {
            lines.push(format!("- {}: {}", text(category, "name"), names.join(", ")));
        }
    }
    lines.push(String::new());

    lines.push("EXPENSES SUMMARY:".to_string());
    if document.expenses.is_empty() {
        lines.push("No expenses found".to_string());
        return finish(lines);
    }

    let total = document.expenses.iter().map(amount).sum::<f64>();
    lines.push(format!("Total Expenses: {}", document.expenses.len()));
    lines.push(format!("Total Amount: {total:.2}"));

    let category_names = document
        .categories
        .iter()
        .filter_map(|category| Some((record_text(category, "id")?, text(category, "name"))))
        .collect::<HashMap<_, _>>();
    for expense in &document.expenses {
        let category = record_text(expense, "categoryId")
            .and_then(|id| category_names.get(id))
            .copied()
            .unwrap_or("Unknown");
        lines.push(format!(
            "- {} | {} | {} | {:.2}",
            text(expense, "date"),
            category,
            text(expense, "description"),
            amount(expense)
        ));
    }
    finish(lines)
}

fn finish(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn text<'a>(record: &'a Value, key: &str) -> &'a str {
    record_text(record, key).unwrap_or_default()
}

fn amount(expense: &Value) -> f64 {
    match expense.get("amount") {
        Some(Value::Number(number)) => number.as_f64().unwrap_or_default(),
        Some(Value::String(raw)) => raw.trim().parse::<f64>().unwrap_or_default(),
        _ => 0.0,
    }
}
