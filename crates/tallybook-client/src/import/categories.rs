use std::collections::HashMap;

use tracing::{debug, info};

use crate::ClientResult;
use crate::contracts::types::{ImportKind, ImportOutcome, RowError};
use crate::import::ids::IdCounters;
use crate::import::resolve::same_text;
use crate::import::tabular::{ColumnSpec, DecodedTable, RawRecord, decode};
use crate::model::{
    Category, DEFAULT_CATEGORY_COLOR, DEFAULT_CATEGORY_ICON, Subcategory, is_category_color,
    is_category_icon,
};

pub const CATEGORY_COLUMNS: [&str; 6] = [
    "Category ID",
    "Category Name",
    "Category Icon",
    "Category Color",
    "Subcategory ID",
    "Subcategory Name",
];

pub(crate) const CATEGORY_CSV: ColumnSpec = ColumnSpec {
    kind: ImportKind::Categories,
    required: &["Category ID", "Category Name"],
    optional: &[
        "Category Icon",
        "Category Color",
        "Subcategory ID",
        "Subcategory Name",
    ],
};

/// Imports category CSV text. Rows sharing a category name (case-insensitively) merge into
/// one category; every category and subcategory gets a fresh id from `counters`.
pub fn import_categories_csv(
    content: &str,
    counters: &mut IdCounters,
) -> ClientResult<ImportOutcome<Category>> {
    let table = decode(content, &CATEGORY_CSV)?;
    Ok(validate_category_rows(table, counters))
}

pub(crate) fn validate_category_rows(
    table: DecodedTable,
    counters: &mut IdCounters,
) -> ImportOutcome<Category> {
    let rows_read = table.rows_read();
    let mut categories: Vec<Category> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    let mut errors = table.errors;

    for record in &table.rows {
        if let Err(reason) = check_row(record) {
            errors.push(RowError::new(record.row, reason));
            continue;
        }

        let name = record.get("Category Name");
        let index = *by_name.entry(name.to_lowercase()).or_insert_with(|| {
            categories.push(Category {
                id: counters.next_category_id(),
                name: name.to_string(),
                icon: accepted_icon(record),
                color: accepted_color(record),
                subcategories: Vec::new(),
            });
            categories.len() - 1
        });

        let subcategory_name = record.get("Subcategory Name");
        if subcategory_name.is_empty() {
            continue;
        }

        let category = &mut categories[index];
        if category
            .subcategories
            .iter()
            .any(|existing| same_text(&existing.name, subcategory_name))
        {
            debug!(
                row = record.row,
                category = category.name.as_str(),
                subcategory = subcategory_name,
                "skipped duplicate subcategory"
            );
            continue;
        }

        category.subcategories.push(Subcategory {
            id: counters.next_subcategory_id(),
            name: subcategory_name.to_string(),
            category_id: category.id.clone(),
        });
    }

    errors.sort_by_key(|error| error.row);
    info!(
        categories = categories.len(),
        rejected = errors.len(),
        "validated category rows"
    );
    ImportOutcome::new(rows_read, categories, errors)
}

fn check_row(record: &RawRecord) -> Result<(), &'static str> {
    if record.get("Category ID").is_empty() || record.get("Category Name").is_empty() {
        return Err("Category ID and Name are required");
    }
    if !record.get("Subcategory ID").is_empty() && record.get("Subcategory Name").is_empty() {
        return Err("Subcategory Name is required when Subcategory ID is provided");
    }
    Ok(())
}

fn accepted_icon(record: &RawRecord) -> String {
    let icon = record.get("Category Icon");
    if is_category_icon(icon) {
        return icon.to_string();
    }
    debug!(row = record.row, icon, "unknown icon replaced with default");
    DEFAULT_CATEGORY_ICON.to_string()
}

fn accepted_color(record: &RawRecord) -> String {
    let color = record.get("Category Color");
    if is_category_color(color) {
        return color.to_string();
    }
    debug!(row = record.row, color, "unknown color replaced with default");
    DEFAULT_CATEGORY_COLOR.to_string()
}
