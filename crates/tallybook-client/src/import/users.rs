use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::ClientResult;
use crate::contracts::types::{ImportKind, ImportOutcome, RowError};
use crate::import::ids::IdCounters;
use crate::import::resolve::{category_from_fields, subcategory_from_fields};
use crate::import::tabular::{ColumnSpec, DecodedTable, RawRecord, decode};
use crate::model::{Category, DEFAULT_USER_COLOR, User, is_user_color};

pub const USER_COLUMNS: [&str; 9] = [
    "User ID",
    "Name",
    "Username",
    "Email",
    "Avatar",
    "Color",
    "Default Category ID",
    "Default Subcategory ID",
    "Default Store Location",
];

pub(crate) const USER_CSV: ColumnSpec = ColumnSpec {
    kind: ImportKind::Users,
    required: &["Name", "Username", "Email"],
    optional: &[
        "User ID",
        "Avatar",
        "Color",
        "Default Category ID",
        "Default Subcategory ID",
        "Default Store Location",
    ],
};

static USERNAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_]{3,20}$").expect("hardcoded regex should be valid")
});

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("hardcoded regex should be valid")
});

/// Imports user CSV text. Usernames and emails are stored lower-cased and must be unique
/// against `existing` and earlier rows of the same file. Ids come from `counters`.
pub fn import_users_csv(
    content: &str,
    existing: &[User],
    categories: &[Category],
    counters: &mut IdCounters,
) -> ClientResult<ImportOutcome<User>> {
    let table = decode(content, &USER_CSV)?;
    Ok(validate_user_rows(table, existing, categories, counters))
}

pub(crate) fn validate_user_rows(
    table: DecodedTable,
    existing: &[User],
    categories: &[Category],
    counters: &mut IdCounters,
) -> ImportOutcome<User> {
    let rows_read = table.rows_read();
    let existing_usernames = existing
        .iter()
        .map(|user| user.username.trim().to_lowercase())
        .collect::<HashSet<String>>();
    let existing_emails = existing
        .iter()
        .map(|user| user.email.trim().to_lowercase())
        .collect::<HashSet<String>>();
    let mut batch_usernames = HashSet::new();
    let mut batch_emails = HashSet::new();
    let mut accepted = Vec::new();
    let mut errors = table.errors;

    for record in &table.rows {
        let name = record.get("Name");
        let username = record.get("Username").to_lowercase();
        let email = record.get("Email").to_lowercase();

        let rejection = if name.is_empty() || username.is_empty() || email.is_empty() {
            Some("Name, Username, and Email are required".to_string())
        } else if !USERNAME_PATTERN.is_match(&username) {
            Some(format!(
                "Username '{username}' must be 3-20 characters of letters, numbers, or underscores"
            ))
        } else if !EMAIL_PATTERN.is_match(&email) {
            Some(format!("Invalid email format '{email}'"))
        } else if batch_usernames.contains(&username) {
            Some(format!("Duplicate username '{username}' in import file"))
        } else if existing_usernames.contains(&username) {
            Some(format!("Username '{username}' already exists"))
        } else if batch_emails.contains(&email) {
            Some(format!("Duplicate email '{email}' in import file"))
        } else if existing_emails.contains(&email) {
            Some(format!("Email '{email}' already exists"))
        } else {
            None
        };

        if let Some(reason) = rejection {
            errors.push(RowError::new(record.row, reason));
            continue;
        }

        let (default_category_id, default_subcategory_id) = resolve_defaults(record, categories);
        batch_usernames.insert(username.clone());
        batch_emails.insert(email.clone());
        accepted.push(User {
            id: counters.next_user_id(),
            name: name.to_string(),
            username,
            email,
            avatar: accepted_avatar(record.get("Avatar"), name),
            color: accepted_color(record),
            is_active: true,
            default_category_id,
            default_subcategory_id,
            default_store_location: record.optional("Default Store Location"),
        });
    }

    errors.sort_by_key(|error| error.row);
    info!(
        accepted = accepted.len(),
        rejected = errors.len(),
        "validated user rows"
    );
    ImportOutcome::new(rows_read, accepted, errors)
}

fn accepted_color(record: &RawRecord) -> String {
    let color = record.get("Color");
    if is_user_color(color) {
        return color.to_string();
    }
    debug!(row = record.row, color, "unknown user color replaced with default");
    DEFAULT_USER_COLOR.to_string()
}

/// Keeps a one or two character avatar, otherwise derives initials from `name`.
pub(crate) fn accepted_avatar(avatar: &str, name: &str) -> String {
    if !avatar.is_empty() && avatar.chars().count() <= 2 {
        return avatar.to_string();
    }
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

fn resolve_defaults(
    record: &RawRecord,
    categories: &[Category],
) -> (Option<String>, Option<String>) {
    let category_key = record.get("Default Category ID");
    if category_key.is_empty() {
        return (None, None);
    }

    let Ok(category) = category_from_fields(category_key, category_key, categories) else {
        debug!(row = record.row, category = category_key, "dropped unknown default category");
        return (None, None);
    };

    let subcategory_key = record.get("Default Subcategory ID");
    if subcategory_key.is_empty() {
        return (Some(category.id.clone()), None);
    }

    match subcategory_from_fields(subcategory_key, subcategory_key, category) {
        Ok(subcategory) => (Some(category.id.clone()), Some(subcategory.id.clone())),
        Err(_) => {
            debug!(
                row = record.row,
                subcategory = subcategory_key,
                "dropped unknown default subcategory"
            );
            (Some(category.id.clone()), None)
        }
    }
}
