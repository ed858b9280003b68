pub(crate) mod sqlite;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use crate::model::{Category, CategoryRecord, Expense, Subcategory, User};
use crate::{ClientError, ClientResult};

pub use sqlite::SqliteStore;

pub const USERS_KEY: &str = "users";
pub const CATEGORIES_KEY: &str = "categories";
pub const SUBCATEGORIES_KEY: &str = "subcategories";
pub const EXPENSES_KEY: &str = "expenses";
pub const CREDENTIALS_KEY: &str = "credentials";
pub const SETTINGS_KEY: &str = "settings";
pub const USE_CASE_KEY: &str = "useCase";

/// Everything the application persists, in the flat shape it is stored in.
///
/// Records are kept as the JSON objects that were written, so fields this crate does not
/// model survive a restore and a later backup unchanged. The typed accessors read them
/// on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullState {
    pub users: Vec<Value>,
    pub categories: Vec<Value>,
    pub subcategories: Vec<Value>,
    pub expenses: Vec<Value>,
    pub credentials: Value,
    pub settings: Value,
    pub use_case: String,
}

impl FullState {
    pub fn empty(use_case: &str) -> Self {
        Self {
            users: Vec::new(),
            categories: Vec::new(),
            subcategories: Vec::new(),
            expenses: Vec::new(),
            credentials: json!({}),
            settings: json!({}),
            use_case: use_case.to_string(),
        }
    }

    /// Users that read as [`User`]; other records are skipped with a warning.
    pub fn users(&self) -> Vec<User> {
        readable_records(USERS_KEY, &self.users)
    }

    pub fn expenses(&self) -> Vec<Expense> {
        readable_records(EXPENSES_KEY, &self.expenses)
    }

    /// Categories with their subcategories attached, both in stored order.
    pub fn nested_categories(&self) -> Vec<Category> {
        let subcategories = readable_records::<Subcategory>(SUBCATEGORIES_KEY, &self.subcategories);
        readable_records::<CategoryRecord>(CATEGORIES_KEY, &self.categories)
            .into_iter()
            .map(|record| Category {
                subcategories: subcategories
                    .iter()
                    .filter(|subcategory| subcategory.category_id == record.id)
                    .cloned()
                    .collect(),
                id: record.id,
                name: record.name,
                icon: record.icon,
                color: record.color,
            })
            .collect()
    }

    pub(crate) fn append_users(&mut self, users: &[User]) -> ClientResult<()> {
        self.users.extend(to_records(users)?);
        Ok(())
    }

    pub(crate) fn append_categories(&mut self, categories: &[Category]) -> ClientResult<()> {
        for category in categories {
            self.categories.push(to_record(&category.record())?);
            self.subcategories.extend(to_records(&category.subcategories)?);
        }
        Ok(())
    }

    pub(crate) fn append_expenses(&mut self, expenses: &[Expense]) -> ClientResult<()> {
        self.expenses.extend(to_records(expenses)?);
        Ok(())
    }
}

/// String field of a stored record, if it has one.
pub(crate) fn record_text<'a>(record: &'a Value, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

/// Reads every record of a collection, reporting the position and cause of each one that
/// does not fit `T`.
pub(crate) fn read_records<T: DeserializeOwned>(
    records: &[Value],
) -> (Vec<T>, Vec<(usize, String)>) {
    let mut typed = Vec::new();
    let mut unreadable = Vec::new();
    for (index, record) in records.iter().enumerate() {
        match serde_json::from_value::<T>(record.clone()) {
            Ok(value) => typed.push(value),
            Err(error) => unreadable.push((index, error.to_string())),
        }
    }
    (typed, unreadable)
}

fn readable_records<T: DeserializeOwned>(collection: &str, records: &[Value]) -> Vec<T> {
    let (typed, unreadable) = read_records::<T>(records);
    for (index, reason) in unreadable {
        warn!(collection, index, reason = reason.as_str(), "skipping unreadable record");
    }
    typed
}

fn to_record<T: Serialize>(record: &T) -> ClientResult<Value> {
    serde_json::to_value(record)
        .map_err(|error| ClientError::internal_serialization(&error.to_string()))
}

fn to_records<T: Serialize>(records: &[T]) -> ClientResult<Vec<Value>> {
    records.iter().map(to_record).collect()
}

/// The persistence collaborator. Implementations must make `replace_full_state` all or
/// nothing.
pub trait StateStore {
    fn get_full_state(&self) -> ClientResult<FullState>;

    fn replace_full_state(&mut self, state: FullState) -> ClientResult<()>;
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: FullState,
}

impl MemoryStore {
    pub fn new(state: FullState) -> Self {
        Self { state }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(FullState::empty(crate::config::DEFAULT_USE_CASE))
    }
}

impl StateStore for MemoryStore {
    fn get_full_state(&self) -> ClientResult<FullState> {
        Ok(self.state.clone())
    }

    fn replace_full_state(&mut self, state: FullState) -> ClientResult<()> {
        self.state = state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{FullState, read_records};
    use crate::model::User;
    use crate::test_support::{sample_categories, sample_users};

    #[test]
    fn flattening_and_nesting_categories_round_trips() {
        let mut state = FullState::empty("expenses");
        assert!(state.append_categories(&sample_categories()).is_ok());
        assert_eq!(state.categories.len(), 2);
        assert_eq!(state.subcategories.len(), 3);
        assert_eq!(state.nested_categories(), sample_categories());
    }

    #[test]
    fn typed_views_skip_records_that_do_not_fit() {
        let mut state = FullState::empty("expenses");
        assert!(state.append_users(&sample_users()).is_ok());
        state.users.push(json!({"name": "no id"}));
        state.users[0]["createdAt"] = json!("2025-01-01T00:00:00.000Z");

        let users = state.users();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username, "alexc");
        assert_eq!(state.users[0]["createdAt"], "2025-01-01T00:00:00.000Z");

        let (typed, unreadable) = read_records::<User>(&state.users);
        assert_eq!(typed.len(), 2);
        assert_eq!(unreadable.len(), 1);
        assert_eq!(unreadable[0].0, 2);
    }
}
