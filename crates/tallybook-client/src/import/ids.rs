//! Identifier assignment for imported entities.
//!
//! Users, categories and subcategories are always re-keyed from sequential counters that
//! start one past the largest numeric id already stored; ids in the input are ignored.
//! Expenses keep a supplied id so references survive a round trip, and get a random one
//! otherwise.
//!
//! Counters are wider than any stored numeric id, so the id after `u64::MAX` is still
//! distinct from it.

use ulid::Ulid;

use crate::model::{Category, User, numeric_id};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct IdCounters {
    next_category: u128,
    next_subcategory: u128,
    next_user: u128,
}

impl Default for IdCounters {
    fn default() -> Self {
        Self {
            next_category: 1,
            next_subcategory: 1,
            next_user: 1,
        }
    }
}

impl IdCounters {
    pub fn from_existing(users: &[User], categories: &[Category]) -> Self {
        let max_category = max_numeric(categories.iter().map(|category| category.id.as_str()));
        let max_subcategory = max_numeric(
            categories
                .iter()
                .flat_map(|category| category.subcategories.iter())
                .map(|subcategory| subcategory.id.as_str()),
        );
        let max_user = max_numeric(users.iter().map(|user| user.id.as_str()));

        Self {
            next_category: max_category.saturating_add(1),
            next_subcategory: max_subcategory.saturating_add(1),
            next_user: max_user.saturating_add(1),
        }
    }

    pub fn next_category_id(&mut self) -> String {
        take(&mut self.next_category)
    }

    pub fn next_subcategory_id(&mut self) -> String {
        take(&mut self.next_subcategory)
    }

    pub fn next_user_id(&mut self) -> String {
        take(&mut self.next_user)
    }
}

fn take(counter: &mut u128) -> String {
    let value = *counter;
    *counter = counter.saturating_add(1);
    value.to_string()
}

fn max_numeric<'a>(ids: impl Iterator<Item = &'a str>) -> u128 {
    ids.filter_map(numeric_id).max().map(u128::from).unwrap_or(0)
}

/// The supplied id when present, otherwise a fresh 36-character hyphenated hex id.
pub fn expense_id(supplied: Option<&str>) -> String {
    match supplied.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => generate_expense_id(),
    }
}

pub(crate) fn generate_expense_id() -> String {
    let value = Ulid::new().0;
    format!(
        "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
        (value >> 96) as u32,
        (value >> 80) as u16,
        (value >> 64) as u16,
        (value >> 48) as u16,
        (value & 0xffff_ffff_ffff) as u64
    )
}
