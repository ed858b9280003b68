//! Matches identifying fields from an import row against existing reference data.
//!
//! Each lookup is a pure function returning an optional match; a resolution is an ordered
//! list of `(raw value, lookup)` candidates where blank values are skipped and the first hit
//! wins.

use thiserror::Error;

use crate::model::{Category, Subcategory, User};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EntityKind {
    User,
    Category,
    Subcategory,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Category => "Category",
            Self::Subcategory => "Subcategory",
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
#[error("{} not found", .0.label())]
pub struct NotFound(pub EntityKind);

pub(crate) type Lookup<T> = for<'a> fn(&str, &'a [T]) -> Option<&'a T>;

pub(crate) fn first_match<'a, T>(
    candidates: &[(&str, Lookup<T>)],
    items: &'a [T],
) -> Option<&'a T> {
    candidates
        .iter()
        .map(|(raw, lookup)| (raw.trim(), lookup))
        .filter(|(raw, _)| !raw.is_empty())
        .find_map(|(raw, lookup)| lookup(raw, items))
}

pub(crate) fn same_text(left: &str, right: &str) -> bool {
    left.trim().to_lowercase() == right.trim().to_lowercase()
}

fn user_by_id<'a>(raw: &str, users: &'a [User]) -> Option<&'a User> {
    users.iter().find(|user| user.id == raw)
}

fn user_by_name<'a>(raw: &str, users: &'a [User]) -> Option<&'a User> {
    users.iter().find(|user| same_text(&user.name, raw))
}

fn user_by_username<'a>(raw: &str, users: &'a [User]) -> Option<&'a User> {
    users.iter().find(|user| same_text(&user.username, raw))
}

fn user_by_email<'a>(raw: &str, users: &'a [User]) -> Option<&'a User> {
    users.iter().find(|user| same_text(&user.email, raw))
}

fn category_by_id<'a>(raw: &str, categories: &'a [Category]) -> Option<&'a Category> {
    categories.iter().find(|category| category.id == raw)
}

fn category_by_name<'a>(raw: &str, categories: &'a [Category]) -> Option<&'a Category> {
    categories
        .iter()
        .find(|category| same_text(&category.name, raw))
}

fn subcategory_by_id<'a>(raw: &str, subcategories: &'a [Subcategory]) -> Option<&'a Subcategory> {
    subcategories
        .iter()
        .find(|subcategory| subcategory.id == raw)
}

fn subcategory_by_name<'a>(
    raw: &str,
    subcategories: &'a [Subcategory],
) -> Option<&'a Subcategory> {
    subcategories
        .iter()
        .find(|subcategory| same_text(&subcategory.name, raw))
}

/// Tries `raw` as an id, then as a name, username and email.
pub fn resolve_user<'a>(raw: &str, users: &'a [User]) -> Result<&'a User, NotFound> {
    user_from_fields(raw, raw, raw, raw, users)
}

pub fn resolve_category<'a>(
    raw: &str,
    categories: &'a [Category],
) -> Result<&'a Category, NotFound> {
    category_from_fields(raw, raw, categories)
}

/// Searches only the subcategories owned by `category`.
pub fn resolve_subcategory<'a>(
    raw: &str,
    category: &'a Category,
) -> Result<&'a Subcategory, NotFound> {
    subcategory_from_fields(raw, raw, category)
}

pub(crate) fn user_from_fields<'a>(
    id: &str,
    name: &str,
    username: &str,
    email: &str,
    users: &'a [User],
) -> Result<&'a User, NotFound> {
    let candidates: [(&str, Lookup<User>); 4] = [
        (id, user_by_id),
        (name, user_by_name),
        (username, user_by_username),
        (email, user_by_email),
    ];
    first_match(&candidates, users).ok_or(NotFound(EntityKind::User))
}

pub(crate) fn category_from_fields<'a>(
    id: &str,
    name: &str,
    categories: &'a [Category],
) -> Result<&'a Category, NotFound> {
    let candidates: [(&str, Lookup<Category>); 2] =
        [(id, category_by_id), (name, category_by_name)];
    first_match(&candidates, categories).ok_or(NotFound(EntityKind::Category))
}

pub(crate) fn subcategory_from_fields<'a>(
    id: &str,
    name: &str,
    category: &'a Category,
) -> Result<&'a Subcategory, NotFound> {
    let candidates: [(&str, Lookup<Subcategory>); 2] =
        [(id, subcategory_by_id), (name, subcategory_by_name)];
    first_match(&candidates, &category.subcategories).ok_or(NotFound(EntityKind::Subcategory))
}
