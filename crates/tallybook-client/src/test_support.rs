use crate::model::{Category, Expense, Subcategory, User};

pub(crate) fn sample_users() -> Vec<User> {
    vec![
        user("1", "Alex Chen", "alexc", "alex@x.com"),
        user("2", "Sam Lee", "samlee", "sam@x.com"),
    ]
}

pub(crate) fn sample_categories() -> Vec<Category> {
    vec![
        Category {
            id: "1".to_string(),
            name: "Food".to_string(),
            icon: "UtensilsCrossed".to_string(),
            color: "text-orange-600".to_string(),
            subcategories: vec![
                subcategory("1-1", "Groceries", "1"),
                subcategory("1-2", "Restaurants", "1"),
            ],
        },
        Category {
            id: "2".to_string(),
            name: "Transport".to_string(),
            icon: "Car".to_string(),
            color: "text-blue-600".to_string(),
            subcategories: vec![subcategory("2-1", "Fuel", "2")],
        },
    ]
}

pub(crate) fn sample_expense(id: &str) -> Expense {
    Expense {
        id: id.to_string(),
        user_id: "1".to_string(),
        category_id: "1".to_string(),
        subcategory_id: "1-1".to_string(),
        amount: 12.5,
        description: "Milk, eggs".to_string(),
        notes: None,
        attachments: None,
        store_name: Some("Market".to_string()),
        store_location: None,
        date: "2025-01-15".to_string(),
        created_at: "2025-01-15T10:00:00.000Z".to_string(),
    }
}

fn user(id: &str, name: &str, username: &str, email: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        username: username.to_string(),
        email: email.to_string(),
        avatar: String::new(),
        color: "bg-blue-500".to_string(),
        is_active: true,
        default_category_id: None,
        default_subcategory_id: None,
        default_store_location: None,
    }
}

fn subcategory(id: &str, name: &str, category_id: &str) -> Subcategory {
    Subcategory {
        id: id.to_string(),
        name: name.to_string(),
        category_id: category_id.to_string(),
    }
}
