use serde::{Deserialize, Serialize};

pub const DEFAULT_CATEGORY_ICON: &str = "Tag";
pub const DEFAULT_CATEGORY_COLOR: &str = "text-blue-600";
pub const DEFAULT_USER_COLOR: &str = "bg-blue-500";

pub const CATEGORY_ICONS: [&str; 30] = [
    "Tag",
    "UtensilsCrossed",
    "Car",
    "Home",
    "ShoppingBag",
    "ShoppingCart",
    "Heart",
    "Gamepad2",
    "Plane",
    "GraduationCap",
    "Briefcase",
    "Gift",
    "Zap",
    "Coffee",
    "Music",
    "Book",
    "Shirt",
    "Baby",
    "Dumbbell",
    "Stethoscope",
    "Wrench",
    "PiggyBank",
    "CreditCard",
    "Smartphone",
    "Film",
    "Fuel",
    "Bus",
    "PawPrint",
    "Receipt",
    "Wifi",
];

pub const CATEGORY_COLORS: [&str; 12] = [
    "text-blue-600",
    "text-green-600",
    "text-purple-600",
    "text-orange-600",
    "text-red-600",
    "text-pink-600",
    "text-indigo-600",
    "text-yellow-600",
    "text-teal-600",
    "text-cyan-600",
    "text-gray-600",
    "text-emerald-600",
];

pub const USER_COLORS: [&str; 10] = [
    "bg-blue-500",
    "bg-green-500",
    "bg-purple-500",
    "bg-red-500",
    "bg-yellow-500",
    "bg-pink-500",
    "bg-indigo-500",
    "bg-teal-500",
    "bg-orange-500",
    "bg-cyan-500",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub color: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_subcategory_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_store_location: Option<String>,
}

fn default_active() -> bool {
    true
}

/// A category with its subcategories nested, the shape validators work with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
}

/// A category as it is persisted and backed up: subcategories live in their own collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub id: String,
    pub name: String,
    pub category_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    pub data: String,
    pub uploaded_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub subcategory_id: String,
    pub amount: f64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_location: Option<String>,
    pub date: String,
    pub created_at: String,
}

impl Category {
    pub fn record(&self) -> CategoryRecord {
        CategoryRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            icon: self.icon.clone(),
            color: self.color.clone(),
        }
    }
}

pub fn is_category_icon(value: &str) -> bool {
    CATEGORY_ICONS.contains(&value)
}

pub fn is_category_color(value: &str) -> bool {
    CATEGORY_COLORS.contains(&value)
}

pub fn is_user_color(value: &str) -> bool {
    USER_COLORS.contains(&value)
}

/// Numeric value of an id such as `"12"`; ids like `"1-1"` have none.
pub(crate) fn numeric_id(id: &str) -> Option<u64> {
    id.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::{Expense, User, is_category_icon, numeric_id};

    #[test]
    fn user_reads_camel_case_and_defaults_active() {
        let parsed = serde_json::from_str::<User>(
            r#"{"id":"1","name":"Alex Chen","username":"alexc","email":"alex@x.com","defaultCategoryId":"2"}"#,
        );
        assert!(parsed.is_ok());
        if let Ok(user) = parsed {
            assert!(user.is_active);
            assert_eq!(user.default_category_id.as_deref(), Some("2"));
            assert_eq!(user.avatar, "");
        }
    }

    #[test]
    fn expense_attachment_mime_type_uses_type_key() {
        let parsed = serde_json::from_str::<Expense>(
            r#"{"id":"e1","userId":"1","categoryId":"1","subcategoryId":"1-1","amount":3.5,
                "description":"Tea","date":"2025-01-02","createdAt":"2025-01-02T08:00:00.000Z",
                "attachments":[{"id":"a1","name":"r.png","type":"image/png","size":4,"data":"AAAA","uploadedAt":"2025-01-02T08:00:00.000Z"}]}"#,
        );
        assert!(parsed.is_ok());
        if let Ok(expense) = parsed {
            let attachments = expense.attachments.unwrap_or_default();
            assert_eq!(attachments[0].mime_type, "image/png");
            assert!(expense.notes.is_none());
        }
    }

    #[test]
    fn numeric_id_ignores_compound_ids() {
        assert_eq!(numeric_id(" 7 "), Some(7));
        assert_eq!(numeric_id("1-1"), None);
        assert!(is_category_icon("UtensilsCrossed"));
        assert!(!is_category_icon("utensils"));
    }
}
