use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryStatus {
    #[serde(rename = "activa")]
    Active,
    #[serde(rename = "inactiva")]
    Inactive,
}

impl CategoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryStatus::Active => "activa",
            CategoryStatus::Inactive => "inactiva",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            CategoryStatus::Active => CategoryStatus::Inactive,
            CategoryStatus::Inactive => CategoryStatus::Active,
        }
    }
}

/// A row of `categories`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    /// An emoji
    #[serde(default)]
    pub icon: Option<String>,
    pub status: CategoryStatus,
}

/// Category embedded in a product row, either the full row
/// (`category:categories(*)`) or only its name (`categories(name)`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Values submitted by the category form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryForm {
    pub name: String,
    pub color: String,
    pub icon: String,
    pub status: CategoryStatus,
}

impl Default for CategoryForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: String::new(),
            icon: String::new(),
            status: CategoryStatus::Active,
        }
    }
}

impl From<&Category> for CategoryForm {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            color: category.color.clone().unwrap_or_default(),
            icon: category.icon.clone().unwrap_or_default(),
            status: category.status,
        }
    }
}
