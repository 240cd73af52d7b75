//! Category sidebar and product filtering for the menu screens

use crate::models::{Category, Product};

pub const ALL_PRODUCTS_LABEL: &str = "Todos los productos";
pub const ALL_PRODUCTS_ICON: &str = "📦";
pub const DEFAULT_CATEGORY_ICON: &str = "📋";

/// Which products are shown; carried in the `?category=` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Category(i64),
}

impl CategoryFilter {
    /// `None` and `all` mean every product. Values that are not a category
    /// id fall back to every product.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some("all") => CategoryFilter::All,
            Some(raw) => match raw.parse::<i64>() {
                Ok(id) => CategoryFilter::Category(id),
                Err(_) => {
                    tracing::warn!(value = raw, "unknown category filter, showing all products");
                    CategoryFilter::All
                }
            },
        }
    }

    /// Value for the query parameter; `None` drops the parameter
    pub fn query_value(&self) -> Option<String> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Category(id) => Some(id.to_string()),
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(id) => product.category_id == Some(*id),
        }
    }
}

pub fn filter_products<'p>(products: &'p [Product], filter: CategoryFilter) -> Vec<&'p Product> {
    products.iter().filter(|p| filter.matches(p)).collect()
}

/// One button of the category sidebar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarEntry {
    pub label: String,
    pub icon: String,
    pub filter: CategoryFilter,
    pub selected: bool,
}

/// "All products" followed by one entry per category, in the given order
pub fn sidebar(categories: &[Category], selected: CategoryFilter) -> Vec<SidebarEntry> {
    let all = SidebarEntry {
        label: ALL_PRODUCTS_LABEL.to_string(),
        icon: ALL_PRODUCTS_ICON.to_string(),
        filter: CategoryFilter::All,
        selected: selected == CategoryFilter::All,
    };

    std::iter::once(all)
        .chain(categories.iter().map(|category| {
            let filter = CategoryFilter::Category(category.id);
            SidebarEntry {
                label: category.name.clone(),
                icon: category
                    .icon
                    .clone()
                    .filter(|icon| !icon.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_CATEGORY_ICON.to_string()),
                filter,
                selected: selected == filter,
            }
        }))
        .collect()
}
