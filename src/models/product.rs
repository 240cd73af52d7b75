use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CategoryRef;
use crate::money;

/// Products with fewer units than this are flagged on the product page
pub const LOW_STOCK_THRESHOLD: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductStatus {
    #[serde(rename = "activo")]
    Active,
    #[serde(rename = "inactivo")]
    Inactive,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "activo",
            ProductStatus::Inactive => "inactivo",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ProductStatus::Active => ProductStatus::Inactive,
            ProductStatus::Inactive => ProductStatus::Active,
        }
    }
}

/// A row of `products`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub base_price: f64,
    #[serde(default)]
    pub stock: Option<i32>,
    pub status: ProductStatus,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub url_image: Option<String>,
    #[serde(default, alias = "categories", skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryRef>,
}

impl Product {
    pub fn price(&self) -> Decimal {
        money::to_decimal(self.base_price)
    }

    pub fn is_low_stock(&self) -> bool {
        matches!(self.stock, Some(stock) if stock < LOW_STOCK_THRESHOLD)
    }

    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.name.as_str())
    }
}

/// Values submitted by the product form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductForm {
    pub name: String,
    pub description: Option<String>,
    pub base_price: f64,
    pub stock: Option<i32>,
    pub status: ProductStatus,
    pub category_id: Option<i64>,
    pub url_image: Option<String>,
}

impl Default for ProductForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            base_price: 0.0,
            stock: None,
            status: ProductStatus::Active,
            category_id: None,
            url_image: None,
        }
    }
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            base_price: product.base_price,
            stock: product.stock,
            status: product.status,
            category_id: product.category_id,
            url_image: product.url_image.clone(),
        }
    }
}

/// A row of `product_options`, an add-on such as extra cheese
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductOption {
    pub id: i64,
    pub name: String,
    pub additional_price: f64,
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

/// Values submitted by the product option form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductOptionForm {
    pub name: String,
    pub additional_price: f64,
    pub product_id: Option<i64>,
    pub is_available: bool,
}

impl Default for ProductOptionForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            additional_price: 0.0,
            product_id: None,
            is_available: true,
        }
    }
}

/// Snapshot of an add-on chosen for an order line, stored with the line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedOption {
    pub id: i64,
    pub name: String,
    pub additional_price: f64,
}

impl SelectedOption {
    pub fn price(&self) -> Decimal {
        money::to_decimal(self.additional_price)
    }
}

impl From<&ProductOption> for SelectedOption {
    fn from(option: &ProductOption) -> Self {
        Self {
            id: option.id,
            name: option.name.clone(),
            additional_price: option.additional_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn low_stock_below_ten() {
        let mut product: Product = serde_json::from_value(json!({
            "id": 1, "name": "Inca Kola", "base_price": 5.0, "status": "activo", "stock": 9
        }))
        .unwrap();
        assert!(product.is_low_stock());

        product.stock = Some(10);
        assert!(!product.is_low_stock());

        product.stock = None;
        assert!(!product.is_low_stock());
    }

    #[test]
    fn category_embed_under_either_key() {
        let by_alias: Product = serde_json::from_value(json!({
            "id": 1, "name": "Ceviche", "base_price": 30.0, "status": "activo",
            "category_id": 2, "categories": { "name": "Entradas" }
        }))
        .unwrap();
        assert_eq!(by_alias.category_name(), Some("Entradas"));

        let full: Product = serde_json::from_value(json!({
            "id": 1, "name": "Ceviche", "base_price": 30.0, "status": "activo",
            "category": { "id": 2, "name": "Entradas", "icon": "🥗", "color": "#0f0", "status": "activa" }
        }))
        .unwrap();
        assert_eq!(full.category.unwrap().id, Some(2));
    }

    #[test]
    fn option_availability_defaults_to_true() {
        let option: ProductOption = serde_json::from_value(json!({
            "id": 3, "name": "Extra queso", "additional_price": 2.5
        }))
        .unwrap();
        assert!(option.is_available);
        assert_eq!(option.product_id, None);
    }
}
