//! Form validation
//!
//! Each form is checked before it is written. Failures are collected per
//! field so the caller can show every problem at once.

use std::collections::BTreeMap;
use std::fmt;

use crate::models::{CategoryForm, ProductForm, ProductOptionForm, TableForm};

pub const CATEGORY_NAME_MAX_LEN: usize = 50;

/// Upper bound for a product or add-on price
pub const MAX_PRICE: f64 = 1_000_000.0;

/// Field name → message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        // First message per field wins
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Something that can be checked before submission
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

fn required(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "is required");
    }
}

fn non_negative_price(errors: &mut ValidationErrors, field: &'static str, value: f64) {
    if !value.is_finite() {
        errors.add(field, "must be a number");
    } else if value < 0.0 {
        errors.add(field, "must be zero or greater");
    } else if value > MAX_PRICE {
        errors.add(field, format!("must be at most {}", MAX_PRICE));
    }
}

impl Validate for TableForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        required(&mut errors, "name", &self.name);
        if self.capacity <= 0 {
            errors.add("capacity", "must be greater than zero");
        }
        required(&mut errors, "code", &self.code);
        if self.shape.is_none() {
            errors.add("shape", "is required");
        }
        errors.into_result()
    }
}

impl Validate for CategoryForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        required(&mut errors, "name", &self.name);
        if self.name.trim().chars().count() > CATEGORY_NAME_MAX_LEN {
            errors.add(
                "name",
                format!("must be at most {} characters", CATEGORY_NAME_MAX_LEN),
            );
        }
        required(&mut errors, "color", &self.color);
        required(&mut errors, "icon", &self.icon);
        errors.into_result()
    }
}

impl Validate for ProductForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        required(&mut errors, "name", &self.name);
        non_negative_price(&mut errors, "base_price", self.base_price);
        errors.into_result()
    }
}

impl Validate for ProductOptionForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        required(&mut errors, "name", &self.name);
        non_negative_price(&mut errors, "additional_price", self.additional_price);
        errors.into_result()
    }
}
