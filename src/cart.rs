//! Order composition
//!
//! A cart holds the lines of one order while it is being composed or edited.
//! Lines get a local id so two lines of the same product (with different
//! notes or add-ons) can be edited independently. Nothing is written until
//! [`OrderStore::save_cart`](crate::store::OrderStore::save_cart).

use std::time::{SystemTime, UNIX_EPOCH};

use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::models::{NewOrderItem, Order, Product, ProductOption, SelectedOption};
use crate::money::{self, parse_amount, round_money, to_decimal};

/// Largest quantity a single line can hold
pub const MAX_QUANTITY: i32 = 9_999;

/// One line of the cart
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    /// Local id, unique within this cart only
    pub id: String,
    pub product: Product,
    pub quantity: i32,
    pub notes: String,
    pub options: Vec<SelectedOption>,
}

impl CartItem {
    fn new(product: Product, quantity: i32) -> Self {
        Self {
            id: local_id(),
            product,
            quantity,
            notes: String::new(),
            options: Vec::new(),
        }
    }

    /// Base price plus the selected add-ons
    pub fn unit_price(&self) -> Decimal {
        money::sum(
            std::iter::once(self.product.price())
                .chain(self.options.iter().map(SelectedOption::price)),
        )
    }

    pub fn line_total(&self) -> Decimal {
        money::times(self.unit_price(), self.quantity)
    }
}

/// Detached copy of a line being edited in the notes/add-ons dialog.
/// Changes reach the cart only through [`OrderCart::save_item_options`].
#[derive(Debug, Clone, PartialEq)]
pub struct ItemEditor {
    item: CartItem,
}

impl ItemEditor {
    pub fn item_id(&self) -> &str {
        &self.item.id
    }

    pub fn product(&self) -> &Product {
        &self.item.product
    }

    pub fn notes(&self) -> &str {
        &self.item.notes
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.item.notes = notes.into();
    }

    pub fn options(&self) -> &[SelectedOption] {
        &self.item.options
    }

    pub fn is_selected(&self, option_id: i64) -> bool {
        self.item.options.iter().any(|o| o.id == option_id)
    }

    /// Select the add-on, or deselect it when already selected
    pub fn toggle_option(&mut self, option: &ProductOption) {
        if self.is_selected(option.id) {
            self.item.options.retain(|o| o.id != option.id);
        } else {
            self.item.options.push(SelectedOption::from(option));
        }
    }

    /// Line total with the pending changes
    pub fn preview_total(&self) -> Decimal {
        self.item.line_total()
    }
}

/// Derived amounts, rounded to cents. `total == subtotal + tax - discount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

/// Lines of one order plus the discount and tax rate
#[derive(Debug, Clone)]
pub struct OrderCart {
    order_id: Option<i64>,
    table_id: Option<i64>,
    items: Vec<CartItem>,
    discount: Decimal,
    tax_rate: Decimal,
}

impl OrderCart {
    /// An empty cart for a new order
    pub fn new(table_id: Option<i64>, tax_rate: f64) -> Self {
        Self {
            order_id: None,
            table_id,
            items: Vec::new(),
            discount: Decimal::ZERO,
            tax_rate: to_decimal(tax_rate),
        }
    }

    /// Rebuild the cart of a saved order. Its rows must embed their product.
    pub fn from_order(order: &Order, tax_rate: f64) -> Result<Self> {
        let mut cart = Self::new(order.table_id, tax_rate);
        cart.order_id = Some(order.id);

        for row in &order.order_items {
            if row.quantity < 1 {
                tracing::warn!(
                    id = row.id,
                    quantity = row.quantity,
                    "skipping order item without quantity"
                );
                continue;
            }
            let product = row.product.clone().ok_or_else(|| {
                Error::general(format!(
                    "order item {} was loaded without its product",
                    row.id
                ))
            })?;
            let mut item = CartItem::new(product, row.quantity.min(MAX_QUANTITY));
            item.notes = row.notes.clone().unwrap_or_default();
            item.options = row.options.clone();
            cart.items.push(item);
        }

        Ok(cart)
    }

    pub fn order_id(&self) -> Option<i64> {
        self.order_id
    }

    pub fn table_id(&self) -> Option<i64> {
        self.table_id
    }

    pub fn set_table(&mut self, table_id: Option<i64>) {
        self.table_id = table_id;
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append a new line with quantity 1. Adding a product twice gives two lines.
    pub fn add_product(&mut self, product: &Product) -> &CartItem {
        self.items.push(CartItem::new(product.clone(), 1));
        let index = self.items.len() - 1;
        &self.items[index]
    }

    /// Set a line's quantity; below 1 removes the line, above
    /// [`MAX_QUANTITY`] is capped
    pub fn update_item_quantity(&mut self, id: &str, quantity: i32) {
        if quantity < 1 {
            self.remove_item(id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.quantity = quantity.min(MAX_QUANTITY);
        }
    }

    pub fn increment(&mut self, id: &str) {
        if let Some(quantity) = self.item(id).map(|item| item.quantity) {
            self.update_item_quantity(id, quantity.saturating_add(1));
        }
    }

    pub fn decrement(&mut self, id: &str) {
        if let Some(quantity) = self.item(id).map(|item| item.quantity) {
            self.update_item_quantity(id, quantity.saturating_sub(1));
        }
    }

    pub fn remove_item(&mut self, id: &str) {
        self.items.retain(|item| item.id != id);
    }

    /// Start editing a line's notes and add-ons
    pub fn open_edit_modal(&self, id: &str) -> Option<ItemEditor> {
        self.item(id).cloned().map(|item| ItemEditor { item })
    }

    /// Write the editor back over the line with the same id. Nothing happens
    /// if the line was removed in the meantime.
    pub fn save_item_options(&mut self, editor: ItemEditor) {
        match self.items.iter_mut().find(|item| item.id == editor.item.id) {
            Some(item) => {
                item.notes = editor.item.notes;
                item.options = editor.item.options;
            }
            None => tracing::debug!(id = %editor.item.id, "edited item no longer in cart"),
        }
    }

    /// Free-form discount input; anything without a leading number is 0
    pub fn set_discount(&mut self, input: &str) {
        self.discount = parse_amount(input);
    }

    pub fn discount(&self) -> Decimal {
        self.discount
    }

    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    pub fn line_total(&self, id: &str) -> Option<Decimal> {
        self.item(id).map(CartItem::line_total)
    }

    pub fn subtotal(&self) -> Decimal {
        money::sum(self.items.iter().map(CartItem::line_total))
    }

    /// Tax is rounded before the total is derived, so the printed figures
    /// always add up. A discount larger than the amount gives a negative total.
    pub fn totals(&self) -> CartTotals {
        let subtotal = round_money(self.subtotal());
        let tax = round_money(subtotal.saturating_mul(self.tax_rate));
        let discount = round_money(self.discount);
        CartTotals {
            subtotal,
            tax,
            discount,
            total: subtotal.saturating_add(tax).saturating_sub(discount),
        }
    }

    pub fn total_f64(&self) -> f64 {
        money::to_f64(self.totals().total)
    }

    /// Rows for `replace_order_items`
    pub fn to_order_items(&self) -> Vec<NewOrderItem> {
        self.items
            .iter()
            .map(|item| NewOrderItem {
                product_id: item.product.id,
                quantity: item.quantity,
                notes: Some(item.notes.trim())
                    .filter(|notes| !notes.is_empty())
                    .map(str::to_string),
                options: item.options.clone(),
            })
            .collect()
    }
}

// Milliseconds since the epoch in base 36 plus a random suffix
fn local_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", to_base36(millis), &suffix[..7])
}

fn to_base36(mut value: u128) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
