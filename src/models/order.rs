use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Product, SelectedOption, TableRef, UserProfile};
use crate::error::Error;
use crate::money;

/// Lifecycle of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    InPreparation,
    Served,
    PendingPayment,
    Closed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::InPreparation,
        OrderStatus::Served,
        OrderStatus::PendingPayment,
        OrderStatus::Closed,
        OrderStatus::Cancelled,
    ];

    /// Statuses shown on the floor
    pub const ACTIVE: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::InPreparation,
        OrderStatus::Served,
        OrderStatus::PendingPayment,
    ];

    /// Token written to the database
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pendiente",
            OrderStatus::InPreparation => "en preparación",
            OrderStatus::Served => "servido",
            OrderStatus::PendingPayment => "pendiente de pago",
            OrderStatus::Closed => "cerrado",
            OrderStatus::Cancelled => "cancelado",
        }
    }

    /// Every token a row in this status may carry: the written one first,
    /// then the older English ones still found in existing rows
    pub fn tokens(&self) -> &'static [&'static str] {
        match self {
            OrderStatus::Pending => &["pendiente", "pending"],
            OrderStatus::InPreparation => &["en preparación", "preparing", "in_progress"],
            OrderStatus::Served => &["servido", "served"],
            OrderStatus::PendingPayment => &["pendiente de pago", "pending_payment"],
            OrderStatus::Closed => &["cerrado", "completed", "closed"],
            OrderStatus::Cancelled => &["cancelado", "cancelled"],
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, OrderStatus::Closed | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    /// Accepts the stored tokens and the older English ones
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.tokens().iter().any(|t| *t == token))
            .ok_or_else(|| Error::general(format!("unknown order status: {}", token)))
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// Rows created before the status column was filled in read as pending.
fn status_or_pending<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OrderStatus, D::Error> {
    Ok(Option::<OrderStatus>::deserialize(deserializer)?.unwrap_or(OrderStatus::Pending))
}

fn default_status() -> OrderStatus {
    OrderStatus::Pending
}

/// A row of `orders`, with whatever was embedded by the select
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    #[serde(default)]
    pub table_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_status", deserialize_with = "status_or_pending")]
    pub status: OrderStatus,
    #[serde(default, with = "super::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, alias = "tables", skip_serializing_if = "Option::is_none")]
    pub table: Option<TableRef>,
    #[serde(default, alias = "users", skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub order_items: Vec<OrderItem>,
}

impl Order {
    /// Σ quantity × base price of the embedded items. Add-ons are not
    /// included; this is the figure shown on floor cards and in history.
    pub fn items_total(&self) -> Decimal {
        money::sum(self.order_items.iter().map(OrderItem::base_amount))
    }

    /// Σ (base price + add-ons) × quantity
    pub fn total_with_options(&self) -> Decimal {
        money::sum(self.order_items.iter().map(OrderItem::subtotal))
    }

    pub fn item_count(&self) -> i32 {
        self.order_items.iter().fold(0i32, |n, item| n.saturating_add(item.quantity))
    }

    /// When service started: `start_time`, or creation for older rows
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.start_time.or(self.created_at)
    }
}

/// A row of `order_items`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub options: Vec<SelectedOption>,
    #[serde(default, alias = "products", skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

impl OrderItem {
    fn base_price(&self) -> Decimal {
        self.product
            .as_ref()
            .map(Product::price)
            .unwrap_or_default()
    }

    /// quantity × base price
    pub fn base_amount(&self) -> Decimal {
        money::times(self.base_price(), self.quantity)
    }

    /// (base price + Σ add-ons) × quantity
    pub fn subtotal(&self) -> Decimal {
        let unit = money::sum(
            std::iter::once(self.base_price()).chain(self.options.iter().map(SelectedOption::price)),
        );
        money::times(unit, self.quantity)
    }

    pub fn subtotal_f64(&self) -> f64 {
        money::to_f64(self.subtotal())
    }
}

/// One line sent to `replace_order_items`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: i32,
    pub notes: Option<String>,
    pub options: Vec<SelectedOption>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order_with_items() -> Order {
        serde_json::from_value(json!({
            "id": 1,
            "table_id": 2,
            "status": "servido",
            "created_at": "2024-05-01T12:00:00+00:00",
            "start_time": null,
            "order_items": [
                {
                    "id": 10, "order_id": 1, "product_id": 5, "quantity": 2,
                    "notes": "sin cebolla",
                    "options": [{ "id": 1, "name": "Extra crema", "additional_price": 1.5 }],
                    "product": { "id": 5, "name": "Lomo saltado", "base_price": 25.9, "status": "activo" }
                },
                {
                    "id": 11, "order_id": 1, "product_id": 6, "quantity": 3,
                    "options": null,
                    "product": { "id": 6, "name": "Chicha", "base_price": 0.1, "status": "activo" }
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn legacy_tokens_read_as_canonical_status() {
        assert_eq!("pending".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert_eq!(
            "in_progress".parse::<OrderStatus>().unwrap(),
            OrderStatus::InPreparation
        );
        assert_eq!("completed".parse::<OrderStatus>().unwrap(), OrderStatus::Closed);
        assert!("lost".parse::<OrderStatus>().is_err());

        for status in OrderStatus::ALL {
            assert_eq!(serde_json::to_value(status).unwrap(), json!(status.as_str()));
        }
    }

    #[test]
    fn tokens_start_with_the_written_one() {
        for status in OrderStatus::ALL {
            assert_eq!(status.tokens()[0], status.as_str());
            for token in status.tokens() {
                assert_eq!(token.parse::<OrderStatus>().unwrap(), status);
            }
        }
        assert_eq!(OrderStatus::Closed.tokens(), ["cerrado", "completed", "closed"]);
    }

    #[test]
    fn active_statuses() {
        let active: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(OrderStatus::is_active)
            .collect();
        assert_eq!(active, OrderStatus::ACTIVE.to_vec());
    }

    #[test]
    fn null_status_reads_as_pending() {
        let order: Order = serde_json::from_value(json!({ "id": 3, "status": null })).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.order_items.is_empty());
    }

    #[test]
    fn totals() {
        let order = order_with_items();

        // 2 × 25.90 + 3 × 0.10
        assert_eq!(money::to_f64(order.items_total()), 52.1);
        // 2 × (25.90 + 1.50) + 3 × 0.10
        assert_eq!(money::to_f64(order.total_with_options()), 55.1);
        assert_eq!(order.item_count(), 5);
        assert_eq!(order.order_items[0].subtotal_f64(), 54.8);
    }

    #[test]
    fn started_at_falls_back_to_creation() {
        let order = order_with_items();
        assert_eq!(order.started_at(), order.created_at);
    }
}
