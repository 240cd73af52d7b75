//! Order history: filtered, sortable list of past and current orders

use chrono::NaiveDate;
use mesa_postgrest::{PostgrestClient, SortOrder};

use crate::error::Result;
use crate::models::{Order, OrderStatus};
use crate::Pos;

const SELECT: &str = "*, tables(id,name,code), users(id,email), order_items(*, product:products(*))";

/// Label of orders placed without a table
pub const TAKEAWAY_LABEL: &str = "Takeaway";

/// Columns the history can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    CreatedAt,
    Status,
    StartTime,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::CreatedAt => "created_at",
            SortField::Status => "status",
            SortField::StartTime => "start_time",
        }
    }
}

/// Current sort column and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            order: SortOrder::Descending,
        }
    }
}

impl SortState {
    /// Clicking the current column flips the direction; another column
    /// starts descending.
    pub fn select(self, field: SortField) -> Self {
        if field == self.field {
            let order = match self.order {
                SortOrder::Ascending => SortOrder::Descending,
                SortOrder::Descending => SortOrder::Ascending,
            };
            Self { field, order }
        } else {
            Self {
                field,
                order: SortOrder::Descending,
            }
        }
    }
}

/// Filters of the history page; `None` means unfiltered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub status: Option<OrderStatus>,
    pub date_from: Option<NaiveDate>,
    /// Inclusive: the whole day is covered
    pub date_to: Option<NaiveDate>,
    pub table_id: Option<i64>,
}

impl HistoryFilter {
    fn apply(&self, mut query: PostgrestClient) -> PostgrestClient {
        if let Some(status) = self.status {
            query = query.in_list("status", status.tokens());
        }
        if let Some(from) = self.date_from {
            query = query.gte("created_at", &from.format("%Y-%m-%d").to_string());
        }
        if let Some(to) = self.date_to {
            query = query.lte(
                "created_at",
                &format!("{}T23:59:59", to.format("%Y-%m-%d")),
            );
        }
        if let Some(table_id) = self.table_id {
            query = query.eq("table_id", &table_id.to_string());
        }
        query
    }
}

/// Loads the history page
pub struct History<'a> {
    pos: &'a Pos,
}

impl<'a> History<'a> {
    pub(crate) fn new(pos: &'a Pos) -> Self {
        Self { pos }
    }

    pub async fn fetch(&self, filter: &HistoryFilter, sort: SortState) -> Result<Vec<Order>> {
        let query = filter
            .apply(self.pos.from("orders")?.select(SELECT))
            .order(sort.field.column(), sort.order);
        let orders = query.execute::<Order>().await?;
        tracing::debug!(count = orders.len(), "order history loaded");
        Ok(orders)
    }
}

/// `Takeaway`, the table's name, or `Mesa {id}` when the table was not embedded
pub fn table_label(order: &Order) -> String {
    match (order.table_id, &order.table) {
        (None, _) => TAKEAWAY_LABEL.to_string(),
        (Some(_), Some(table)) => table.name.clone(),
        (Some(id), None) => format!("Mesa {}", id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sort_toggles_and_resets() {
        let sort = SortState::default();
        assert_eq!(sort.field, SortField::CreatedAt);
        assert_eq!(sort.order, SortOrder::Descending);

        let flipped = sort.select(SortField::CreatedAt);
        assert_eq!(flipped.order, SortOrder::Ascending);
        assert_eq!(flipped.select(SortField::CreatedAt).order, SortOrder::Descending);

        let other = flipped.select(SortField::Status);
        assert_eq!(other.field, SortField::Status);
        assert_eq!(other.order, SortOrder::Descending);
    }

    #[test]
    fn table_labels() {
        let takeaway: Order = serde_json::from_value(json!({ "id": 1, "table_id": null })).unwrap();
        assert_eq!(table_label(&takeaway), "Takeaway");

        let named: Order = serde_json::from_value(json!({
            "id": 2, "table_id": 4, "tables": { "id": 4, "name": "Barra", "code": "B1" }
        }))
        .unwrap();
        assert_eq!(table_label(&named), "Barra");

        let bare: Order = serde_json::from_value(json!({ "id": 3, "table_id": 7 })).unwrap();
        assert_eq!(table_label(&bare), "Mesa 7");
    }
}
