//! Live table view: every usable table with the order currently on it

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use mesa_postgrest::SortOrder;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{DiningTable, Order, TableStatus};
use crate::Pos;

/// A table and its most recent active order
#[derive(Debug, Clone, PartialEq)]
pub struct TableCard {
    pub table: DiningTable,
    pub order: Option<Order>,
}

impl TableCard {
    /// Time since service started, zero when there is no order
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        self.order
            .as_ref()
            .and_then(Order::started_at)
            .map(|start| elapsed_since(start, now))
            .unwrap_or_else(Duration::zero)
    }

    /// Σ quantity × base price of the current order
    pub fn order_total(&self) -> Decimal {
        self.order
            .as_ref()
            .map(Order::items_total)
            .unwrap_or_default()
    }
}

/// Counts shown on the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FloorSummary {
    pub free: usize,
    pub occupied: usize,
    pub reserved: usize,
    pub maintenance: usize,
    pub open_orders: usize,
    pub open_amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloorView {
    pub cards: Vec<TableCard>,
}

impl FloorView {
    pub fn summary(&self) -> FloorSummary {
        let mut summary = FloorSummary::default();
        for card in &self.cards {
            match card.table.status {
                TableStatus::Free => summary.free += 1,
                TableStatus::Occupied => summary.occupied += 1,
                TableStatus::Reserved => summary.reserved += 1,
                TableStatus::Maintenance => summary.maintenance += 1,
            }
            if card.order.is_some() {
                summary.open_orders += 1;
                summary.open_amount = summary.open_amount.saturating_add(card.order_total());
            }
        }
        summary
    }
}

/// Loads the floor
pub struct Floor<'a> {
    pos: &'a Pos,
}

impl<'a> Floor<'a> {
    pub(crate) fn new(pos: &'a Pos) -> Self {
        Self { pos }
    }

    /// Tables not under maintenance by name, paired with active orders
    pub async fn load(&self) -> Result<FloorView> {
        let tables = self
            .pos
            .from("tables")?
            .select("*")
            .neq("status", TableStatus::Maintenance.as_str())
            .order("name", SortOrder::Ascending)
            .execute::<DiningTable>()
            .await?;

        let orders = self.pos.orders().list_active().await?;
        tracing::debug!(tables = tables.len(), orders = orders.len(), "floor loaded");

        Ok(FloorView {
            cards: pair_tables(tables, orders),
        })
    }
}

/// Attach to each table the first of `orders` (newest first) placed on it
pub fn pair_tables(tables: Vec<DiningTable>, orders: Vec<Order>) -> Vec<TableCard> {
    let mut by_table: HashMap<i64, Order> = HashMap::new();
    for order in orders {
        if let Some(table_id) = order.table_id {
            by_table.entry(table_id).or_insert(order);
        }
    }

    tables
        .into_iter()
        .map(|table| {
            let order = by_table.remove(&table.id);
            TableCard { table, order }
        })
        .collect()
}

/// Never negative, even with a start time in the future
pub fn elapsed_since(start: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - start).max(Duration::zero())
}

/// `1h 5m`
pub fn format_elapsed(elapsed: Duration) -> String {
    let minutes = elapsed.num_minutes().max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// `HH:MM:SS`
pub fn format_clock(elapsed: Duration) -> String {
    let seconds = elapsed.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}
