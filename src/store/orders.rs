use chrono::Utc;
use mesa_postgrest::SortOrder;
use serde_json::json;

use super::{first_row, update_by_id, TableStore};
use crate::cart::OrderCart;
use crate::error::{Error, Result};
use crate::models::{Order, OrderStatus, TableStatus};
use crate::Pos;

/// Stored function that swaps all items of an order in one transaction
/// (see `sql/replace_order_items.sql`)
pub const REPLACE_ORDER_ITEMS_FN: &str = "replace_order_items";

const TABLE: &str = "orders";
const WITH_ITEMS: &str = "*, order_items(*, product:products(*))";
const WITH_USER_AND_ITEMS: &str = "*, user:users(*), order_items(*, product:products(*))";

/// Orders and their items
pub struct OrderStore<'a> {
    pos: &'a Pos,
}

impl<'a> OrderStore<'a> {
    pub(crate) fn new(pos: &'a Pos) -> Self {
        Self { pos }
    }

    /// An order with its items and their products
    pub async fn get(&self, id: i64) -> Result<Order> {
        self.pos
            .from(TABLE)?
            .select(WITH_ITEMS)
            .eq("id", &id.to_string())
            .execute_one::<Order>()
            .await?
            .ok_or_else(|| Error::not_found(format!("order {}", id)))
    }

    /// Orders still being served, newest first, with waiter and items
    pub async fn list_active(&self) -> Result<Vec<Order>> {
        let statuses: Vec<&str> = OrderStatus::ACTIVE
            .iter()
            .flat_map(|s| s.tokens().iter().copied())
            .collect();
        Ok(self
            .pos
            .from(TABLE)?
            .select(WITH_USER_AND_ITEMS)
            .in_list("status", &statuses)
            .order("created_at", SortOrder::Descending)
            .execute::<Order>()
            .await?)
    }

    /// Empty cart for a new order, taxed at the configured rate
    pub fn new_cart(&self, table_id: Option<i64>) -> OrderCart {
        OrderCart::new(table_id, self.pos.options().tax_rate)
    }

    /// Cart holding the current items of a saved order
    pub async fn load_cart(&self, order_id: i64) -> Result<OrderCart> {
        let order = self.get(order_id).await?;
        OrderCart::from_order(&order, self.pos.options().tax_rate)
    }

    /// Persist a cart and return the order id.
    ///
    /// A new order is created as pending for the signed-in user and its table
    /// is marked occupied. An existing order is moved back to pending. In both
    /// cases the items are replaced wholesale by a single stored-function call.
    pub async fn save_cart(&self, cart: &OrderCart) -> Result<i64> {
        if cart.is_empty() {
            tracing::warn!("refusing to save an order without items");
            return Err(Error::EmptyOrder);
        }

        let (order_id, created) = match cart.order_id() {
            Some(id) => {
                update_by_id(
                    self.pos,
                    TABLE,
                    id,
                    json!({
                        "table_id": cart.table_id(),
                        "status": OrderStatus::Pending,
                    }),
                )
                .await?;
                (id, false)
            }
            None => {
                let inserted = self
                    .pos
                    .from(TABLE)?
                    .insert(json!({
                        "table_id": cart.table_id(),
                        "status": OrderStatus::Pending,
                        "user_id": self.pos.current_user_id(),
                        "start_time": Utc::now().to_rfc3339(),
                    }))
                    .await?;
                let order: Order = first_row(inserted, "created order")?;
                (order.id, true)
            }
        };

        let items = cart.to_order_items();
        let inserted: i64 = self
            .pos
            .rpc(
                REPLACE_ORDER_ITEMS_FN,
                json!({ "p_order_id": order_id, "p_items": items }),
            )?
            .call_rpc()
            .await?;

        if created {
            if let Some(table_id) = cart.table_id() {
                TableStore::new(self.pos)
                    .set_status(table_id, TableStatus::Occupied)
                    .await?;
            }
        }

        tracing::info!(order_id, items = inserted, created, "order saved");
        Ok(order_id)
    }

    pub async fn set_status(&self, order_id: i64, status: OrderStatus) -> Result<()> {
        update_by_id(self.pos, TABLE, order_id, json!({ "status": status })).await?;
        tracing::info!(order_id, status = status.as_str(), "order status changed");
        Ok(())
    }

    /// Close the order, stamp its end time and free its table
    pub async fn close_order(&self, order: &Order) -> Result<()> {
        update_by_id(
            self.pos,
            TABLE,
            order.id,
            json!({
                "status": OrderStatus::Closed,
                "end_time": Utc::now().to_rfc3339(),
            }),
        )
        .await?;

        if let Some(table_id) = order.table_id {
            TableStore::new(self.pos)
                .set_status(table_id, TableStatus::Free)
                .await?;
        }

        tracing::info!(order_id = order.id, "order closed");
        Ok(())
    }
}
