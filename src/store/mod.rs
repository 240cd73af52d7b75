//! Data access for each management page
//!
//! Stores fetch a collection with a fixed ordering, validate and write
//! forms, and hand back the refetched collection after every write.

mod categories;
mod orders;
mod product_options;
mod products;
mod tables;
mod users;

pub use categories::CategoryStore;
pub use orders::{OrderStore, REPLACE_ORDER_ITEMS_FN};
pub use product_options::ProductOptionStore;
pub use products::ProductStore;
pub use tables::TableStore;
pub use users::UserStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::validation::Validate;
use crate::Pos;

/// Insert when `editing_id` is `None`, update that row otherwise
pub(crate) async fn save_form<F>(
    pos: &Pos,
    table: &str,
    editing_id: Option<i64>,
    form: &F,
) -> Result<()>
where
    F: Serialize + Validate,
{
    form.validate()?;

    match editing_id {
        Some(id) => {
            update_by_id(pos, table, id, serde_json::to_value(form)?).await?;
            tracing::info!(table, id, "row updated");
        }
        None => {
            let inserted = pos.from(table)?.insert(form).await?;
            tracing::info!(table, id = ?inserted[0].get("id"), "row created");
        }
    }
    Ok(())
}

/// Patch one row; a missing row is `NotFound`
pub(crate) async fn update_by_id(pos: &Pos, table: &str, id: i64, values: Value) -> Result<Value> {
    let updated = pos
        .from(table)?
        .eq("id", &id.to_string())
        .update(values)
        .await?;

    if is_empty_result(&updated) {
        return Err(Error::not_found(format!("{} {}", table, id)));
    }
    Ok(updated)
}

pub(crate) async fn delete_by_id(pos: &Pos, table: &str, id: i64) -> Result<()> {
    let deleted = pos.from(table)?.eq("id", &id.to_string()).delete().await?;
    if is_empty_result(&deleted) {
        tracing::warn!(table, id, "delete matched no rows");
    } else {
        tracing::info!(table, id, "row deleted");
    }
    Ok(())
}

/// First row of a `return=representation` response
pub(crate) fn first_row<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    match value {
        Value::Array(rows) => rows
            .into_iter()
            .next()
            .map(serde_json::from_value)
            .transpose()?
            .ok_or_else(|| Error::not_found(what)),
        Value::Null => Err(Error::not_found(what)),
        row => Ok(serde_json::from_value(row)?),
    }
}

// A 204 without a body does not say how many rows matched
fn is_empty_result(value: &Value) -> bool {
    matches!(value, Value::Array(rows) if rows.is_empty())
}
