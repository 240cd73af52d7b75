use mesa_postgrest::SortOrder;
use serde_json::json;

use super::{delete_by_id, save_form, update_by_id};
use crate::error::Result;
use crate::models::{DiningTable, TableForm, TableStatus};
use crate::Pos;

const TABLE: &str = "tables";

/// The table management page
pub struct TableStore<'a> {
    pos: &'a Pos,
}

impl<'a> TableStore<'a> {
    pub(crate) fn new(pos: &'a Pos) -> Self {
        Self { pos }
    }

    /// All tables by id
    pub async fn list(&self) -> Result<Vec<DiningTable>> {
        Ok(self
            .pos
            .from(TABLE)?
            .select("*")
            .order("id", SortOrder::Ascending)
            .execute::<DiningTable>()
            .await?)
    }

    /// Create (`editing_id == None`) or update a table, then refetch
    pub async fn save(&self, editing_id: Option<i64>, form: &TableForm) -> Result<Vec<DiningTable>> {
        save_form(self.pos, TABLE, editing_id, form).await?;
        self.list().await
    }

    pub async fn delete(&self, id: i64) -> Result<Vec<DiningTable>> {
        delete_by_id(self.pos, TABLE, id).await?;
        self.list().await
    }

    /// Flip free ↔ occupied. Anything that is not free becomes free.
    pub async fn toggle_status(&self, table: &DiningTable) -> Result<Vec<DiningTable>> {
        self.set_status(table.id, table.status.toggled()).await?;
        self.list().await
    }

    pub async fn set_status(&self, id: i64, status: TableStatus) -> Result<()> {
        update_by_id(self.pos, TABLE, id, json!({ "status": status })).await?;
        tracing::debug!(id, status = status.as_str(), "table status changed");
        Ok(())
    }
}
