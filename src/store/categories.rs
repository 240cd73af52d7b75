use mesa_postgrest::SortOrder;
use serde_json::json;

use super::{delete_by_id, save_form, update_by_id};
use crate::error::Result;
use crate::models::{Category, CategoryForm, CategoryStatus};
use crate::Pos;

const TABLE: &str = "categories";

/// The category management page and the order composer's sidebar
pub struct CategoryStore<'a> {
    pos: &'a Pos,
}

impl<'a> CategoryStore<'a> {
    pub(crate) fn new(pos: &'a Pos) -> Self {
        Self { pos }
    }

    /// All categories by name
    pub async fn list(&self) -> Result<Vec<Category>> {
        Ok(self
            .pos
            .from(TABLE)?
            .select("*")
            .order("name", SortOrder::Ascending)
            .execute::<Category>()
            .await?)
    }

    /// Active categories by name
    pub async fn list_active(&self) -> Result<Vec<Category>> {
        Ok(self
            .pos
            .from(TABLE)?
            .select("*")
            .eq("status", CategoryStatus::Active.as_str())
            .order("name", SortOrder::Ascending)
            .execute::<Category>()
            .await?)
    }

    pub async fn save(&self, editing_id: Option<i64>, form: &CategoryForm) -> Result<Vec<Category>> {
        save_form(self.pos, TABLE, editing_id, form).await?;
        self.list().await
    }

    /// Products keep their `category_id`; nothing cascades.
    pub async fn delete(&self, id: i64) -> Result<Vec<Category>> {
        delete_by_id(self.pos, TABLE, id).await?;
        self.list().await
    }

    pub async fn toggle_status(&self, category: &Category) -> Result<Vec<Category>> {
        update_by_id(
            self.pos,
            TABLE,
            category.id,
            json!({ "status": category.status.toggled() }),
        )
        .await?;
        self.list().await
    }
}
