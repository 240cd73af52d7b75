use mesa_postgrest::SortOrder;

use super::{delete_by_id, save_form};
use crate::error::Result;
use crate::models::{ProductOption, ProductOptionForm};
use crate::Pos;

const TABLE: &str = "product_options";

/// Add-ons ("acompañamientos") offered with products
pub struct ProductOptionStore<'a> {
    pos: &'a Pos,
}

impl<'a> ProductOptionStore<'a> {
    pub(crate) fn new(pos: &'a Pos) -> Self {
        Self { pos }
    }

    pub async fn list(&self) -> Result<Vec<ProductOption>> {
        Ok(self
            .pos
            .from(TABLE)?
            .select("*")
            .order("name", SortOrder::Ascending)
            .execute::<ProductOption>()
            .await?)
    }

    /// Available add-ons of one product, offered in the item editor
    pub async fn list_for_product(&self, product_id: i64) -> Result<Vec<ProductOption>> {
        Ok(self
            .pos
            .from(TABLE)?
            .select("*")
            .eq("product_id", &product_id.to_string())
            .eq("is_available", "true")
            .order("name", SortOrder::Ascending)
            .execute::<ProductOption>()
            .await?)
    }

    pub async fn save(
        &self,
        editing_id: Option<i64>,
        form: &ProductOptionForm,
    ) -> Result<Vec<ProductOption>> {
        save_form(self.pos, TABLE, editing_id, form).await?;
        self.list().await
    }

    pub async fn delete(&self, id: i64) -> Result<Vec<ProductOption>> {
        delete_by_id(self.pos, TABLE, id).await?;
        self.list().await
    }
}
