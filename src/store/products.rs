use mesa_postgrest::SortOrder;
use serde_json::json;

use super::{delete_by_id, save_form, update_by_id};
use crate::error::Result;
use crate::models::{Product, ProductForm, ProductStatus};
use crate::Pos;

const TABLE: &str = "products";

/// The product management page and the menu of the order composer
pub struct ProductStore<'a> {
    pos: &'a Pos,
}

impl<'a> ProductStore<'a> {
    pub(crate) fn new(pos: &'a Pos) -> Self {
        Self { pos }
    }

    /// All products by id, with their category name
    pub async fn list(&self) -> Result<Vec<Product>> {
        Ok(self
            .pos
            .from(TABLE)?
            .select("*, categories(name)")
            .order("id", SortOrder::Ascending)
            .execute::<Product>()
            .await?)
    }

    /// Active products by name with the full category, for the order composer
    pub async fn list_menu(&self) -> Result<Vec<Product>> {
        Ok(self
            .pos
            .from(TABLE)?
            .select("*, category:categories(*)")
            .eq("status", ProductStatus::Active.as_str())
            .order("name", SortOrder::Ascending)
            .execute::<Product>()
            .await?)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Product>> {
        Ok(self
            .pos
            .from(TABLE)?
            .select("*, category:categories(*)")
            .eq("id", &id.to_string())
            .execute_one::<Product>()
            .await?)
    }

    pub async fn save(&self, editing_id: Option<i64>, form: &ProductForm) -> Result<Vec<Product>> {
        save_form(self.pos, TABLE, editing_id, form).await?;
        self.list().await
    }

    pub async fn delete(&self, id: i64) -> Result<Vec<Product>> {
        delete_by_id(self.pos, TABLE, id).await?;
        self.list().await
    }

    pub async fn toggle_status(&self, product: &Product) -> Result<Vec<Product>> {
        update_by_id(
            self.pos,
            TABLE,
            product.id,
            json!({ "status": product.status.toggled() }),
        )
        .await?;
        self.list().await
    }
}
