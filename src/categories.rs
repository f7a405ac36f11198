//! Recipe categories (`categorias`)

use serde_json::json;

use fitcooker_postgrest::SortOrder;

use crate::error::{Error, Result};
use crate::models::{first_row, Category};
use crate::FitCooker;

pub const CATEGORIES_TABLE: &str = "categorias";

pub struct Categories<'a> {
    client: &'a FitCooker,
}

impl<'a> Categories<'a> {
    pub(crate) fn new(client: &'a FitCooker) -> Self {
        Self { client }
    }

    /// Active categories by name
    pub async fn list_active(&self) -> Result<Vec<Category>> {
        let categories = self
            .client
            .from(CATEGORIES_TABLE)?
            .select("*")
            .eq("ativa", "true")
            .order("nome", SortOrder::Ascending)
            .execute()
            .await?;
        Ok(categories)
    }

    pub async fn create(&self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_input("category name is required"));
        }

        let inserted = self
            .client
            .from(CATEGORIES_TABLE)?
            .insert(json!({
                "nome": name,
                "descricao": "",
                "ativa": true,
            }))
            .await?;
        first_row(inserted)
    }
}
