//! Recipes bookmarked by a user (`receitas_salvas`)

use serde_json::json;

use fitcooker_postgrest::SortOrder;

use crate::error::Result;
use crate::models::{first_row, RowId, SavedRecipe};
use crate::FitCooker;

pub const SAVED_TABLE: &str = "receitas_salvas";

const LIST_COLUMNS: &str = "*,receitas(*,profiles!usuario_id(nome,avatar_url))";

pub struct SavedRecipes<'a> {
    client: &'a FitCooker,
}

impl<'a> SavedRecipes<'a> {
    pub(crate) fn new(client: &'a FitCooker) -> Self {
        Self { client }
    }

    pub async fn is_saved(&self, user_id: &str, recipe_id: i64) -> Result<bool> {
        let row: Option<RowId> = self
            .client
            .from(SAVED_TABLE)?
            .select("id")
            .eq("usuario_id", user_id)
            .eq("receita_id", &recipe_id.to_string())
            .execute_one()
            .await?;
        Ok(row.is_some())
    }

    pub async fn save(&self, user_id: &str, recipe_id: i64) -> Result<SavedRecipe> {
        let inserted = self
            .client
            .from(SAVED_TABLE)?
            .insert(json!({
                "usuario_id": user_id,
                "receita_id": recipe_id,
            }))
            .await?;
        first_row(inserted)
    }

    pub async fn unsave(&self, user_id: &str, recipe_id: i64) -> Result<()> {
        self.client
            .from(SAVED_TABLE)?
            .eq("usuario_id", user_id)
            .eq("receita_id", &recipe_id.to_string())
            .delete()
            .await?;
        Ok(())
    }

    /// Save or unsave; returns whether the recipe is now saved
    pub async fn toggle(&self, user_id: &str, recipe_id: i64) -> Result<bool> {
        if self.is_saved(user_id, recipe_id).await? {
            self.unsave(user_id, recipe_id).await?;
            Ok(false)
        } else {
            self.save(user_id, recipe_id).await?;
            Ok(true)
        }
    }

    /// Bookmarks of `user_id` with their recipes embedded, newest first
    pub async fn list(&self, user_id: &str) -> Result<Vec<SavedRecipe>> {
        let saved = self
            .client
            .from(SAVED_TABLE)?
            .select(LIST_COLUMNS)
            .eq("usuario_id", user_id)
            .order("created_at", SortOrder::Descending)
            .execute()
            .await?;
        Ok(saved)
    }
}
