//! Ingredient catalog
//!
//! Searches go to the shared `ingredientes` table first. Only when it has
//! nothing for the query is the configured food database consulted; its
//! results are normalized and written back so the next search is served
//! from the table.

use fitcooker_nutrition::{normalize_text, process_ingredient, ProcessedIngredient, Unit};
use fitcooker_postgrest::SortOrder;

use crate::error::{Error, Result};
use crate::models::{first_row, IngredientRow};
use crate::FitCooker;

pub const INGREDIENTS_TABLE: &str = "ingredientes";

/// Rows read from the cache per search
pub const CACHE_LOOKUP_LIMIT: i32 = 5;

/// Ingredient typed in by a user; missing nutrients are stored as zero
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomIngredient {
    pub name: String,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sodium: Option<f64>,
    pub unit: Option<Unit>,
}

pub struct Catalog<'a> {
    client: &'a FitCooker,
}

impl<'a> Catalog<'a> {
    pub(crate) fn new(client: &'a FitCooker) -> Self {
        Self { client }
    }

    /// Look an ingredient up, cache first
    ///
    /// Cached names are stored normalized, so the table is matched against
    /// the normalized query. The food database gets the query as typed.
    pub async fn search(&self, query: &str) -> Result<Vec<ProcessedIngredient>> {
        let query = query.trim();
        let term = match canonical_name(query) {
            Some(term) => term,
            None => return Ok(Vec::new()),
        };

        let cached: Vec<IngredientRow> = self
            .client
            .from(INGREDIENTS_TABLE)?
            .select("*")
            .ilike("nome", &format!("*{}*", term))
            .limit(CACHE_LOOKUP_LIMIT)
            .execute()
            .await?;

        if !cached.is_empty() {
            tracing::debug!(query, term = %term, hits = cached.len(), "ingredient cache hit");
            return Ok(cached.iter().map(IngredientRow::to_processed).collect());
        }

        let source = self.client.food_source();
        let raw = source.search(query).await?;
        tracing::debug!(query, source = source.name(), found = raw.len(), "ingredient cache miss");

        let processed: Vec<ProcessedIngredient> = raw.iter().map(process_ingredient).collect();
        for ingredient in &processed {
            self.cache(ingredient).await;
        }

        Ok(processed)
    }

    // Cache writes never fail the search.
    async fn cache(&self, ingredient: &ProcessedIngredient) {
        let row = IngredientRow::from_processed(ingredient, None);
        let result = match self.client.from(INGREDIENTS_TABLE) {
            Ok(table) => table.insert(&row).await.map_err(Error::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(_) => {}
            Err(e) if e.is_duplicate() => {
                tracing::debug!(name = %ingredient.name, "ingredient already cached");
            }
            Err(e) => {
                tracing::warn!(name = %ingredient.name, error = %e, "failed to cache ingredient");
            }
        }
    }

    /// Every cached ingredient, by name
    pub async fn list(&self) -> Result<Vec<IngredientRow>> {
        let rows = self
            .client
            .from(INGREDIENTS_TABLE)?
            .select("*")
            .order("nome", SortOrder::Ascending)
            .execute()
            .await?;
        Ok(rows)
    }

    pub async fn add_custom(&self, ingredient: CustomIngredient) -> Result<IngredientRow> {
        let name = canonical_name(&ingredient.name)
            .ok_or_else(|| Error::invalid_input("ingredient name is required"))?;

        let row = IngredientRow {
            id: None,
            name,
            calories: ingredient.calories.unwrap_or_default(),
            protein: ingredient.protein.unwrap_or_default(),
            carbs: ingredient.carbs.unwrap_or_default(),
            fat: ingredient.fat.unwrap_or_default(),
            fiber: ingredient.fiber.unwrap_or_default(),
            sodium: ingredient.sodium.unwrap_or_default(),
            unit: ingredient.unit.unwrap_or_default(),
            created_by: self.client.current_user_id(),
            created_at: None,
        };

        let inserted = self.client.from(INGREDIENTS_TABLE)?.insert(&row).await?;
        first_row(inserted)
    }
}

/// Name an ingredient is stored and matched under, `None` when nothing
/// survives normalization
pub fn canonical_name(name: &str) -> Option<String> {
    let name = normalize_text(name, "");
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Case-insensitive substring filter over a loaded list
pub fn filter_local<'r>(rows: &'r [IngredientRow], term: &str) -> Vec<&'r IngredientRow> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return rows.iter().collect();
    }
    rows.iter()
        .filter(|row| row.name.to_lowercase().contains(&term))
        .collect()
}
