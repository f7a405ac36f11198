//! Recipes: listing, creation through the `create_recipe_transaction`
//! stored function, media attachment, edits and removal
//!
//! A full edit has no stored function: the recipe row is patched, its
//! ingredient, step and category links are replaced, and the stored totals
//! are recomputed by `calcular_macros_receita`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use fitcooker_nutrition::normalize::UNKNOWN_INGREDIENT;
use fitcooker_nutrition::{recipe_totals, round_to, standardize_unit, IngredientLine, Macros};
use fitcooker_postgrest::SortOrder;

use crate::catalog::{canonical_name, INGREDIENTS_TABLE};
use crate::error::{Error, Result};
use crate::models::{
    first_row, IngredientRow, MediaKind, RecipeDetail, RecipeMedia, RecipeRow, RowId,
};
use crate::FitCooker;

pub const RECIPES_TABLE: &str = "receitas";
pub const MEDIA_TABLE: &str = "receita_media";
pub const INGREDIENT_LINKS_TABLE: &str = "receita_ingredientes";
pub const STEPS_TABLE: &str = "receita_passos";
pub const CATEGORY_LINKS_TABLE: &str = "receita_categorias";
pub const CREATE_RECIPE_FUNCTION: &str = "create_recipe_transaction";
pub const RECALCULATE_MACROS_FUNCTION: &str = "calcular_macros_receita";

/// Status of a published recipe
pub const ACTIVE_STATUS: &str = "ativa";

const LIST_COLUMNS: &str =
    "*,profiles!usuario_id(nome,avatar_url),receita_categorias(categorias(nome))";

const DETAIL_COLUMNS: &str = "*,profiles!usuario_id(nome,avatar_url),\
receita_categorias(categoria_id,categorias(nome)),\
receita_ingredientes(quantidade,unidade,ordem,ingredientes(*)),\
receita_passos(ordem,descricao)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "Fácil")]
    Easy,
    #[serde(rename = "Médio")]
    Medium,
    #[serde(rename = "Difícil")]
    Hard,
}

impl Difficulty {
    /// Value stored in the `dificuldade` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Fácil",
            Difficulty::Medium => "Médio",
            Difficulty::Hard => "Difícil",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "fácil" | "facil" => Ok(Difficulty::Easy),
            "medium" | "médio" | "medio" => Ok(Difficulty::Medium),
            "hard" | "difícil" | "dificil" => Ok(Difficulty::Hard),
            other => Err(Error::invalid_input(format!("unknown difficulty: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecipeStep {
    pub number: u32,
    pub description: String,
}

/// Recipe as filled in by its author, before it is published
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub title: String,
    pub description: String,
    pub prep_time_minutes: u32,
    pub servings: u32,
    pub difficulty: Difficulty,
    pub ingredients: Vec<IngredientLine>,
    pub steps: Vec<RecipeStep>,
    pub category_ids: Vec<i64>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

impl RecipeDraft {
    /// Every missing required field, in form order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        if self.prep_time_minutes == 0 {
            missing.push("preparation time");
        }
        if self.servings == 0 {
            missing.push("servings");
        }
        if !self.ingredients.iter().any(IngredientLine::is_filled) {
            missing.push("at least one ingredient");
        }
        if !self.steps.iter().any(|s| !s.description.trim().is_empty()) {
            missing.push("at least one step");
        }
        missing
    }

    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::invalid_input(format!(
                "recipe is missing: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn totals(&self) -> Macros {
        recipe_totals(&self.ingredients)
    }

    /// Arguments of the `create_recipe_transaction` call. Blank ingredient
    /// lines and steps are left out.
    pub fn rpc_params(&self, author_id: &str) -> Value {
        let ingredients: Vec<Value> = self
            .ingredients
            .iter()
            .filter(|line| line.is_filled())
            .enumerate()
            .map(|(index, line)| {
                json!({
                    "nome": line.name.trim(),
                    "quantidade": line.quantity,
                    "unidade": line.unit,
                    "calorias_por_100g": line.per_100.calories,
                    "proteinas_por_100g": line.per_100.protein,
                    "carboidratos_por_100g": line.per_100.carbs,
                    "gorduras_por_100g": line.per_100.fat,
                    "fibras_por_100g": line.per_100.fiber,
                    "sodio_por_100g": line.per_100.sodium,
                    "ordem": index + 1,
                })
            })
            .collect();

        let steps: Vec<Value> = self
            .steps
            .iter()
            .filter(|step| !step.description.trim().is_empty())
            .map(|step| {
                json!({
                    "numero_passo": step.number,
                    "descricao": step.description.trim(),
                })
            })
            .collect();

        let totals = self.totals();
        json!({
            "p_titulo": self.title.trim(),
            "p_descricao": self.description.trim(),
            "p_tempo_preparo": self.prep_time_minutes,
            "p_porcoes": self.servings,
            "p_dificuldade": self.difficulty.as_str(),
            "p_usuario_id": author_id,
            "p_ingredientes": ingredients,
            "p_passos": steps,
            "p_categorias": self.category_ids,
            "p_calorias_total": round_to(totals.calories, 2),
            "p_proteinas_total": round_to(totals.protein, 2),
            "p_carboidratos_total": round_to(totals.carbs, 2),
            "p_gorduras_total": round_to(totals.fat, 2),
            "p_fibras_total": round_to(totals.fiber, 2),
            "p_sodio_total": round_to(totals.sodium, 2),
            "p_imagem_url": self.image_url,
            "p_video_url": self.video_url,
        })
    }
}

impl From<&RecipeDetail> for RecipeDraft {
    /// Form contents for editing a stored recipe, lines and steps in order
    fn from(detail: &RecipeDetail) -> Self {
        let recipe = &detail.recipe;

        let mut lines: Vec<_> = detail.ingredients.iter().collect();
        lines.sort_by_key(|line| line.position);
        let mut steps: Vec<_> = detail.steps.iter().collect();
        steps.sort_by_key(|step| step.position);

        RecipeDraft {
            title: recipe.title.clone(),
            description: recipe.description.clone().unwrap_or_default(),
            prep_time_minutes: recipe.prep_time_minutes.max(0) as u32,
            servings: recipe.servings.max(0) as u32,
            difficulty: recipe.difficulty.parse().unwrap_or(Difficulty::Easy),
            ingredients: lines
                .into_iter()
                .map(|line| IngredientLine {
                    name: line
                        .ingredient
                        .as_ref()
                        .map(|ingredient| ingredient.name.clone())
                        .unwrap_or_default(),
                    quantity: line.quantity,
                    unit: line.unit.clone(),
                    per_100: line
                        .ingredient
                        .as_ref()
                        .map(IngredientRow::per_100)
                        .unwrap_or_default(),
                })
                .collect(),
            steps: steps
                .into_iter()
                .map(|step| RecipeStep {
                    number: step.position.max(0) as u32,
                    description: step.description.clone(),
                })
                .collect(),
            category_ids: recipe.category_ids(),
            image_url: recipe.image_url.clone(),
            video_url: recipe.video_url.clone(),
        }
    }
}

/// Picture or clip to attach to a published recipe
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    pub url: String,
    pub kind: MediaKind,
    pub is_main: bool,
}

/// `receita_media` rows for `items`: the main item takes position 1, the
/// others their index plus 2
pub fn media_rows(recipe_id: i64, items: &[MediaItem]) -> Result<Vec<RecipeMedia>> {
    let main_count = items.iter().filter(|item| item.is_main).count();
    if main_count != 1 {
        return Err(Error::invalid_input(format!(
            "exactly one media item must be main, got {}",
            main_count
        )));
    }

    Ok(items
        .iter()
        .enumerate()
        .map(|(index, item)| RecipeMedia {
            id: None,
            recipe_id,
            url: item.url.clone(),
            kind: item.kind,
            position: if item.is_main { 1 } else { index as i32 + 2 },
            is_main: item.is_main,
        })
        .collect())
}

/// Editable recipe columns; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecipePatch {
    #[serde(rename = "titulo", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "descricao", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "tempo_preparo", skip_serializing_if = "Option::is_none")]
    pub prep_time_minutes: Option<u32>,
    #[serde(rename = "porcoes", skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(rename = "dificuldade", skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "imagem_url", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl RecipePatch {
    pub fn is_empty(&self) -> bool {
        *self == RecipePatch::default()
    }
}

fn recipe_id_from(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub struct Recipes<'a> {
    client: &'a FitCooker,
}

impl<'a> Recipes<'a> {
    pub(crate) fn new(client: &'a FitCooker) -> Self {
        Self { client }
    }

    /// Published recipes, newest first, with author and category names
    pub async fn list_active(&self) -> Result<Vec<RecipeRow>> {
        let rows = self
            .client
            .from(RECIPES_TABLE)?
            .select(LIST_COLUMNS)
            .eq("status", ACTIVE_STATUS)
            .order("created_at", SortOrder::Descending)
            .execute()
            .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> Result<RecipeRow> {
        self.client
            .from(RECIPES_TABLE)?
            .select(LIST_COLUMNS)
            .eq("id", &id.to_string())
            .execute_one()
            .await?
            .ok_or_else(|| Error::not_found(format!("recipe {}", id)))
    }

    /// Recipe with its category ids, ingredient lines and steps
    pub async fn get_detail(&self, id: i64) -> Result<RecipeDetail> {
        self.client
            .from(RECIPES_TABLE)?
            .select(DETAIL_COLUMNS)
            .eq("id", &id.to_string())
            .execute_one()
            .await?
            .ok_or_else(|| Error::not_found(format!("recipe {}", id)))
    }

    pub async fn list_by_author(&self, user_id: &str) -> Result<Vec<RecipeRow>> {
        let rows = self
            .client
            .from(RECIPES_TABLE)?
            .select(LIST_COLUMNS)
            .eq("usuario_id", user_id)
            .order("created_at", SortOrder::Descending)
            .execute()
            .await?;
        Ok(rows)
    }

    /// Publish a draft; returns the new recipe id
    ///
    /// Recipe, ingredients, steps and category links are written by one
    /// stored function, so either all of them exist or none does.
    pub async fn create(&self, draft: &RecipeDraft, author_id: &str) -> Result<i64> {
        draft.validate()?;

        let result: Value = self
            .client
            .rpc(CREATE_RECIPE_FUNCTION, draft.rpc_params(author_id))?
            .call_rpc()
            .await?;

        let id = recipe_id_from(&result).ok_or_else(|| {
            Error::general(format!("unexpected {} result: {}", CREATE_RECIPE_FUNCTION, result))
        })?;
        tracing::info!(recipe_id = id, author_id, "recipe created");
        Ok(id)
    }

    pub async fn attach_media(&self, recipe_id: i64, items: &[MediaItem]) -> Result<Vec<RecipeMedia>> {
        let rows = media_rows(recipe_id, items)?;
        let inserted = self.client.from(MEDIA_TABLE)?.insert(&rows).await?;
        Ok(serde_json::from_value(inserted)?)
    }

    pub async fn update(&self, id: i64, patch: &RecipePatch) -> Result<RecipeRow> {
        if patch.is_empty() {
            return Err(Error::invalid_input("nothing to update"));
        }

        let mut body = serde_json::to_value(patch)?;
        body["updated_at"] = Value::String(chrono::Utc::now().to_rfc3339());

        let updated = self
            .client
            .from(RECIPES_TABLE)?
            .eq("id", &id.to_string())
            .update(&body)
            .await?;
        first_row(updated).map_err(|_| Error::not_found(format!("recipe {}", id)))
    }

    /// Replace a recipe with the contents of `draft`
    ///
    /// Only the author's own recipe is touched; anything else is reported
    /// as not found. Ingredients missing from the catalog are added to it.
    /// A failed macro recalculation is logged, not returned.
    pub async fn edit(&self, id: i64, draft: &RecipeDraft, author_id: &str) -> Result<()> {
        draft.validate()?;
        let key = id.to_string();

        let totals = draft.totals();
        let body = json!({
            "titulo": draft.title.trim(),
            "descricao": draft.description.trim(),
            "tempo_preparo": draft.prep_time_minutes,
            "porcoes": draft.servings,
            "dificuldade": draft.difficulty.as_str(),
            "imagem_url": draft.image_url,
            "video_url": draft.video_url,
            "calorias_total": round_to(totals.calories, 2),
            "proteinas_total": round_to(totals.protein, 2),
            "carboidratos_total": round_to(totals.carbs, 2),
            "gorduras_total": round_to(totals.fat, 2),
            "fibras_total": round_to(totals.fiber, 2),
            "sodio_total": round_to(totals.sodium, 2),
            "updated_at": chrono::Utc::now().to_rfc3339(),
        });
        let updated = self
            .client
            .from(RECIPES_TABLE)?
            .eq("id", &key)
            .eq("usuario_id", author_id)
            .update(&body)
            .await?;
        let _: RowId = first_row(updated).map_err(|_| Error::not_found(format!("recipe {}", id)))?;

        for table in [INGREDIENT_LINKS_TABLE, STEPS_TABLE, CATEGORY_LINKS_TABLE] {
            self.client.from(table)?.eq("receita_id", &key).delete().await?;
        }

        let mut ingredient_links = Vec::new();
        for (index, line) in draft.ingredients.iter().filter(|line| line.is_filled()).enumerate() {
            let ingredient_id = self.ingredient_id(line, author_id).await?;
            ingredient_links.push(json!({
                "receita_id": id,
                "ingrediente_id": ingredient_id,
                "quantidade": line.quantity,
                "unidade": line.unit,
                "ordem": index + 1,
            }));
        }

        let steps: Vec<Value> = draft
            .steps
            .iter()
            .filter(|step| !step.description.trim().is_empty())
            .map(|step| {
                json!({
                    "receita_id": id,
                    "ordem": step.number,
                    "descricao": step.description.trim(),
                })
            })
            .collect();

        let category_links: Vec<Value> = draft
            .category_ids
            .iter()
            .map(|category_id| json!({ "receita_id": id, "categoria_id": category_id }))
            .collect();

        for (table, rows) in [
            (INGREDIENT_LINKS_TABLE, ingredient_links),
            (STEPS_TABLE, steps),
            (CATEGORY_LINKS_TABLE, category_links),
        ] {
            if !rows.is_empty() {
                self.client.from(table)?.insert(&rows).await?;
            }
        }

        let recalculated = async {
            self.client
                .rpc(RECALCULATE_MACROS_FUNCTION, json!({ "receita_id_param": id }))?
                .call_rpc::<Value>()
                .await?;
            Ok::<(), Error>(())
        }
        .await;
        if let Err(e) = recalculated {
            tracing::warn!(recipe_id = id, error = %e, "failed to recalculate recipe macros");
        }

        tracing::info!(recipe_id = id, author_id, "recipe edited");
        Ok(())
    }

    // Catalog id for the line's ingredient, creating the entry when missing
    async fn ingredient_id(&self, line: &IngredientLine, author_id: &str) -> Result<i64> {
        let name = canonical_name(&line.name).unwrap_or_else(|| UNKNOWN_INGREDIENT.to_string());

        let existing: Option<RowId> = self
            .client
            .from(INGREDIENTS_TABLE)?
            .select("id")
            .eq("nome", &name)
            .execute_one()
            .await?;
        if let Some(row) = existing {
            return Ok(row.id);
        }

        let row = IngredientRow {
            id: None,
            name,
            calories: line.per_100.calories,
            protein: line.per_100.protein,
            carbs: line.per_100.carbs,
            fat: line.per_100.fat,
            fiber: line.per_100.fiber,
            sodium: line.per_100.sodium,
            unit: standardize_unit(&Value::String(line.unit.clone())),
            created_by: Some(author_id.to_string()),
            created_at: None,
        };
        let inserted: RowId = first_row(self.client.from(INGREDIENTS_TABLE)?.insert(&row).await?)?;
        tracing::debug!(ingredient_id = inserted.id, name = %row.name, "ingredient added to catalog");
        Ok(inserted.id)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client
            .from(RECIPES_TABLE)?
            .eq("id", &id.to_string())
            .delete()
            .await?;
        tracing::info!(recipe_id = id, "recipe deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, quantity: f64, calories: f64) -> IngredientLine {
        IngredientLine {
            name: name.to_string(),
            quantity,
            unit: "g".to_string(),
            per_100: Macros {
                calories,
                protein: 10.0,
                ..Default::default()
            },
        }
    }

    fn draft() -> RecipeDraft {
        RecipeDraft {
            title: " Omelete ".to_string(),
            description: "Rápida e proteica".to_string(),
            prep_time_minutes: 10,
            servings: 1,
            difficulty: Difficulty::Easy,
            ingredients: vec![line("ovo", 100.0, 143.0), line("", 50.0, 100.0), line("queijo", 0.0, 300.0)],
            steps: vec![
                RecipeStep {
                    number: 1,
                    description: "Bata os ovos".to_string(),
                },
                RecipeStep {
                    number: 2,
                    description: "  ".to_string(),
                },
            ],
            category_ids: vec![3],
            image_url: None,
            video_url: None,
        }
    }

    #[test]
    fn test_validate() {
        assert!(draft().validate().is_ok());

        let empty = RecipeDraft {
            title: String::new(),
            ingredients: vec![line("ovo", 0.0, 143.0)],
            steps: Vec::new(),
            ..draft()
        };
        assert_eq!(
            empty.missing_fields(),
            vec!["title", "at least one ingredient", "at least one step"]
        );
        assert!(matches!(empty.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_rpc_params_skip_blank_lines() {
        let params = draft().rpc_params("user-1");

        assert_eq!(params["p_titulo"], "Omelete");
        assert_eq!(params["p_dificuldade"], "Fácil");
        assert_eq!(params["p_usuario_id"], "user-1");
        assert_eq!(params["p_categorias"], json!([3]));

        let ingredients = params["p_ingredientes"].as_array().unwrap();
        assert_eq!(ingredients.len(), 1);
        assert_eq!(ingredients[0]["nome"], "ovo");
        assert_eq!(ingredients[0]["ordem"], 1);

        let steps = params["p_passos"].as_array().unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0]["numero_passo"], 1);

        // Plain sum over every line: 143 + 50 + 0
        assert_eq!(params["p_calorias_total"], 193.0);
        assert_eq!(params["p_imagem_url"], Value::Null);
    }

    #[test]
    fn test_media_rows_order() {
        let items = vec![
            MediaItem {
                url: "a.png".to_string(),
                kind: MediaKind::Image,
                is_main: false,
            },
            MediaItem {
                url: "b.png".to_string(),
                kind: MediaKind::Image,
                is_main: true,
            },
            MediaItem {
                url: "c.mp4".to_string(),
                kind: MediaKind::Video,
                is_main: false,
            },
        ];

        let rows = media_rows(9, &items).unwrap();
        let positions: Vec<i32> = rows.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![2, 1, 4]);
        assert!(rows.iter().all(|r| r.recipe_id == 9));

        let no_main: Vec<MediaItem> = items
            .iter()
            .cloned()
            .map(|item| MediaItem {
                is_main: false,
                ..item
            })
            .collect();
        assert!(media_rows(9, &no_main).is_err());

        let two_main: Vec<MediaItem> = items
            .iter()
            .cloned()
            .map(|item| MediaItem {
                is_main: true,
                ..item
            })
            .collect();
        assert!(media_rows(9, &two_main).is_err());
    }

    #[test]
    fn test_difficulty() {
        assert_eq!("facil".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!("Médio".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("expert".parse::<Difficulty>().is_err());
        assert_eq!(serde_json::to_value(Difficulty::Hard).unwrap(), "Difícil");
    }

    #[test]
    fn test_draft_from_detail() {
        let detail: RecipeDetail = serde_json::from_value(json!({
            "id": 8,
            "titulo": "Omelete",
            "descricao": null,
            "tempo_preparo": 10,
            "porcoes": 1,
            "dificuldade": "Médio",
            "usuario_id": "user-1",
            "receita_categorias": [{ "categoria_id": 3, "categorias": { "nome": "Café da manhã" } }],
            "receita_ingredientes": [
                { "quantidade": 30, "unidade": "g", "ordem": 2, "ingredientes": { "nome": "queijo", "calorias_por_100g": 300 } },
                { "quantidade": 100, "unidade": "g", "ordem": 1, "ingredientes": { "nome": "ovo", "calorias_por_100g": 143 } }
            ],
            "receita_passos": [
                { "ordem": 2, "descricao": "Leve ao fogo" },
                { "ordem": 1, "descricao": "Bata os ovos" }
            ]
        }))
        .unwrap();

        let draft = RecipeDraft::from(&detail);
        assert_eq!(draft.difficulty, Difficulty::Medium);
        assert_eq!(draft.description, "");
        assert_eq!(draft.category_ids, vec![3]);
        assert_eq!(draft.ingredients[0].name, "ovo");
        assert_eq!(draft.ingredients[0].per_100.calories, 143.0);
        assert_eq!(draft.ingredients[1].quantity, 30.0);
        assert_eq!(draft.steps[0].description, "Bata os ovos");
        assert_eq!(draft.steps[1].number, 2);
        assert_eq!(draft.missing_fields(), vec!["description"]);
    }

    #[test]
    fn test_recipe_id_from() {
        assert_eq!(recipe_id_from(&json!(42)), Some(42));
        assert_eq!(recipe_id_from(&json!("42")), Some(42));
        assert_eq!(recipe_id_from(&json!({ "id": 42 })), None);
    }
}
