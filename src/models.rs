//! Rows of the hosted database
//!
//! Column names are the backend's Portuguese ones; fields carry English
//! names through `#[serde(rename)]`. Nullable numeric columns read as zero.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use fitcooker_nutrition::normalize::UNKNOWN_INGREDIENT;
use fitcooker_nutrition::{standardize_unit, Macros, ProcessedIngredient, Unit};

use crate::catalog::canonical_name;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn unit_column<'de, D>(deserializer: D) -> Result<Unit, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(standardize_unit(&Value::deserialize(deserializer)?))
}

/// First row of a `return=representation` body
pub(crate) fn first_row<T: serde::de::DeserializeOwned>(body: serde_json::Value) -> crate::Result<T> {
    let row = match body {
        serde_json::Value::Array(rows) => rows.into_iter().next(),
        serde_json::Value::Null => None,
        other => Some(other),
    };
    let row = row.ok_or_else(|| crate::Error::general("the backend returned no row"))?;
    Ok(serde_json::from_value(row)?)
}

/// `select=id` lookups
#[derive(Debug, Deserialize)]
pub(crate) struct RowId {
    pub id: i64,
}

/// Cached ingredient (`ingredientes`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "calorias_por_100g", default, deserialize_with = "null_as_default")]
    pub calories: f64,
    #[serde(rename = "proteinas_por_100g", default, deserialize_with = "null_as_default")]
    pub protein: f64,
    #[serde(rename = "carboidratos_por_100g", default, deserialize_with = "null_as_default")]
    pub carbs: f64,
    #[serde(rename = "gorduras_por_100g", default, deserialize_with = "null_as_default")]
    pub fat: f64,
    #[serde(rename = "fibras_por_100g", default, deserialize_with = "null_as_default")]
    pub fiber: f64,
    #[serde(rename = "sodio_por_100g", default, deserialize_with = "null_as_default")]
    pub sodium: f64,
    #[serde(rename = "unidade_padrao", default, deserialize_with = "unit_column")]
    pub unit: Unit,
    #[serde(rename = "criado_por", default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl IngredientRow {
    /// Row to insert for a normalized ingredient
    pub fn from_processed(ingredient: &ProcessedIngredient, created_by: Option<&str>) -> Self {
        Self {
            id: None,
            name: ingredient.name.clone(),
            calories: ingredient.calories,
            protein: ingredient.protein,
            carbs: ingredient.carbs,
            fat: ingredient.fat,
            fiber: ingredient.fiber,
            sodium: ingredient.sodium,
            unit: ingredient.unit,
            created_by: created_by.map(str::to_string),
            created_at: None,
        }
    }

    /// Nutrients per 100 g or ml
    pub fn per_100(&self) -> Macros {
        Macros {
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
            fiber: self.fiber,
            sodium: self.sodium,
        }
    }

    /// Cached row as a normalized ingredient; rows written outside the
    /// client get their name normalized here
    pub fn to_processed(&self) -> ProcessedIngredient {
        ProcessedIngredient {
            name: canonical_name(&self.name).unwrap_or_else(|| UNKNOWN_INGREDIENT.to_string()),
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
            fiber: self.fiber,
            sodium: self.sodium,
            unit: self.unit,
            allergens: Vec::new(),
        }
    }
}

/// Author columns embedded through `profiles!usuario_id(nome, avatar_url)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSummary {
    #[serde(rename = "nome", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryName {
    #[serde(rename = "nome")]
    pub name: String,
}

/// Row of the `receita_categorias` join, with the category embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLink {
    #[serde(rename = "categoria_id", default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(rename = "categorias", default)]
    pub category: Option<CategoryName>,
}

/// Recipe (`receitas`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRow {
    pub id: i64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descricao", default)]
    pub description: Option<String>,
    #[serde(rename = "imagem_url", default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(rename = "tempo_preparo", default, deserialize_with = "null_as_default")]
    pub prep_time_minutes: i32,
    #[serde(rename = "porcoes", default, deserialize_with = "null_as_default")]
    pub servings: i32,
    #[serde(rename = "dificuldade", default, deserialize_with = "null_as_default")]
    pub difficulty: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(rename = "nota_media", default, deserialize_with = "null_as_default")]
    pub average_rating: f64,
    #[serde(rename = "avaliacoes_count", default, deserialize_with = "null_as_default")]
    pub rating_count: i64,
    #[serde(rename = "calorias_total", default, deserialize_with = "null_as_default")]
    pub calories_total: f64,
    #[serde(rename = "proteinas_total", default, deserialize_with = "null_as_default")]
    pub protein_total: f64,
    #[serde(rename = "carboidratos_total", default, deserialize_with = "null_as_default")]
    pub carbs_total: f64,
    #[serde(rename = "gorduras_total", default, deserialize_with = "null_as_default")]
    pub fat_total: f64,
    #[serde(rename = "fibras_total", default, deserialize_with = "null_as_default")]
    pub fiber_total: f64,
    #[serde(rename = "sodio_total", default, deserialize_with = "null_as_default")]
    pub sodium_total: f64,
    #[serde(rename = "usuario_id")]
    pub author_id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(rename = "profiles", default, skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorSummary>,
    #[serde(rename = "receita_categorias", default, skip_serializing_if = "Vec::is_empty")]
    pub category_links: Vec<CategoryLink>,
}

impl RecipeRow {
    pub fn totals(&self) -> Macros {
        Macros {
            calories: self.calories_total,
            protein: self.protein_total,
            carbs: self.carbs_total,
            fat: self.fat_total,
            fiber: self.fiber_total,
            sodium: self.sodium_total,
        }
    }

    /// Names of the embedded categories
    pub fn category_names(&self) -> Vec<&str> {
        self.category_links
            .iter()
            .filter_map(|link| link.category.as_ref())
            .map(|category| category.name.as_str())
            .collect()
    }

    /// Ids of the linked categories, when the select asked for them
    pub fn category_ids(&self) -> Vec<i64> {
        self.category_links
            .iter()
            .filter_map(|link| link.category_id)
            .collect()
    }

    /// Author name, or the placeholder shown for recipes without a profile
    pub fn author_name(&self) -> &str {
        self.author
            .as_ref()
            .and_then(|author| author.name.as_deref())
            .unwrap_or("Chef Anônimo")
    }
}

/// Ingredient line of a recipe (`receita_ingredientes`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredientRow {
    #[serde(rename = "quantidade", default, deserialize_with = "null_as_default")]
    pub quantity: f64,
    #[serde(rename = "unidade", default, deserialize_with = "null_as_default")]
    pub unit: String,
    #[serde(rename = "ordem", default, deserialize_with = "null_as_default")]
    pub position: i32,
    #[serde(rename = "ingredientes", default)]
    pub ingredient: Option<IngredientRow>,
}

/// Preparation step of a recipe (`receita_passos`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStepRow {
    #[serde(rename = "ordem", default, deserialize_with = "null_as_default")]
    pub position: i32,
    #[serde(rename = "descricao", default, deserialize_with = "null_as_default")]
    pub description: String,
}

/// Recipe with everything its edit form shows: category ids, ingredient
/// lines and steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: RecipeRow,
    #[serde(rename = "receita_ingredientes", default)]
    pub ingredients: Vec<RecipeIngredientRow>,
    #[serde(rename = "receita_passos", default)]
    pub steps: Vec<RecipeStepRow>,
}

/// Recipe category (`categorias`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: Option<String>,
    #[serde(rename = "ativa", default, deserialize_with = "null_as_default")]
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Rating with optional comment (`avaliacoes`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: i64,
    #[serde(rename = "receita_id")]
    pub recipe_id: i64,
    #[serde(rename = "usuario_id")]
    pub user_id: String,
    #[serde(rename = "nota")]
    pub score: i32,
    #[serde(rename = "comentario", default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(rename = "profiles", default, skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorSummary>,
}

/// Follow relation (`seguidores`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Follow {
    pub id: i64,
    #[serde(rename = "seguidor_id")]
    pub follower_id: String,
    #[serde(rename = "seguido_id")]
    pub followed_id: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Bookmark (`receitas_salvas`), optionally with the recipe embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRecipe {
    pub id: i64,
    #[serde(rename = "usuario_id")]
    pub user_id: String,
    #[serde(rename = "receita_id")]
    pub recipe_id: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(rename = "receitas", default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<RecipeRow>,
}

/// Public profile (`profiles`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "nome", default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(rename = "peso", default)]
    pub weight_kg: Option<f64>,
    #[serde(rename = "altura", default)]
    pub height_cm: Option<f64>,
    #[serde(rename = "nivel_atividade", default)]
    pub activity_level: Option<String>,
    #[serde(rename = "objetivo", default)]
    pub goal: Option<String>,
    #[serde(rename = "restricoes_alimentares", default, deserialize_with = "null_as_default")]
    pub dietary_restrictions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_chef: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub receitas_count: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub seguidores_count: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub seguindo_count: i64,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Editable profile columns; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfilePatch {
    #[serde(rename = "nome", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(rename = "peso", skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(rename = "altura", skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(rename = "nivel_atividade", skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<String>,
    #[serde(rename = "objetivo", skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(rename = "restricoes_alimentares", skip_serializing_if = "Option::is_none")]
    pub dietary_restrictions: Option<Vec<String>>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        *self == ProfilePatch::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

/// Picture or clip attached to a recipe (`receita_media`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeMedia {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "receita_id")]
    pub recipe_id: i64,
    pub url: String,
    #[serde(rename = "tipo")]
    pub kind: MediaKind,
    #[serde(rename = "ordem")]
    pub position: i32,
    pub is_main: bool,
}
