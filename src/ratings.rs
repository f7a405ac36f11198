//! Recipe ratings and their comments
//!
//! A user holds at most one rating per recipe: rating again replaces the
//! score and comment of the existing row.

use serde_json::{json, Value};

use fitcooker_nutrition::round_to;
use fitcooker_postgrest::SortOrder;

use crate::error::{Error, Result};
use crate::models::{first_row, Rating, RowId};
use crate::FitCooker;

pub const RATINGS_TABLE: &str = "avaliacoes";

pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 5;

const LIST_COLUMNS: &str = "*,profiles!usuario_id(nome,avatar_url)";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub count: usize,
    /// Mean score rounded to one decimal, `None` without ratings
    pub average: Option<f64>,
}

pub fn summarize(ratings: &[Rating]) -> RatingSummary {
    RatingSummary {
        count: ratings.len(),
        average: average_score(ratings.iter().map(|r| r.score)),
    }
}

pub(crate) fn average_score<I: IntoIterator<Item = i32>>(scores: I) -> Option<f64> {
    let (sum, count) = scores
        .into_iter()
        .fold((0i64, 0usize), |(sum, count), score| (sum + score as i64, count + 1));
    if count == 0 {
        None
    } else {
        Some(round_to(sum as f64 / count as f64, 1))
    }
}

fn check_score(score: i32) -> Result<()> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "score must be between {} and {}, got {}",
            MIN_SCORE, MAX_SCORE, score
        )))
    }
}

// Blank comments are stored as null.
fn comment_value(comment: Option<&str>) -> Value {
    match comment.map(str::trim) {
        Some(text) if !text.is_empty() => Value::String(text.to_string()),
        _ => Value::Null,
    }
}

pub struct Ratings<'a> {
    client: &'a FitCooker,
}

impl<'a> Ratings<'a> {
    pub(crate) fn new(client: &'a FitCooker) -> Self {
        Self { client }
    }

    /// Rate a recipe, replacing the user's earlier rating if there is one
    pub async fn rate(
        &self,
        recipe_id: i64,
        user_id: &str,
        score: i32,
        comment: Option<&str>,
    ) -> Result<Rating> {
        check_score(score)?;

        let existing: Option<RowId> = self
            .client
            .from(RATINGS_TABLE)?
            .select("id")
            .eq("receita_id", &recipe_id.to_string())
            .eq("usuario_id", user_id)
            .execute_one()
            .await?;

        let written = match existing {
            Some(row) => {
                tracing::debug!(rating_id = row.id, recipe_id, "replacing rating");
                self.client
                    .from(RATINGS_TABLE)?
                    .eq("id", &row.id.to_string())
                    .update(json!({
                        "nota": score,
                        "comentario": comment_value(comment),
                        "updated_at": chrono::Utc::now().to_rfc3339(),
                    }))
                    .await?
            }
            None => {
                self.client
                    .from(RATINGS_TABLE)?
                    .insert(json!({
                        "receita_id": recipe_id,
                        "usuario_id": user_id,
                        "nota": score,
                        "comentario": comment_value(comment),
                    }))
                    .await?
            }
        };
        first_row(written)
    }

    pub async fn user_rating(&self, recipe_id: i64, user_id: &str) -> Result<Option<Rating>> {
        let rating = self
            .client
            .from(RATINGS_TABLE)?
            .select("*")
            .eq("receita_id", &recipe_id.to_string())
            .eq("usuario_id", user_id)
            .execute_one()
            .await?;
        Ok(rating)
    }

    /// Ratings of a recipe with their authors, newest first
    pub async fn list_for_recipe(&self, recipe_id: i64) -> Result<Vec<Rating>> {
        let ratings = self
            .client
            .from(RATINGS_TABLE)?
            .select(LIST_COLUMNS)
            .eq("receita_id", &recipe_id.to_string())
            .order("created_at", SortOrder::Descending)
            .execute()
            .await?;
        Ok(ratings)
    }

    /// Change the comment of a rating, and its score when given
    pub async fn edit_comment(&self, id: i64, comment: &str, score: Option<i32>) -> Result<Rating> {
        let mut body = json!({
            "comentario": comment_value(Some(comment)),
            "updated_at": chrono::Utc::now().to_rfc3339(),
        });
        if let Some(score) = score {
            check_score(score)?;
            body["nota"] = json!(score);
        }

        let updated = self
            .client
            .from(RATINGS_TABLE)?
            .eq("id", &id.to_string())
            .update(body)
            .await?;
        first_row(updated).map_err(|_| Error::not_found(format!("rating {}", id)))
    }

    pub async fn delete_comment(&self, id: i64) -> Result<()> {
        self.client
            .from(RATINGS_TABLE)?
            .eq("id", &id.to_string())
            .delete()
            .await?;
        Ok(())
    }
}
