//! Public profiles and per-user statistics

use serde::Deserialize;

use fitcooker_postgrest::SortOrder;

use crate::error::{Error, Result};
use crate::models::{first_row, Profile, ProfilePatch};
use crate::ratings::{average_score, RATINGS_TABLE};
use crate::FitCooker;

pub const PROFILES_TABLE: &str = "profiles";

/// Counters shown on a profile page
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UserStats {
    pub recipes: i64,
    pub followers: i64,
    pub following: i64,
    /// Ratings received on the user's recipes
    pub ratings_received: usize,
    pub average_rating: Option<f64>,
}

#[derive(Deserialize)]
struct ProfileCounters {
    #[serde(default)]
    receitas_count: Option<i64>,
    #[serde(default)]
    seguidores_count: Option<i64>,
    #[serde(default)]
    seguindo_count: Option<i64>,
}

#[derive(Deserialize)]
struct ScoreRow {
    nota: i32,
}

pub struct Profiles<'a> {
    client: &'a FitCooker,
}

impl<'a> Profiles<'a> {
    pub(crate) fn new(client: &'a FitCooker) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: &str) -> Result<Profile> {
        self.client
            .from(PROFILES_TABLE)?
            .select("*")
            .eq("id", id)
            .execute_one()
            .await?
            .ok_or_else(|| Error::not_found(format!("profile {}", id)))
    }

    pub async fn update(&self, user_id: &str, patch: &ProfilePatch) -> Result<Profile> {
        if patch.is_empty() {
            return Err(Error::invalid_input("nothing to update"));
        }

        let updated = self
            .client
            .from(PROFILES_TABLE)?
            .eq("id", user_id)
            .update(patch)
            .await?;
        first_row(updated).map_err(|_| Error::not_found(format!("profile {}", user_id)))
    }

    /// Chef profiles, most followed first
    pub async fn chefs(&self) -> Result<Vec<Profile>> {
        let chefs = self
            .client
            .from(PROFILES_TABLE)?
            .select("*")
            .eq("is_chef", "true")
            .order("seguidores_count", SortOrder::Descending)
            .execute()
            .await?;
        Ok(chefs)
    }

    pub async fn stats(&self, user_id: &str) -> Result<UserStats> {
        let counters: ProfileCounters = self
            .client
            .from(PROFILES_TABLE)?
            .select("receitas_count,seguidores_count,seguindo_count")
            .eq("id", user_id)
            .execute_one()
            .await?
            .ok_or_else(|| Error::not_found(format!("profile {}", user_id)))?;

        let scores: Vec<ScoreRow> = self
            .client
            .from(RATINGS_TABLE)?
            .select("nota,receitas!inner(usuario_id)")
            .eq("receitas.usuario_id", user_id)
            .execute()
            .await?;

        Ok(UserStats {
            recipes: counters.receitas_count.unwrap_or_default(),
            followers: counters.seguidores_count.unwrap_or_default(),
            following: counters.seguindo_count.unwrap_or_default(),
            ratings_received: scores.len(),
            average_rating: average_score(scores.iter().map(|s| s.nota)),
        })
    }
}
