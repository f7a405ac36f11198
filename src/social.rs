//! Follow relations between users

use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::models::{first_row, Follow, Profile, RowId};
use crate::profiles::PROFILES_TABLE;
use crate::FitCooker;

pub const FOLLOWS_TABLE: &str = "seguidores";

const PROFILE_SUMMARY_COLUMNS: &str = "id,user_id,nome,avatar_url";

#[derive(Deserialize)]
struct FollowerId {
    seguidor_id: String,
}

#[derive(Deserialize)]
struct FollowedId {
    seguido_id: String,
}

pub struct Social<'a> {
    client: &'a FitCooker,
}

impl<'a> Social<'a> {
    pub(crate) fn new(client: &'a FitCooker) -> Self {
        Self { client }
    }

    pub async fn is_following(&self, follower_id: &str, followed_id: &str) -> Result<bool> {
        let row: Option<RowId> = self
            .client
            .from(FOLLOWS_TABLE)?
            .select("id")
            .eq("seguidor_id", follower_id)
            .eq("seguido_id", followed_id)
            .execute_one()
            .await?;
        Ok(row.is_some())
    }

    pub async fn follow(&self, follower_id: &str, followed_id: &str) -> Result<Follow> {
        if follower_id == followed_id {
            return Err(Error::invalid_input("users cannot follow themselves"));
        }

        let inserted = self
            .client
            .from(FOLLOWS_TABLE)?
            .insert(json!({
                "seguidor_id": follower_id,
                "seguido_id": followed_id,
            }))
            .await?;
        tracing::debug!(follower_id, followed_id, "followed");
        first_row(inserted)
    }

    pub async fn unfollow(&self, follower_id: &str, followed_id: &str) -> Result<()> {
        self.client
            .from(FOLLOWS_TABLE)?
            .eq("seguidor_id", follower_id)
            .eq("seguido_id", followed_id)
            .delete()
            .await?;
        tracing::debug!(follower_id, followed_id, "unfollowed");
        Ok(())
    }

    /// Follow or unfollow; returns whether `follower_id` now follows
    pub async fn toggle(&self, follower_id: &str, followed_id: &str) -> Result<bool> {
        if self.is_following(follower_id, followed_id).await? {
            self.unfollow(follower_id, followed_id).await?;
            Ok(false)
        } else {
            self.follow(follower_id, followed_id).await?;
            Ok(true)
        }
    }

    /// Profiles of the users following `user_id`
    pub async fn followers(&self, user_id: &str) -> Result<Vec<Profile>> {
        let rows: Vec<FollowerId> = self
            .client
            .from(FOLLOWS_TABLE)?
            .select("seguidor_id")
            .eq("seguido_id", user_id)
            .execute()
            .await?;
        let ids: Vec<String> = rows.into_iter().map(|r| r.seguidor_id).collect();
        self.profiles_of(&ids).await
    }

    /// Profiles of the users `user_id` follows
    pub async fn following(&self, user_id: &str) -> Result<Vec<Profile>> {
        let rows: Vec<FollowedId> = self
            .client
            .from(FOLLOWS_TABLE)?
            .select("seguido_id")
            .eq("seguidor_id", user_id)
            .execute()
            .await?;
        let ids: Vec<String> = rows.into_iter().map(|r| r.seguido_id).collect();
        self.profiles_of(&ids).await
    }

    async fn profiles_of(&self, user_ids: &[String]) -> Result<Vec<Profile>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<&str> = user_ids.iter().map(String::as_str).collect();
        let profiles = self
            .client
            .from(PROFILES_TABLE)?
            .select(PROFILE_SUMMARY_COLUMNS)
            .in_list("user_id", &ids)
            .execute()
            .await?;
        Ok(profiles)
    }
}
