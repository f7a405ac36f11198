//! FitCooker client library
//!
//! Client core of the FitCooker recipe-sharing platform: ingredient lookup
//! and normalization, nutrition calculators, and the recipe, rating, follow
//! and profile operations backed by the hosted database.
//!
//! ```no_run
//! use fitcooker::{FitCooker, FitCookerConfig};
//!
//! # async fn run() -> fitcooker::Result<()> {
//! let fitcooker = FitCooker::new(FitCookerConfig::from_env()?)?;
//! let oats = fitcooker.catalog().search("aveia").await?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod categories;
pub mod config;
pub mod error;
pub mod media;
pub mod models;
pub mod profiles;
pub mod ratings;
pub mod recipes;
pub mod saved;
pub mod social;

use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;

use fitcooker_auth::{Auth, AuthOptions};
use fitcooker_food_data::{FoodSource, OpenFoodFactsClient, UsdaClient};
use fitcooker_postgrest::PostgrestClient;
use fitcooker_storage::StorageClient;

pub use config::{ClientOptions, FitCookerConfig, FoodSourceKind};
pub use error::{Error, Result};

pub use fitcooker_auth as auth;
pub use fitcooker_food_data as food_data;
pub use fitcooker_nutrition as nutrition;
pub use fitcooker_postgrest as postgrest;
pub use fitcooker_storage as storage;

/// The main entry point for the FitCooker client
pub struct FitCooker {
    url: String,
    key: String,
    http_client: Client,
    auth: Auth,
    food_source: Arc<dyn FoodSource>,
    options: ClientOptions,
}

impl FitCooker {
    pub fn new(config: FitCookerConfig) -> Result<Self> {
        Self::new_with_options(config, ClientOptions::default())
    }

    pub fn new_with_options(config: FitCookerConfig, options: ClientOptions) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let auth = Auth::new(
            config.base_url(),
            &config.anon_key,
            http_client.clone(),
            AuthOptions {
                persist_session: options.persist_session,
            },
        );

        let food_source: Arc<dyn FoodSource> = match config.food_source {
            FoodSourceKind::OpenFoodFacts => Arc::new(
                OpenFoodFactsClient::new(http_client.clone())
                    .with_page_size(options.food_page_size),
            ),
            FoodSourceKind::Usda => {
                let key = config
                    .usda_api_key
                    .as_deref()
                    .ok_or_else(|| Error::config("USDA_API_KEY is not set"))?;
                Arc::new(
                    UsdaClient::new(key, http_client.clone())
                        .with_page_size(options.food_page_size),
                )
            }
        };

        tracing::debug!(url = config.base_url(), source = %config.food_source, "FitCooker client ready");

        Ok(Self {
            url: config.base_url().to_string(),
            key: config.anon_key,
            http_client,
            auth,
            food_source,
            options,
        })
    }

    /// Replace the food database consulted on cache misses
    pub fn with_food_source(mut self, food_source: Arc<dyn FoodSource>) -> Self {
        self.food_source = food_source;
        self
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn food_source(&self) -> &dyn FoodSource {
        self.food_source.as_ref()
    }

    /// Id of the signed-in user, if any
    pub fn current_user_id(&self) -> Option<String> {
        self.auth.get_session().map(|session| session.user.id)
    }

    /// Row access to `table`, authorized as the signed-in user when there is one
    pub fn from(&self, table: &str) -> Result<PostgrestClient> {
        let client = PostgrestClient::new(&self.url, &self.key, table, self.http_client.clone());
        self.authorize(client)
    }

    /// Call the stored function `function` with `params`
    pub fn rpc(&self, function: &str, params: Value) -> Result<PostgrestClient> {
        let client = PostgrestClient::rpc(
            &self.url,
            &self.key,
            function,
            params,
            self.http_client.clone(),
        );
        self.authorize(client)
    }

    // Anonymous requests carry the anon key as their bearer token.
    fn authorize(&self, client: PostgrestClient) -> Result<PostgrestClient> {
        let token = self.auth.access_token().unwrap_or_else(|| self.key.clone());
        Ok(client.with_auth(&token)?)
    }

    pub fn storage(&self) -> StorageClient {
        let storage = StorageClient::new(&self.url, &self.key, self.http_client.clone());
        match self.auth.access_token() {
            Some(token) => storage.with_auth(&token),
            None => storage,
        }
    }

    pub fn catalog(&self) -> catalog::Catalog<'_> {
        catalog::Catalog::new(self)
    }

    pub fn recipes(&self) -> recipes::Recipes<'_> {
        recipes::Recipes::new(self)
    }

    pub fn ratings(&self) -> ratings::Ratings<'_> {
        ratings::Ratings::new(self)
    }

    pub fn social(&self) -> social::Social<'_> {
        social::Social::new(self)
    }

    pub fn saved(&self) -> saved::SavedRecipes<'_> {
        saved::SavedRecipes::new(self)
    }

    pub fn profiles(&self) -> profiles::Profiles<'_> {
        profiles::Profiles::new(self)
    }

    pub fn categories(&self) -> categories::Categories<'_> {
        categories::Categories::new(self)
    }

    pub fn media(&self) -> media::Media<'_> {
        media::Media::new(self)
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::{ClientOptions, FitCookerConfig, FoodSourceKind};
    pub use crate::error::{Error, Result};
    pub use crate::models::*;
    pub use crate::FitCooker;
    pub use fitcooker_nutrition::{ProcessedIngredient, RawIngredient, Unit};
}
