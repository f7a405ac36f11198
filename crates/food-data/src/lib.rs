//! Food database lookups for FitCooker
//!
//! This crate queries public food databases and maps their products onto
//! loosely typed [`RawIngredient`] records, ready for normalization.
//!
//! # Sources
//!
//! - [`OpenFoodFactsClient`]: OpenFoodFacts product search
//! - [`UsdaClient`]: USDA FoodData Central food search

mod off;
mod usda;

use async_trait::async_trait;
use thiserror::Error;

pub use fitcooker_nutrition::RawIngredient;
pub use off::{OffProduct, OffSearchResponse, OpenFoodFactsClient};
pub use usda::{UsdaClient, UsdaFood, UsdaNutrient, UsdaSearchResponse};

/// Number of products requested per search
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Errors returned by food database clients
#[derive(Error, Debug)]
pub enum FoodDataError {
    #[error("API error: {message} (Status: {status})")]
    ApiError {
        message: String,
        status: reqwest::StatusCode,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Missing API key for {0}")]
    MissingApiKey(&'static str),
}

/// A searchable food database
#[async_trait]
pub trait FoodSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Search products matching `query`
    ///
    /// A blank query returns no products without contacting the service.
    async fn search(&self, query: &str) -> Result<Vec<RawIngredient>, FoodDataError>;
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, FoodDataError> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response".to_string());
        return Err(FoodDataError::ApiError { message, status });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| FoodDataError::DeserializationError(e.to_string()))
}
