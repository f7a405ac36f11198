//! Error handling for the FitCooker client

use std::fmt;
use thiserror::Error;

use fitcooker_auth::AuthError;
use fitcooker_food_data::FoodDataError;
use fitcooker_nutrition::NutritionError;
use fitcooker_postgrest::PostgrestError;
use fitcooker_storage::StorageError;

/// Unified error type for the FitCooker client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Sign-in and session errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Row API errors
    #[error("Database error: {0}")]
    Database(#[from] PostgrestError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Food database lookups
    #[error("Food data error: {0}")]
    FoodData(#[from] FoodDataError),

    #[error("{0}")]
    Nutrition(#[from] NutritionError),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected before any request was made
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation needs a signed-in user
    #[error("Not signed in")]
    NotSignedIn,

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    pub fn invalid_input<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidInput(msg.to_string())
    }

    pub fn not_found<T: fmt::Display>(msg: T) -> Self {
        Error::NotFound(msg.to_string())
    }

    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// Whether the backend rejected a row as a duplicate
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Error::Database(e) if e.is_duplicate())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
