//! Configuration for the FitCooker client

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Food database used when the ingredient cache has no match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FoodSourceKind {
    #[default]
    OpenFoodFacts,
    Usda,
}

impl FromStr for FoodSourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "off" | "openfoodfacts" | "open-food-facts" => Ok(FoodSourceKind::OpenFoodFacts),
            "usda" | "fdc" => Ok(FoodSourceKind::Usda),
            other => Err(Error::config(format!("unknown food source: {}", other))),
        }
    }
}

impl fmt::Display for FoodSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoodSourceKind::OpenFoodFacts => f.write_str("openfoodfacts"),
            FoodSourceKind::Usda => f.write_str("usda"),
        }
    }
}

/// Connection settings for the hosted backend and the food databases
#[derive(Debug, Clone)]
pub struct FitCookerConfig {
    pub url: Url,
    pub anon_key: String,
    pub usda_api_key: Option<String>,
    pub food_source: FoodSourceKind,
}

impl FitCookerConfig {
    /// Creates a new configuration, validating the URL.
    pub fn new(url_str: &str, anon_key: &str) -> Result<Self> {
        let url = Url::parse(url_str)?;
        if anon_key.trim().is_empty() {
            return Err(Error::config("anon_key cannot be empty"));
        }
        Ok(Self {
            url,
            anon_key: anon_key.to_string(),
            usda_api_key: None,
            food_source: FoodSourceKind::default(),
        })
    }

    /// Reads `SUPABASE_URL`, `SUPABASE_ANON_KEY` and the optional
    /// `FITCOOKER_FOOD_SOURCE` and `USDA_API_KEY`
    pub fn from_env() -> Result<Self> {
        let url_str = std::env::var("SUPABASE_URL")
            .map_err(|_| Error::config("SUPABASE_URL environment variable not found"))?;
        let anon_key = std::env::var("SUPABASE_ANON_KEY")
            .map_err(|_| Error::config("SUPABASE_ANON_KEY environment variable not found"))?;

        let mut config = Self::new(&url_str, &anon_key)?;
        if let Ok(source) = std::env::var("FITCOOKER_FOOD_SOURCE") {
            config.food_source = source.parse()?;
        }
        config.usda_api_key = std::env::var("USDA_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        config.validate()?;
        Ok(config)
    }

    pub fn with_food_source(mut self, food_source: FoodSourceKind) -> Self {
        self.food_source = food_source;
        self
    }

    pub fn with_usda_api_key(mut self, key: &str) -> Self {
        self.usda_api_key = Some(key.to_string());
        self
    }

    /// USDA lookups need a key
    pub fn validate(&self) -> Result<()> {
        if self.food_source == FoodSourceKind::Usda && self.usda_api_key.is_none() {
            return Err(Error::config(
                "USDA_API_KEY is required when the food source is usda",
            ));
        }
        Ok(())
    }

    /// Base URL without the trailing slash `Url` adds
    pub fn base_url(&self) -> &str {
        self.url.as_str().trim_end_matches('/')
    }
}

/// Client behaviour options
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Keep the signed-in session in memory
    pub persist_session: bool,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Products requested per food database search
    pub food_page_size: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            persist_session: true,
            request_timeout: Some(Duration::from_secs(30)),
            food_page_size: fitcooker_food_data::DEFAULT_PAGE_SIZE,
        }
    }
}

impl ClientOptions {
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    pub fn with_food_page_size(mut self, value: u32) -> Self {
        self.food_page_size = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = FitCookerConfig::new("https://project.supabase.co", "anon").unwrap();
        assert_eq!(config.base_url(), "https://project.supabase.co");
        assert_eq!(config.food_source, FoodSourceKind::OpenFoodFacts);

        assert!(matches!(
            FitCookerConfig::new("https://project.supabase.co", " "),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            FitCookerConfig::new("not a url", "anon"),
            Err(Error::Url(_))
        ));
    }

    #[test]
    fn test_usda_requires_key() {
        let config = FitCookerConfig::new("https://project.supabase.co", "anon")
            .unwrap()
            .with_food_source(FoodSourceKind::Usda);
        assert!(config.validate().is_err());
        assert!(config.with_usda_api_key("key").validate().is_ok());
    }

    #[test]
    fn test_food_source_parse() {
        assert_eq!("USDA".parse::<FoodSourceKind>().unwrap(), FoodSourceKind::Usda);
        assert_eq!(
            "openfoodfacts".parse::<FoodSourceKind>().unwrap(),
            FoodSourceKind::OpenFoodFacts
        );
        assert!("edamam".parse::<FoodSourceKind>().is_err());
    }

    #[test]
    fn test_options_builder() {
        let options = ClientOptions::default()
            .with_persist_session(false)
            .with_request_timeout(None)
            .with_food_page_size(10);
        assert!(!options.persist_session);
        assert!(options.request_timeout.is_none());
        assert_eq!(options.food_page_size, 10);
    }
}
