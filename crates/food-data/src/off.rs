//! OpenFoodFacts product search

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::{read_json, FoodDataError, FoodSource, RawIngredient, DEFAULT_PAGE_SIZE};
use fitcooker_nutrition::to_number;

const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";

/// Search response of `/cgi/search.pl`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OffSearchResponse {
    #[serde(default)]
    pub products: Vec<OffProduct>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OffProduct {
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub nutriments: HashMap<String, Value>,
    #[serde(default)]
    pub allergens_tags: Vec<String>,
}

impl OffProduct {
    fn nutriment(&self, key: &str) -> Value {
        self.nutriments.get(key).cloned().unwrap_or(Value::Null)
    }

    /// Map the product onto a raw ingredient. Sodium is reported in grams
    /// per 100 g and stored in milligrams.
    pub fn to_raw(&self, query: &str) -> RawIngredient {
        let name = match self.product_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => query.to_string(),
        };
        let sodium_g = to_number(&self.nutriment("sodium_100g"));

        RawIngredient {
            name: json!(name),
            calories: self.nutriment("energy-kcal_100g"),
            protein: self.nutriment("proteins_100g"),
            carbs: self.nutriment("carbohydrates_100g"),
            fat: self.nutriment("fat_100g"),
            fiber: self.nutriment("fiber_100g"),
            sodium: json!(sodium_g * 1000.0),
            unit: json!("g"),
            allergens: self.allergens_tags.clone(),
        }
    }
}

/// Client for the OpenFoodFacts search API
#[derive(Debug, Clone)]
pub struct OpenFoodFactsClient {
    base_url: String,
    http_client: Client,
    page_size: u32,
}

impl OpenFoodFactsClient {
    pub fn new(http_client: Client) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http_client,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Point the client at another host (mirrors, test servers)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    fn search_url(&self, query: &str) -> Result<Url, FoodDataError> {
        let mut url = Url::parse(&format!("{}/cgi/search.pl", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("search_terms", query)
            .append_pair("search_simple", "1")
            .append_pair("action", "process")
            .append_pair("json", "1")
            .append_pair("page_size", &self.page_size.to_string());
        Ok(url)
    }

    /// Raw search response
    pub async fn search_products(&self, query: &str) -> Result<OffSearchResponse, FoodDataError> {
        let url = self.search_url(query)?;
        log::debug!("OpenFoodFacts search: {}", url);

        let response = self.http_client.get(url).send().await?;
        read_json::<OffSearchResponse>(response).await
    }
}

#[async_trait]
impl FoodSource for OpenFoodFactsClient {
    fn name(&self) -> &'static str {
        "openfoodfacts"
    }

    async fn search(&self, query: &str) -> Result<Vec<RawIngredient>, FoodDataError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let response = self.search_products(query).await?;
        Ok(response
            .products
            .iter()
            .map(|product| product.to_raw(query))
            .collect())
    }
}
