//! USDA FoodData Central search

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::{read_json, FoodDataError, FoodSource, RawIngredient, DEFAULT_PAGE_SIZE};

const DEFAULT_BASE_URL: &str = "https://api.nal.usda.gov";

const ENERGY_KCAL: u32 = 1008;
const PROTEIN: u32 = 1003;
const FAT: u32 = 1004;
const CARBOHYDRATE: u32 = 1005;
const FIBER: u32 = 1079;
const SODIUM: u32 = 1093;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsdaSearchResponse {
    #[serde(default)]
    pub foods: Vec<UsdaFood>,
}

/// Search hit; every field may be absent in branded or legacy records
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsdaFood {
    #[serde(default)]
    pub fdc_id: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<UsdaNutrient>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsdaNutrient {
    #[serde(default)]
    pub nutrient_id: Option<u32>,
    #[serde(default)]
    pub nutrient_name: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub unit_name: Option<String>,
}

impl UsdaFood {
    fn nutrient(&self, id: u32) -> Value {
        self.food_nutrients
            .iter()
            .find(|n| n.nutrient_id == Some(id))
            .and_then(|n| n.value)
            .map(|v| json!(v))
            .unwrap_or(Value::Null)
    }

    /// Raw ingredient for the food, `None` when it has no description
    pub fn to_raw(&self) -> Option<RawIngredient> {
        let description = self.description.as_deref().map(str::trim).filter(|d| !d.is_empty())?;
        Some(RawIngredient {
            name: json!(description),
            calories: self.nutrient(ENERGY_KCAL),
            protein: self.nutrient(PROTEIN),
            carbs: self.nutrient(CARBOHYDRATE),
            fat: self.nutrient(FAT),
            fiber: self.nutrient(FIBER),
            sodium: self.nutrient(SODIUM),
            unit: json!("g"),
            allergens: Vec::new(),
        })
    }
}

/// Client for the FoodData Central search endpoint
#[derive(Debug, Clone)]
pub struct UsdaClient {
    base_url: String,
    api_key: String,
    http_client: Client,
    page_size: u32,
}

impl UsdaClient {
    pub fn new(api_key: &str, http_client: Client) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            http_client,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    fn search_url(&self, query: &str) -> Result<Url, FoodDataError> {
        let mut url = Url::parse(&format!("{}/fdc/v1/foods/search", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("api_key", &self.api_key)
            .append_pair("query", query)
            .append_pair("pageSize", &self.page_size.to_string());
        Ok(url)
    }

    pub async fn search_foods(&self, query: &str) -> Result<UsdaSearchResponse, FoodDataError> {
        if self.api_key.is_empty() {
            return Err(FoodDataError::MissingApiKey("USDA FoodData Central"));
        }

        let url = self.search_url(query)?;
        log::debug!("USDA search: {}", query);

        let response = self.http_client.get(url).send().await?;
        read_json::<UsdaSearchResponse>(response).await
    }
}

#[async_trait]
impl FoodSource for UsdaClient {
    fn name(&self) -> &'static str {
        "usda"
    }

    async fn search(&self, query: &str) -> Result<Vec<RawIngredient>, FoodDataError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let response = self.search_foods(query).await?;
        let foods: Vec<RawIngredient> = response.foods.iter().filter_map(UsdaFood::to_raw).collect();
        if foods.len() < response.foods.len() {
            log::debug!(
                "skipped {} USDA foods without a description",
                response.foods.len() - foods.len()
            );
        }
        Ok(foods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitcooker_nutrition::process_ingredient;

    #[test]
    fn test_food_mapping_by_nutrient_id() {
        let food: UsdaFood = serde_json::from_value(json!({
            "fdcId": 171077,
            "description": "Chicken, broilers or fryers, breast, meat only, cooked, roasted",
            "foodNutrients": [
                { "nutrientId": 1003, "nutrientName": "Protein", "value": 31.0, "unitName": "G" },
                { "nutrientId": 1004, "nutrientName": "Total lipid (fat)", "value": 3.57, "unitName": "G" },
                { "nutrientId": 1008, "nutrientName": "Energy", "value": 165.0, "unitName": "KCAL" },
                { "nutrientId": 1093, "nutrientName": "Sodium, Na", "value": 74.0, "unitName": "MG" }
            ]
        }))
        .unwrap();

        let processed = process_ingredient(&food.to_raw().unwrap());
        assert_eq!(
            processed.name,
            "chicken broilers or fryers breast meat only cooked roasted"
        );
        assert_eq!(processed.calories, 165.0);
        assert_eq!(processed.protein, 31.0);
        assert_eq!(processed.fat, 3.57);
        assert_eq!(processed.carbs, 0.0);
        assert_eq!(processed.fiber, 0.0);
        assert_eq!(processed.sodium, 74.0);
    }

    #[test]
    fn test_food_without_description() {
        let food: UsdaFood = serde_json::from_value(json!({
            "fdcId": null,
            "description": "  ",
            "foodNutrients": [{ "nutrientName": "Energy", "value": 100.0 }]
        }))
        .unwrap();
        assert!(food.to_raw().is_none());
        assert!(UsdaFood::default().to_raw().is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = UsdaClient::new("", Client::new());
        let result = client.search("rice").await;
        assert!(matches!(result, Err(FoodDataError::MissingApiKey(_))));
    }
}
