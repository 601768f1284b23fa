use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::retry::{is_retryable_status, with_retry, RetryConfig, Retryable};

/// Catalog base URL, overridable when the binary is built
pub const DEFAULT_BASE_URL: &str = match option_env!("COMPASS_API_BASE_URL") {
    Some(url) => url,
    None => "https://www.themealdb.com/api/json/v1/1/",
};

/// TheMealDB numbers its ingredient columns 1 through 20
const INGREDIENT_SLOTS: usize = 20;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Error, Debug)]
pub enum MealDbError {
    #[error("API returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl Retryable for MealDbError {
    fn is_retryable(&self) -> bool {
        match self {
            MealDbError::Status { status, .. } => is_retryable_status(*status),
            MealDbError::RateLimitExceeded => true,
            MealDbError::NetworkError(e) => e.is_timeout() || e.is_connect(),
            MealDbError::ParseError(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, MealDbError>;

pub struct MealDbClient {
    client: reqwest::Client,
    base_url: String,
    retry_config: RetryConfig,
}

impl MealDbClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    /// For mirrors, paid API keys (`/api/json/v2/<key>/`) or test servers
    pub fn with_base_url(base_url: String) -> Self {
        Self::with_options(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_options(base_url: String, timeout: Duration) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("CulinaryCompass/0.1.0"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: normalize_base_url(base_url),
            retry_config: RetryConfig::default(),
        }
    }

    /// Replace the retry configuration
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search meals by name; full records
    pub async fn search_meals(&self, query: &str) -> Result<Vec<MealDbMeal>> {
        self.fetch_meals("search.php", &[("s", query)]).await
    }

    /// Look a single meal up by id; `None` when the catalog has no such meal
    pub async fn lookup_meal(&self, id: &str) -> Result<Option<MealDbMeal>> {
        let meals: Vec<MealDbMeal> = self.fetch_meals("lookup.php", &[("i", id)]).await?;
        Ok(meals.into_iter().next())
    }

    /// Meals in a category; partial records (id, name, thumbnail)
    pub async fn filter_by_category(&self, category: &str) -> Result<Vec<MealDbMealRef>> {
        self.fetch_meals("filter.php", &[("c", category)]).await
    }

    /// Meals from an area (cuisine); partial records (id, name, thumbnail)
    pub async fn filter_by_area(&self, area: &str) -> Result<Vec<MealDbMealRef>> {
        self.fetch_meals("filter.php", &[("a", area)]).await
    }

    pub async fn list_categories(&self) -> Result<Vec<String>> {
        let entries: Vec<CategoryEntry> =
            self.fetch_meals("list.php", &[("c", "list")]).await?;
        Ok(entries.into_iter().map(|e| e.category).collect())
    }

    pub async fn list_areas(&self) -> Result<Vec<String>> {
        let entries: Vec<AreaEntry> = self.fetch_meals("list.php", &[("a", "list")]).await?;
        Ok(entries.into_iter().map(|e| e.area).collect())
    }

    /// One random meal per call
    pub async fn random_meal(&self) -> Result<Option<MealDbMeal>> {
        let meals: Vec<MealDbMeal> = self.fetch_meals("random.php", &[]).await?;
        Ok(meals.into_iter().next())
    }

    /// GET an endpoint and unwrap its `meals` array
    async fn fetch_meals<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("GET {} {:?}", url, params);

        let body = with_retry(&self.retry_config, || async {
            let response = self.client.get(&url).query(params).send().await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(MealDbError::RateLimitExceeded);
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(MealDbError::Status { status, body });
            }

            let body: Value = response.json().await?;
            Ok(body)
        })
        .await?;

        normalize_meals(body)
    }
}

impl Default for MealDbClient {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_base_url(mut base_url: String) -> String {
    if !base_url.ends_with('/') {
        base_url.push('/');
    }
    base_url
}

/// Pull the `meals` array out of a response body.
///
/// The API answers "nothing" in several ways: `null`, a missing key, or a
/// bare string such as `"no data found"`. All of them become an empty list.
pub(crate) fn normalize_meals<T: DeserializeOwned>(mut body: Value) -> Result<Vec<T>> {
    match body.get_mut("meals").map(Value::take) {
        Some(list @ Value::Array(_)) => Ok(serde_json::from_value(list)?),
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(other) => {
            debug!("Treating non-list meals payload as empty: {}", other);
            Ok(Vec::new())
        }
    }
}

// A null name shows up on some records; treat it like a blank one
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Full meal record as returned by search, lookup and random
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealDbMeal {
    #[serde(rename = "idMeal")]
    pub id: String,
    #[serde(rename = "strMeal", default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(rename = "strMealThumb", default)]
    pub thumbnail: Option<String>,
    #[serde(rename = "strCategory", default)]
    pub category: Option<String>,
    #[serde(rename = "strArea", default)]
    pub area: Option<String>,
    #[serde(rename = "strInstructions", default)]
    pub instructions: Option<String>,
    #[serde(rename = "strTags", default)]
    pub tags: Option<String>,
    #[serde(rename = "strYoutube", default)]
    pub youtube: Option<String>,
    #[serde(rename = "strSource", default)]
    pub source: Option<String>,
    /// Numbered ingredient/measure columns and anything else the API adds
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl MealDbMeal {
    /// Ingredients in column order, skipping blank slots
    pub fn ingredients(&self) -> Vec<MealDbIngredient> {
        (1..=INGREDIENT_SLOTS)
            .filter_map(|slot| {
                let name = self.column(&format!("strIngredient{}", slot))?;
                let measure = self
                    .column(&format!("strMeasure{}", slot))
                    .unwrap_or_default();
                Some(MealDbIngredient {
                    name: name.to_string(),
                    measure: measure.to_string(),
                })
            })
            .collect()
    }

    fn column(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealDbIngredient {
    pub name: String,
    pub measure: String,
}

/// Partial meal record as returned by the filter endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealDbMealRef {
    #[serde(rename = "idMeal")]
    pub id: String,
    #[serde(rename = "strMeal", default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(rename = "strMealThumb", default)]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryEntry {
    #[serde(rename = "strCategory")]
    category: String,
}

#[derive(Debug, Deserialize)]
struct AreaEntry {
    #[serde(rename = "strArea")]
    area: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn teriyaki() -> Value {
        json!({
            "idMeal": "52772",
            "strMeal": "Teriyaki Chicken Casserole",
            "strMealThumb": "https://www.themealdb.com/images/media/meals/wvpsxx1468256321.jpg",
            "strCategory": "Chicken",
            "strArea": "Japanese",
            "strInstructions": "Preheat oven to 350F.",
            "strTags": "Meat,Casserole",
            "strYoutube": "https://www.youtube.com/watch?v=4aZr5hZXP_s",
            "strIngredient1": "soy sauce",
            "strMeasure1": "3/4 cup",
            "strIngredient2": "water",
            "strMeasure2": "1/2 cup",
            "strIngredient3": "",
            "strMeasure3": " ",
            "strIngredient4": null,
            "strMeasure4": null,
            "strIngredient5": "brown sugar",
            "strMeasure5": null,
            "strSource": null,
            "dateModified": null
        })
    }

    #[test]
    fn test_normalize_meals_list() {
        let meals: Vec<MealDbMeal> = normalize_meals(json!({ "meals": [teriyaki()] })).unwrap();
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].id, "52772");
        assert_eq!(meals[0].category.as_deref(), Some("Chicken"));
        assert_eq!(meals[0].source, None);
    }

    #[test]
    fn test_normalize_meals_empty_shapes() {
        let null: Vec<MealDbMeal> = normalize_meals(json!({ "meals": null })).unwrap();
        assert!(null.is_empty());

        let missing: Vec<MealDbMeal> = normalize_meals(json!({})).unwrap();
        assert!(missing.is_empty());

        let text: Vec<MealDbMeal> = normalize_meals(json!({ "meals": "no data found" })).unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn test_normalize_meals_rejects_malformed_entries() {
        let result: Result<Vec<MealDbMeal>> = normalize_meals(json!({ "meals": [{ "strMeal": 3 }] }));
        assert!(matches!(result, Err(MealDbError::ParseError(_))));
    }

    #[test]
    fn test_null_meal_name_does_not_sink_the_list() {
        let meals: Vec<MealDbMeal> = normalize_meals(json!({
            "meals": [
                { "idMeal": "1", "strMeal": null },
                { "idMeal": "2" },
                { "idMeal": "52772", "strMeal": "Teriyaki Chicken Casserole" }
            ]
        }))
        .unwrap();

        let names: Vec<&str> = meals.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["", "", "Teriyaki Chicken Casserole"]);

        let refs: Vec<MealDbMealRef> =
            normalize_meals(json!({ "meals": [{ "idMeal": "1", "strMeal": null }] })).unwrap();
        assert_eq!(refs[0].name, "");
    }

    #[test]
    fn test_ingredients_skip_blank_slots() {
        let meal: MealDbMeal = serde_json::from_value(teriyaki()).unwrap();
        let ingredients = meal.ingredients();

        assert_eq!(ingredients.len(), 3);
        assert_eq!(
            ingredients[0],
            MealDbIngredient {
                name: "soy sauce".to_string(),
                measure: "3/4 cup".to_string(),
            }
        );
        assert_eq!(ingredients[1].name, "water");
        assert_eq!(ingredients[2].name, "brown sugar");
        assert_eq!(ingredients[2].measure, "");
    }

    #[test]
    fn test_filter_refs_and_lists() {
        let refs: Vec<MealDbMealRef> = normalize_meals(json!({
            "meals": [{ "strMeal": "Kung Pao Chicken", "strMealThumb": "t", "idMeal": "52945" }]
        }))
        .unwrap();
        assert_eq!(refs[0].id, "52945");

        let categories: Vec<CategoryEntry> = normalize_meals(json!({
            "meals": [{ "strCategory": "Beef" }, { "strCategory": "Chicken" }]
        }))
        .unwrap();
        let names: Vec<_> = categories.into_iter().map(|c| c.category).collect();
        assert_eq!(names, vec!["Beef", "Chicken"]);
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = MealDbClient::with_base_url("http://localhost:9000/api".to_string());
        assert_eq!(client.base_url(), "http://localhost:9000/api/");

        let client = MealDbClient::new();
        assert!(client.base_url().ends_with('/'));
    }

    #[test]
    fn test_status_errors_classify_for_retry() {
        let server = MealDbError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: String::new(),
        };
        let missing = MealDbError::Status {
            status: reqwest::StatusCode::NOT_FOUND,
            body: String::new(),
        };
        assert!(server.is_retryable());
        assert!(!missing.is_retryable());
        assert!(MealDbError::RateLimitExceeded.is_retryable());
    }
}
