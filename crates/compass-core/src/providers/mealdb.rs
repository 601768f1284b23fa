// TheMealDB provider - bridges the API client with the RecipeCatalog trait
use std::future::Future;

use async_trait::async_trait;
use compass_api::{MealDbClient, MealDbError, MealDbMeal, MealDbMealRef};
use futures::future::try_join_all;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::info;

use crate::{
    catalog::RecipeCatalog,
    models::{Ingredient, Recipe},
    Error, Result,
};

/// Filter results are hydrated one lookup per recipe; keep this many in flight
const MAX_CONCURRENT_LOOKUPS: usize = 8;

/// Wrapper around MealDbClient that implements RecipeCatalog
pub struct MealDbProvider {
    client: MealDbClient,
}

impl MealDbProvider {
    pub fn new(client: MealDbClient) -> Self {
        Self { client }
    }
}

fn ref_ids(refs: Vec<MealDbMealRef>) -> Vec<String> {
    refs.into_iter().map(|r| r.id).collect()
}

/// Turn filter hits (id, name, thumbnail only) into full recipes.
///
/// Order follows `ids`. An id whose lookup comes back empty is skipped;
/// any failed lookup fails the whole batch.
async fn hydrate(catalog: &dyn RecipeCatalog, ids: Vec<String>) -> Result<Vec<Recipe>> {
    info!("Hydrating {} filter results", ids.len());

    let recipes: Vec<Option<Recipe>> = stream::iter(ids)
        .map(|id| async move { catalog.find_by_id(&id).await })
        .buffered(MAX_CONCURRENT_LOOKUPS)
        .try_collect()
        .await?;

    Ok(recipes.into_iter().flatten().collect())
}

/// Run `pick` `count` times concurrently, keeping the picks that found a recipe
async fn sample<F, Fut>(count: usize, pick: F) -> Result<Vec<Recipe>>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Option<Recipe>>>,
{
    let picks = try_join_all((0..count).map(|_| pick())).await?;
    Ok(picks.into_iter().flatten().collect())
}

#[async_trait]
impl RecipeCatalog for MealDbProvider {
    async fn find_by_text(&self, query: &str) -> Result<Vec<Recipe>> {
        let meals = self.client.search_meals(query).await.map_err(api_error)?;
        Ok(meals.into_iter().map(meal_to_recipe).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Recipe>> {
        let meal = self.client.lookup_meal(id).await.map_err(api_error)?;
        Ok(meal.map(meal_to_recipe))
    }

    async fn find_by_category(&self, category: &str) -> Result<Vec<Recipe>> {
        let refs = self
            .client
            .filter_by_category(category)
            .await
            .map_err(api_error)?;
        hydrate(self, ref_ids(refs)).await
    }

    async fn find_by_area(&self, area: &str) -> Result<Vec<Recipe>> {
        let refs = self.client.filter_by_area(area).await.map_err(api_error)?;
        hydrate(self, ref_ids(refs)).await
    }

    async fn list_categories(&self) -> Result<Vec<String>> {
        self.client.list_categories().await.map_err(api_error)
    }

    async fn list_areas(&self) -> Result<Vec<String>> {
        self.client.list_areas().await.map_err(api_error)
    }

    async fn random_sample(&self, count: usize) -> Result<Vec<Recipe>> {
        let client = &self.client;
        sample(count, move || async move {
            let meal = client.random_meal().await.map_err(api_error)?;
            Ok(meal.map(meal_to_recipe))
        })
        .await
    }
}

fn api_error(e: MealDbError) -> Error {
    Error::ApiError(e.to_string())
}

/// Convert a TheMealDB meal to our internal Recipe model
fn meal_to_recipe(meal: MealDbMeal) -> Recipe {
    let ingredients = meal
        .ingredients()
        .into_iter()
        .map(|i| Ingredient {
            name: i.name,
            measure: i.measure,
        })
        .collect();

    let tags = meal
        .tags
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();

    Recipe {
        id: meal.id,
        name: meal.name,
        thumbnail_url: meal.thumbnail.unwrap_or_default(),
        category: meal.category.unwrap_or_default(),
        area: meal.area.unwrap_or_default(),
        instructions: meal.instructions.unwrap_or_default(),
        tags,
        youtube_url: non_blank(meal.youtube),
        source_url: non_blank(meal.source),
        ingredients,
    }
}

// The API sends "" as often as null for missing links
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MockRecipeCatalog;
    use mockall::predicate::eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recipe(id: &str) -> Recipe {
        Recipe {
            id: id.to_string(),
            name: format!("Recipe {}", id),
            thumbnail_url: String::new(),
            category: "Seafood".to_string(),
            area: "Thai".to_string(),
            instructions: String::new(),
            tags: Vec::new(),
            youtube_url: None,
            source_url: None,
            ingredients: Vec::new(),
        }
    }

    fn ids(recipes: &[Recipe]) -> Vec<&str> {
        recipes.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_meal_to_recipe() {
        let meal: MealDbMeal = serde_json::from_value(json!({
            "idMeal": "52772",
            "strMeal": "Teriyaki Chicken Casserole",
            "strMealThumb": "u1",
            "strCategory": "Chicken",
            "strArea": "Japanese",
            "strInstructions": "Preheat oven to 350F.",
            "strTags": "Meat, Casserole,",
            "strYoutube": "https://www.youtube.com/watch?v=4aZr5hZXP_s",
            "strSource": "",
            "strIngredient1": "soy sauce",
            "strMeasure1": "3/4 cup"
        }))
        .unwrap();

        let recipe = meal_to_recipe(meal);

        assert_eq!(recipe.id, "52772");
        assert_eq!(recipe.subtitle(), "Chicken | Japanese");
        assert_eq!(recipe.tags, vec!["Meat", "Casserole"]);
        assert_eq!(recipe.source_url, None);
        assert!(recipe.youtube_url.is_some());
        assert_eq!(recipe.ingredients.len(), 1);
        assert_eq!(recipe.ingredients[0].to_string(), "soy sauce - 3/4 cup");
    }

    #[test]
    fn test_missing_display_fields_become_empty() {
        let meal: MealDbMeal = serde_json::from_value(json!({
            "idMeal": "1",
            "strMeal": "Mystery",
            "strCategory": null
        }))
        .unwrap();

        let recipe = meal_to_recipe(meal);

        assert_eq!(recipe.category, "");
        assert_eq!(recipe.area, "");
        assert_eq!(recipe.thumbnail_url, "");
        assert!(recipe.tags.is_empty());
        assert!(recipe.ingredients.is_empty());
    }

    #[tokio::test]
    async fn test_hydrate_keeps_filter_order_and_skips_missing() {
        let mut catalog = MockRecipeCatalog::new();
        catalog
            .expect_find_by_id()
            .with(eq("3"))
            .times(1)
            .returning(|id| Ok(Some(recipe(id))));
        catalog
            .expect_find_by_id()
            .with(eq("1"))
            .times(1)
            .returning(|_| Ok(None));
        catalog
            .expect_find_by_id()
            .with(eq("2"))
            .times(1)
            .returning(|id| Ok(Some(recipe(id))));

        let ids_in = vec!["3".to_string(), "1".to_string(), "2".to_string()];
        let recipes = hydrate(&catalog, ids_in).await.unwrap();

        assert_eq!(ids(&recipes), vec!["3", "2"]);
    }

    #[tokio::test]
    async fn test_hydrate_fails_when_one_lookup_fails() {
        let mut catalog = MockRecipeCatalog::new();
        catalog.expect_find_by_id().returning(|id| {
            if id == "2" {
                Err(Error::ApiError("TheMealDB returned 500".to_string()))
            } else {
                Ok(Some(recipe(id)))
            }
        });

        let result = hydrate(&catalog, vec!["1".to_string(), "2".to_string()]).await;
        assert!(matches!(result, Err(Error::ApiError(_))));
    }

    #[tokio::test]
    async fn test_sample_makes_count_independent_picks() {
        let calls = AtomicUsize::new(0);

        let recipes = sample(5, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            // Every third pick finds nothing
            async move { Ok((n % 3 != 2).then(|| recipe("52772"))) }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        // Duplicates are allowed
        assert_eq!(ids(&recipes), vec!["52772"; 4]);
    }

    #[tokio::test]
    async fn test_sample_of_zero_makes_no_requests() {
        let calls = AtomicUsize::new(0);
        let recipes = sample(0, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(Some(recipe("1"))) }
        })
        .await
        .unwrap();

        assert!(recipes.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sample_fails_when_one_pick_fails() {
        let calls = AtomicUsize::new(0);
        let result = sample(3, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 1 {
                    Err(Error::ApiError("timed out".to_string()))
                } else {
                    Ok(Some(recipe("1")))
                }
            }
        })
        .await;

        assert!(matches!(result, Err(Error::ApiError(_))));
    }
}
