// Catalog decorator that keeps recipe details in the local cache
use async_trait::async_trait;
use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    catalog::RecipeCatalog,
    models::Recipe,
    persistence::{lock, SharedCache},
    Result,
};

const RECIPE_NAMESPACE: &str = "recipe";
const LIST_NAMESPACE: &str = "list";

/// Catalog that checks the cache before hitting the network.
///
/// Lookups by id and the category/area enumerations are served from cache
/// while fresh. Searches and filters always go to the inner catalog, but
/// every recipe they return is written through so a later detail view is
/// instant. Cache trouble is never fatal; it just means a network call.
pub struct CachedCatalog {
    inner: Box<dyn RecipeCatalog>,
    cache: Option<SharedCache>,
    ttl: Duration,
}

impl CachedCatalog {
    /// Pass-through with no cache behind it
    pub fn new(inner: Box<dyn RecipeCatalog>) -> Self {
        Self {
            inner,
            cache: None,
            ttl: Duration::zero(),
        }
    }

    pub fn with_cache(inner: Box<dyn RecipeCatalog>, cache: SharedCache, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Some(cache),
            ttl,
        }
    }

    fn cached<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Option<T> {
        let cache = self.cache.as_ref()?;
        match lock(cache).get::<T>(namespace, key, self.ttl) {
            Ok(Some(value)) => {
                debug!("Cache hit for {}:{}", namespace, key);
                Some(value)
            }
            Ok(None) => {
                debug!("Cache miss for {}:{}", namespace, key);
                None
            }
            Err(e) => {
                debug!("Cache error for {}:{}: {}", namespace, key, e);
                None
            }
        }
    }

    fn store<T: Serialize>(&self, namespace: &str, key: &str, value: &T) {
        if let Some(cache) = &self.cache {
            if let Err(e) = lock(cache).set(namespace, key, value) {
                debug!("Failed to cache {}:{}: {}", namespace, key, e);
            }
        }
    }

    fn store_recipes(&self, recipes: &[Recipe]) {
        if self.cache.is_none() || recipes.is_empty() {
            return;
        }
        for recipe in recipes {
            self.store(RECIPE_NAMESPACE, &recipe.id, recipe);
        }
        debug!("Cached {} recipes", recipes.len());
    }

    /// Remove stale entries; returns the number removed
    pub fn purge_stale(&self) -> usize {
        let Some(cache) = &self.cache else {
            return 0;
        };
        match lock(cache).purge_older_than(self.ttl) {
            Ok(removed) => {
                if removed > 0 {
                    info!("Purged {} stale cache entries", removed);
                }
                removed
            }
            Err(e) => {
                debug!("Cache purge failed: {}", e);
                0
            }
        }
    }
}

#[async_trait]
impl RecipeCatalog for CachedCatalog {
    async fn find_by_text(&self, query: &str) -> Result<Vec<Recipe>> {
        let recipes = self.inner.find_by_text(query).await?;
        self.store_recipes(&recipes);
        Ok(recipes)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Recipe>> {
        if let Some(recipe) = self.cached::<Recipe>(RECIPE_NAMESPACE, id) {
            return Ok(Some(recipe));
        }

        let recipe = self.inner.find_by_id(id).await?;
        if let Some(recipe) = &recipe {
            self.store(RECIPE_NAMESPACE, &recipe.id, recipe);
        }
        Ok(recipe)
    }

    async fn find_by_category(&self, category: &str) -> Result<Vec<Recipe>> {
        let recipes = self.inner.find_by_category(category).await?;
        self.store_recipes(&recipes);
        Ok(recipes)
    }

    async fn find_by_area(&self, area: &str) -> Result<Vec<Recipe>> {
        let recipes = self.inner.find_by_area(area).await?;
        self.store_recipes(&recipes);
        Ok(recipes)
    }

    async fn list_categories(&self) -> Result<Vec<String>> {
        if let Some(categories) = self.cached::<Vec<String>>(LIST_NAMESPACE, "categories") {
            return Ok(categories);
        }
        let categories = self.inner.list_categories().await?;
        self.store(LIST_NAMESPACE, "categories", &categories);
        Ok(categories)
    }

    async fn list_areas(&self) -> Result<Vec<String>> {
        if let Some(areas) = self.cached::<Vec<String>>(LIST_NAMESPACE, "areas") {
            return Ok(areas);
        }
        let areas = self.inner.list_areas().await?;
        self.store(LIST_NAMESPACE, "areas", &areas);
        Ok(areas)
    }

    // Random picks are never served from cache
    async fn random_sample(&self, count: usize) -> Result<Vec<Recipe>> {
        let recipes = self.inner.random_sample(count).await?;
        self.store_recipes(&recipes);
        Ok(recipes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MockRecipeCatalog;
    use compass_cache::CacheManager;
    use std::sync::{Arc, Mutex};

    fn recipe(id: &str) -> Recipe {
        Recipe {
            id: id.to_string(),
            name: format!("Recipe {}", id),
            thumbnail_url: String::new(),
            category: "Dessert".to_string(),
            area: "British".to_string(),
            instructions: String::new(),
            tags: Vec::new(),
            youtube_url: None,
            source_url: None,
            ingredients: Vec::new(),
        }
    }

    fn shared_cache() -> SharedCache {
        Arc::new(Mutex::new(CacheManager::in_memory().unwrap()))
    }

    #[tokio::test]
    async fn test_find_by_id_hits_network_once() {
        let mut inner = MockRecipeCatalog::new();
        inner
            .expect_find_by_id()
            .times(1)
            .returning(|id| Ok(Some(recipe(id))));

        let catalog = CachedCatalog::with_cache(Box::new(inner), shared_cache(), Duration::hours(1));

        let first = catalog.find_by_id("52893").await.unwrap();
        let second = catalog.find_by_id("52893").await.unwrap();

        assert_eq!(first, Some(recipe("52893")));
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_search_results_are_written_through() {
        let mut inner = MockRecipeCatalog::new();
        inner
            .expect_find_by_text()
            .times(1)
            .returning(|_| Ok(vec![recipe("1"), recipe("2")]));
        inner.expect_find_by_id().never();

        let catalog = CachedCatalog::with_cache(Box::new(inner), shared_cache(), Duration::hours(1));

        assert_eq!(catalog.find_by_text("tart").await.unwrap().len(), 2);
        assert_eq!(catalog.find_by_id("2").await.unwrap(), Some(recipe("2")));
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let mut inner = MockRecipeCatalog::new();
        inner.expect_find_by_id().times(2).returning(|_| Ok(None));

        let catalog = CachedCatalog::with_cache(Box::new(inner), shared_cache(), Duration::hours(1));

        assert_eq!(catalog.find_by_id("99999").await.unwrap(), None);
        assert_eq!(catalog.find_by_id("99999").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lists_are_cached() {
        let mut inner = MockRecipeCatalog::new();
        inner
            .expect_list_categories()
            .times(1)
            .returning(|| Ok(vec!["Beef".to_string(), "Dessert".to_string()]));

        let catalog = CachedCatalog::with_cache(Box::new(inner), shared_cache(), Duration::hours(1));

        catalog.list_categories().await.unwrap();
        let again = catalog.list_categories().await.unwrap();
        assert_eq!(again, vec!["Beef", "Dessert"]);
    }

    #[tokio::test]
    async fn test_without_cache_everything_passes_through() {
        let mut inner = MockRecipeCatalog::new();
        inner
            .expect_find_by_id()
            .times(2)
            .returning(|id| Ok(Some(recipe(id))));

        let catalog = CachedCatalog::new(Box::new(inner));

        catalog.find_by_id("1").await.unwrap();
        catalog.find_by_id("1").await.unwrap();
        assert_eq!(catalog.purge_stale(), 0);
    }
}
