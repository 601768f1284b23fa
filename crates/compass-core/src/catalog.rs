use crate::{models::Recipe, Result};

/// Read-only recipe catalog.
///
/// The TheMealDB provider implements this, and so does the caching
/// decorator wrapped around it. Views talk to `dyn RecipeCatalog` only,
/// which keeps them testable against a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecipeCatalog: Send + Sync {
    /// Recipes whose name matches `query`; no matches is an empty list
    async fn find_by_text(&self, query: &str) -> Result<Vec<Recipe>>;

    /// `Ok(None)` when the catalog has no recipe with this id
    async fn find_by_id(&self, id: &str) -> Result<Option<Recipe>>;

    async fn find_by_category(&self, category: &str) -> Result<Vec<Recipe>>;

    async fn find_by_area(&self, area: &str) -> Result<Vec<Recipe>>;

    async fn list_categories(&self) -> Result<Vec<String>>;

    async fn list_areas(&self) -> Result<Vec<String>>;

    /// `count` independent random picks; duplicates are possible
    async fn random_sample(&self, count: usize) -> Result<Vec<Recipe>>;
}
