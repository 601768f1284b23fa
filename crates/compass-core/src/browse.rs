// Home-view search: text query and/or category/area filters over the catalog
use tracing::info;

use crate::{catalog::RecipeCatalog, models::Recipe, Error, Result};

pub const NO_MATCHES_MESSAGE: &str = "No recipes match all your selected criteria.";

pub const DEFAULT_SUGGESTIONS: usize = 3;

/// What the user asked for. Blank text counts as no text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseQuery {
    pub text: Option<String>,
    pub category: Option<String>,
    pub area: Option<String>,
}

impl BrowseQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = non_blank(category.into());
        self
    }

    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = non_blank(area.into());
        self
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = non_blank(text.into());
    }

    /// Select a category, or deselect it when it is already selected
    pub fn toggle_category(&mut self, category: &str) {
        self.category = toggled(self.category.take(), category);
    }

    /// Select an area, or deselect it when it is already selected
    pub fn toggle_area(&mut self, area: &str) {
        self.area = toggled(self.area.take(), area);
    }

    pub fn clear_filters(&mut self) {
        self.category = None;
        self.area = None;
    }

    pub fn has_filters(&self) -> bool {
        self.category.is_some() || self.area.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && !self.has_filters()
    }

    /// Does a fetched recipe satisfy the selected category and area?
    pub fn matches(&self, recipe: &Recipe) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .map_or(true, |c| recipe.category == c);
        let area_ok = self.area.as_deref().map_or(true, |a| recipe.area == a);
        category_ok && area_ok
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn toggled(current: Option<String>, value: &str) -> Option<String> {
    match current {
        Some(existing) if existing == value => None,
        _ => non_blank(value.to_string()),
    }
}

/// Recipes to show plus any notice for the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseOutcome {
    pub recipes: Vec<Recipe>,
    /// How many came back from the catalog before narrowing
    pub fetched: usize,
    pub notice: Option<&'static str>,
}

/// Run a query.
///
/// One catalog call picks the candidates: text search if there is text,
/// else the category filter, else the area filter. The candidates are then
/// narrowed locally by whichever of category and area are selected.
pub async fn browse(catalog: &dyn RecipeCatalog, query: &BrowseQuery) -> Result<BrowseOutcome> {
    let fetched = if let Some(text) = &query.text {
        info!("Searching for: {}", text);
        catalog.find_by_text(text).await?
    } else if let Some(category) = &query.category {
        info!("Browsing category: {}", category);
        catalog.find_by_category(category).await?
    } else if let Some(area) = &query.area {
        info!("Browsing area: {}", area);
        catalog.find_by_area(area).await?
    } else {
        return Err(Error::EmptyQuery);
    };

    let total = fetched.len();
    let recipes: Vec<Recipe> = fetched.into_iter().filter(|r| query.matches(r)).collect();

    let notice = if total > 0 && recipes.is_empty() {
        Some(NO_MATCHES_MESSAGE)
    } else {
        None
    };

    Ok(BrowseOutcome {
        recipes,
        fetched: total,
        notice,
    })
}

/// Valid category and area names for the filter pickers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub areas: Vec<String>,
}

pub async fn filter_options(catalog: &dyn RecipeCatalog) -> Result<FilterOptions> {
    let (categories, areas) = futures::try_join!(catalog.list_categories(), catalog.list_areas())?;
    Ok(FilterOptions { categories, areas })
}

/// A few random recipes for an empty home screen
pub async fn suggestions(catalog: &dyn RecipeCatalog, count: usize) -> Result<Vec<Recipe>> {
    catalog.random_sample(count).await
}
