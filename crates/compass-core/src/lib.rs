// Core logic: catalog access, browsing, and the favorites store
pub mod browse;
pub mod cached_catalog;
pub mod catalog;
pub mod config;
pub mod error;
pub mod favorites;
pub mod models;
pub mod persistence;
pub mod providers;

pub use browse::{BrowseOutcome, BrowseQuery, FilterOptions};
pub use cached_catalog::CachedCatalog;
pub use catalog::RecipeCatalog;
pub use config::Config;
pub use error::{Error, StoreWarning};
pub use favorites::{FavoritesSet, FavoritesStore, ToggleOutcome};
pub use models::{Ingredient, Recipe, RecipeSummary};
pub use persistence::{FavoritesBackend, MemoryBackend, SharedCache, SlotBackend};

/// Result type alias for the core crate
pub type Result<T> = std::result::Result<T, Error>;
