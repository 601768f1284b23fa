// SQLite-backed local storage
// Holds the named durable slots (favorites) and the recipe response cache

pub mod cache;

pub use cache::{CacheError, CacheManager, SlotPolicy};
