// API client for the TheMealDB recipe catalog
pub mod mealdb;
pub mod retry;

// Re-export common types
pub use mealdb::{
    MealDbClient, MealDbError, MealDbIngredient, MealDbMeal, MealDbMealRef, DEFAULT_BASE_URL,
};
pub use retry::{RetryConfig, Retryable};
