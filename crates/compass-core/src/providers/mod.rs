// Catalog implementations backed by remote services
pub mod mealdb;

pub use mealdb::MealDbProvider;
