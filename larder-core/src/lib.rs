pub mod catalog;
pub mod composer;
pub mod dietary;
pub mod engine;
pub mod error;
pub mod materializer;
pub mod normalizer;
pub mod pantry_text;
pub mod store;

pub use catalog::{
    CatalogData, CatalogError, CatalogHandle, CatalogSnapshot, CuisineProfile, Difficulty,
    IngredientCatalogEntry, Nutrition, Role, TechniqueTemplate,
};
pub use composer::{compose, TechniquePlan, TemplateRejection};
pub use dietary::{DietaryConstraintSet, DietaryPreference};
pub use engine::{RecipeSynthesizer, SynthesisRequest, DEFAULT_SERVINGS};
pub use error::SynthesisError;
pub use materializer::{materialize, IngredientLine, SynthesizedRecipe};
pub use normalizer::{normalize, PantryItem};
pub use store::{
    Collection, DiskStore, DocumentStore, FieldFilter, MemoryStore, RetryingStore, StoreError,
};
