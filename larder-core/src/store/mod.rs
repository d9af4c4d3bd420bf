//! Document store abstraction used at the edges of the engine.
//!
//! The synthesis pipeline never touches a store. Servers use one to persist
//! users, recipes, and the editable copy of the catalog, and to rebuild a
//! [`CatalogSnapshot`] from it.

mod disk;
mod memory;
mod retry;

pub use disk::DiskStore;
pub use memory::MemoryStore;
pub use retry::{RetryingStore, DEFAULT_STORE_TIMEOUT};

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::catalog::{CatalogData, CatalogError, CatalogSnapshot, CuisineProfile, IngredientCatalogEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Users,
    Ingredients,
    Recipes,
    Cuisines,
}

impl Collection {
    pub const ALL: &'static [Collection] = &[
        Collection::Users,
        Collection::Ingredients,
        Collection::Recipes,
        Collection::Cuisines,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Ingredients => "ingredients",
            Collection::Recipes => "recipes",
            Collection::Cuisines => "cuisines",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid document id: {0:?}")]
    InvalidId(String),

    #[error("Malformed document {collection}/{id}: {message}")]
    Malformed {
        collection: Collection,
        id: String,
        message: String,
    },

    #[error("Store I/O error: {0}")]
    Io(String),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether a single retry might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Io(_) | StoreError::Timeout(_) | StoreError::Unavailable(_)
        )
    }
}

/// A stored document and its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

/// Matches documents whose top-level `field` equals `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, body: &Value) -> bool {
        body.get(&self.field) == Some(&self.value)
    }
}

/// Key-value document storage, grouped into collections.
///
/// A missing document is `Ok(None)` from `get` and `Ok(false)` from `delete`,
/// never an error. `list` returns documents ordered by id.
#[async_trait]
pub trait DocumentStore: Send + Sync + fmt::Debug {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError>;

    async fn list(
        &self,
        collection: Collection,
        filter: Option<&FieldFilter>,
    ) -> Result<Vec<Document>, StoreError>;

    async fn put(&self, collection: Collection, id: &str, body: Value) -> Result<(), StoreError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError>;
}

/// Ids double as file names, so keep them to a safe alphabet.
pub fn validate_id(id: &str) -> Result<(), StoreError> {
    let ok = !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

fn decode<T: DeserializeOwned>(collection: Collection, id: &str, body: Value) -> Result<T, StoreError> {
    serde_json::from_value(body).map_err(|e| StoreError::Malformed {
        collection,
        id: id.to_string(),
        message: e.to_string(),
    })
}

/// Fetch and deserialize one document.
pub async fn get_as<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
    id: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(collection, id).await? {
        Some(body) => decode(collection, id, body).map(Some),
        None => Ok(None),
    }
}

/// List and deserialize a collection, keeping ids.
pub async fn list_as<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
    filter: Option<&FieldFilter>,
) -> Result<Vec<(String, T)>, StoreError> {
    store
        .list(collection, filter)
        .await?
        .into_iter()
        .map(|doc| {
            let value = decode(collection, &doc.id, doc.body)?;
            Ok((doc.id, value))
        })
        .collect()
}

/// Serialize and store one document.
pub async fn put_as<T: Serialize + Sync>(
    store: &dyn DocumentStore,
    collection: Collection,
    id: &str,
    value: &T,
) -> Result<(), StoreError> {
    let body = serde_json::to_value(value).map_err(|e| StoreError::Malformed {
        collection,
        id: id.to_string(),
        message: e.to_string(),
    })?;
    store.put(collection, id, body).await
}

#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Read the `ingredients` and `cuisines` collections as catalog data.
pub async fn read_catalog(store: &dyn DocumentStore) -> Result<CatalogData, StoreError> {
    let ingredients = list_as::<IngredientCatalogEntry>(store, Collection::Ingredients, None)
        .await?
        .into_iter()
        .map(|(_, entry)| entry)
        .collect();
    let cuisines = list_as::<CuisineProfile>(store, Collection::Cuisines, None)
        .await?
        .into_iter()
        .map(|(_, cuisine)| cuisine)
        .collect();
    Ok(CatalogData {
        ingredients,
        cuisines,
    })
}

/// Build a validated snapshot from the store's catalog collections.
///
/// Empty collections fail validation like any other bad catalog.
pub async fn load_catalog(store: &dyn DocumentStore) -> Result<CatalogSnapshot, CatalogLoadError> {
    let data = read_catalog(store).await?;
    let snapshot = CatalogSnapshot::new(data)?;
    tracing::info!(
        ingredients = snapshot.ingredients().len(),
        cuisines = snapshot.cuisines().len(),
        "loaded catalog from store"
    );
    Ok(snapshot)
}

/// Write `data` into the store when both catalog collections are empty.
///
/// Returns the number of documents written.
pub async fn seed_catalog(store: &dyn DocumentStore, data: &CatalogData) -> Result<usize, StoreError> {
    let has_ingredients = !store.list(Collection::Ingredients, None).await?.is_empty();
    let has_cuisines = !store.list(Collection::Cuisines, None).await?.is_empty();
    if has_ingredients || has_cuisines {
        tracing::debug!("catalog collections not empty, skipping seed");
        return Ok(0);
    }

    let mut written = 0;
    for entry in &data.ingredients {
        put_as(store, Collection::Ingredients, &entry.id, entry).await?;
        written += 1;
    }
    for cuisine in &data.cuisines {
        put_as(store, Collection::Cuisines, &cuisine.id, cuisine).await?;
        written += 1;
    }
    tracing::info!(documents = written, "seeded catalog into store");
    Ok(written)
}
