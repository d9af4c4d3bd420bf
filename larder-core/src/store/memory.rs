use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::{validate_id, Collection, Document, DocumentStore, FieldFilter, StoreError};

/// In-process store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<Collection, BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        validate_id(id)?;
        Ok(self
            .collections
            .get(&collection)
            .and_then(|docs| docs.get(id).cloned()))
    }

    async fn list(
        &self,
        collection: Collection,
        filter: Option<&FieldFilter>,
    ) -> Result<Vec<Document>, StoreError> {
        let Some(docs) = self.collections.get(&collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|(_, body)| filter.is_none_or(|f| f.matches(body)))
            .map(|(id, body)| Document {
                id: id.clone(),
                body: body.clone(),
            })
            .collect())
    }

    async fn put(&self, collection: Collection, id: &str, body: Value) -> Result<(), StoreError> {
        validate_id(id)?;
        self.collections
            .entry(collection)
            .or_default()
            .insert(id.to_string(), body);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        validate_id(id)?;
        Ok(self
            .collections
            .get_mut(&collection)
            .is_some_and(|mut docs| docs.remove(id).is_some()))
    }
}
