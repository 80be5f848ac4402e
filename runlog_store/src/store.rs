use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::model::Attributes;

/// A key-value table addressed by a single string partition key.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Name of the partition key attribute.
    fn key_name(&self) -> &str;

    async fn get(&self, key: &str) -> Result<Option<Attributes>, StoreError>;

    /// Writes `item` only when no item with the same key exists.
    /// Returns `false` when one was already present.
    async fn put_if_absent(&self, item: Attributes) -> Result<bool, StoreError>;

    /// Replaces whatever is stored under the item's key.
    async fn put(&self, item: Attributes) -> Result<(), StoreError>;

    /// Sets one attribute of the item under `key`, leaving the rest intact.
    /// Never creates an item: a missing one is `StoreError::NotFound`.
    async fn set_attribute(&self, key: &str, name: &str, value: Value) -> Result<(), StoreError>;

    async fn scan(&self) -> Result<Vec<Attributes>, StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// A bucket of opaque objects.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    fn bucket(&self) -> &str;

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StoreError>;
}

/// Extracts the partition key value of `item`.
pub fn item_key<'a>(store: &dyn ItemStore, item: &'a Attributes) -> Result<&'a str, StoreError> {
    item.get(store.key_name())
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::MissingKey(store.key_name().to_string()))
}
