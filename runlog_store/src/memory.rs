//! In-process stores for tests and local runs.
//!
//! Both stores can be told to fail writes, which is how the handlers' partial
//! failure paths get exercised without a real backend. Tables can also miss
//! reads, standing in for a concurrent writer that lands between a lookup and
//! a conditional put.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::model::Attributes;
use crate::store::{item_key, ItemStore, ObjectStore};

#[derive(Debug)]
pub struct MemoryTable {
    key_name: String,
    items: Mutex<BTreeMap<String, Attributes>>,
    fail_writes: AtomicBool,
    missed_gets: AtomicUsize,
}

impl MemoryTable {
    pub fn new(key_name: &str) -> Self {
        Self {
            key_name: key_name.to_string(),
            items: Mutex::new(BTreeMap::new()),
            fail_writes: AtomicBool::new(false),
            missed_gets: AtomicUsize::new(0),
        }
    }

    /// While set, every mutating call returns a storage fault.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The next `count` calls to `get` report no item, whatever is stored.
    pub fn miss_next_gets(&self, count: usize) {
        self.missed_gets.store(count, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of the item under `key`, bypassing fault injection.
    pub fn item(&self, key: &str) -> Option<Attributes> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Attributes>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_writable(&self, operation: &'static str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::storage(operation, "injected write failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ItemStore for MemoryTable {
    fn key_name(&self) -> &str {
        &self.key_name
    }

    async fn get(&self, key: &str) -> Result<Option<Attributes>, StoreError> {
        let missed = self.missed_gets
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if missed {
            return Ok(None);
        }
        Ok(self.item(key))
    }

    async fn put_if_absent(&self, item: Attributes) -> Result<bool, StoreError> {
        self.check_writable("put_item")?;
        let key = item_key(self, &item)?.to_string();
        let mut items = self.lock();
        if items.contains_key(&key) {
            return Ok(false);
        }
        items.insert(key, item);
        Ok(true)
    }

    async fn put(&self, item: Attributes) -> Result<(), StoreError> {
        self.check_writable("put_item")?;
        let key = item_key(self, &item)?.to_string();
        self.lock().insert(key, item);
        Ok(())
    }

    async fn set_attribute(&self, key: &str, name: &str, value: Value) -> Result<(), StoreError> {
        self.check_writable("update_item")?;
        let mut items = self.lock();
        let item = items.get_mut(key)
            .ok_or_else(|| StoreError::NotFound(format!("item {}", key)))?;
        item.insert(name.to_string(), value);
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<Attributes>, StoreError> {
        Ok(self.lock().values().cloned().collect())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check_writable("delete_item")?;
        self.lock().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug)]
pub struct MemoryBucket {
    name: String,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    fail_writes: AtomicBool,
}

impl MemoryBucket {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            objects: Mutex::new(BTreeMap::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn insert(&self, key: &str, body: impl Into<Vec<u8>>, content_type: &str) {
        self.lock().insert(
            key.to_string(),
            StoredObject {
                body: body.into(),
                content_type: content_type.to_string(),
            },
        );
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ObjectStore for MemoryBucket {
    fn bucket(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.object(key)
            .map(|o| o.body)
            .ok_or_else(|| StoreError::NotFound(format!("s3://{}/{}", self.name, key)))
    }

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::storage("put_object", "injected write failure"));
        }
        self.insert(key, body, content_type);
        Ok(())
    }
}
