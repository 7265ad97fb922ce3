use super::{public_url, PutObject, StorageService};
use crate::models::{ResourceType, StorageDescriptor};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
    pub resource_type: ResourceType,
}

/// In-memory [`StorageService`]. Clones share the same objects and counters.
#[derive(Clone)]
pub struct MockStorageClient {
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
    base_url: String,
    put_count: Arc<Mutex<usize>>,
    get_count: Arc<Mutex<usize>>,
    write_failure: Option<String>,
    delay: Option<Duration>,
}

impl MockStorageClient {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            base_url: "https://mock-storage.example.com".to_string(),
            put_count: Arc::new(Mutex::new(0)),
            get_count: Arc::new(Mutex::new(0)),
            write_failure: None,
            delay: None,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_object(self, key: String, body: Vec<u8>) -> Self {
        self.objects.lock().unwrap().insert(
            key,
            StoredObject {
                body,
                content_type: "application/json".to_string(),
                resource_type: ResourceType::Raw,
            },
        );
        self
    }

    /// Make every write fail with `message`, as a backend rejection would.
    pub fn with_write_failure(mut self, message: impl Into<String>) -> Self {
        self.write_failure = Some(message.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_put_count(&self) -> usize {
        *self.put_count.lock().unwrap()
    }

    pub fn get_get_count(&self) -> usize {
        *self.get_count.lock().unwrap()
    }

    pub fn get_objects(&self) -> HashMap<String, StoredObject> {
        self.objects.lock().unwrap().clone()
    }
}

impl Default for MockStorageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockStorageClient {
    async fn put_object(&self, object: PutObject) -> Result<StorageDescriptor> {
        *self.put_count.lock().unwrap() += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = &self.write_failure {
            return Err(Error::StorageWriteFailed(message.clone()));
        }

        let size = object.body.len() as u64;
        let descriptor = StorageDescriptor {
            url: public_url(&self.base_url, &object.key),
            key: object.key.clone(),
            size,
            content_type: object.content_type.clone(),
            created_at: Utc::now(),
        };

        self.objects.lock().unwrap().insert(
            object.key,
            StoredObject {
                body: object.body,
                content_type: object.content_type,
                resource_type: object.resource_type,
            },
        );

        Ok(descriptor)
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        *self.get_count.lock().unwrap() += 1;

        let objects = self.objects.lock().unwrap();
        match objects.get(key) {
            Some(object) => Ok(object.body.clone()),
            None => Err(Error::StorageReadFailed(format!("Object not found: {}", key))),
        }
    }
}
