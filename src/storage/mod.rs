//! Object storage for generated slide decks
//!
//! Writes and reads objects in an S3-compatible bucket, and commits validated
//! slide documents under keys derived from their titles.

pub mod client;
pub mod commit;
pub mod mock;

pub use client::S3StorageClient;
pub use commit::{commit, object_key};
pub use mock::MockStorageClient;

use crate::models::{ResourceType, StorageDescriptor};
use crate::Result;
use async_trait::async_trait;

/// One object to write. The body is moved into the backend's upload stream.
#[derive(Debug)]
pub struct PutObject {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub resource_type: ResourceType,
}

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Write an object, replacing any existing object with the same key.
    ///
    /// Returns only once the backend has confirmed the write.
    async fn put_object(&self, object: PutObject) -> Result<StorageDescriptor>;

    async fn get_object(&self, key: &str) -> Result<Vec<u8>>;
}

/// Public URL of `key` under `base_url`, percent-encoding each path segment.
pub fn public_url(base_url: &str, key: &str) -> String {
    let path = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::public_url;

    #[test]
    fn test_public_url_encodes_each_segment() {
        assert_eq!(
            public_url("https://cdn.test/", "AI Slide/Biology 1.json"),
            "https://cdn.test/AI%20Slide/Biology%201.json"
        );
    }

    #[test]
    fn test_public_url_escapes_reserved_characters() {
        assert_eq!(
            public_url("https://cdn.test", "decks/C# 100% done?.json"),
            "https://cdn.test/decks/C%23%20100%25%20done%3F.json"
        );
    }
}
