use super::{public_url, PutObject, StorageService};
use crate::models::StorageDescriptor;
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{config::Region, types::ObjectCannedAcl, Client as S3Client};
use chrono::Utc;

pub struct S3StorageClient {
    client: S3Client,
    bucket: String,
    base_url: String,
}

impl S3StorageClient {
    pub async fn new(
        access_key_id: String,
        secret_access_key: String,
        endpoint: String,
        region: String,
        bucket: String,
        base_url: String,
    ) -> Result<Self> {
        let credentials = aws_sdk_s3::config::Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "lesson-slides-static",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region))
            .endpoint_url(endpoint)
            .load()
            .await;

        let client = S3Client::new(&config);

        Ok(Self {
            client,
            bucket,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn put_object(&self, object: PutObject) -> Result<StorageDescriptor> {
        let PutObject {
            key,
            body,
            content_type,
            resource_type,
        } = object;
        let size = body.len() as u64;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_length(size as i64)
            .content_type(&content_type)
            .metadata("resource-type", resource_type.as_str())
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| {
                Error::StorageWriteFailed(format!(
                    "Failed to upload {}: {}",
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(StorageDescriptor {
            url: public_url(&self.base_url, &key),
            key,
            size,
            content_type,
            created_at: Utc::now(),
        })
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                Error::StorageReadFailed(format!(
                    "Failed to read {}: {}",
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| Error::StorageReadFailed(format!("Failed to read body: {}", e)))?;

        Ok(bytes.to_vec())
    }
}
