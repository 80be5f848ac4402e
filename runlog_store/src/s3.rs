use async_trait::async_trait;
use aws_sdk_s3 as s3;
use aws_sdk_s3::primitives::ByteStream;
use tracing::debug;

use crate::error::StoreError;
use crate::store::ObjectStore;

#[derive(Debug, Clone)]
pub struct S3Bucket {
    client: s3::Client,
    bucket: String,
}

impl S3Bucket {
    pub fn new(client: s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Bucket {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let output = self.client.get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map_or(false, |se| se.is_no_such_key()) {
                    StoreError::NotFound(format!("s3://{}/{}", self.bucket, key))
                } else {
                    StoreError::storage("get_object", e)
                }
            })?;
        let body = output.body
            .collect()
            .await
            .map_err(|e| StoreError::storage("get_object", e))?;
        let bytes = body.into_bytes().to_vec();
        debug!(bucket = %self.bucket, key, size = bytes.len(), "read object");
        Ok(bytes)
    }

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        self.client.put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StoreError::storage("put_object", e))?;
        Ok(())
    }
}
