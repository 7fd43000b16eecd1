use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;

use super::{BlobError, BlobResult, BlobStore};

fn s3_error(e: impl std::error::Error) -> BlobError {
    BlobError::S3(DisplayErrorContext(&e).to_string())
}

pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, data: Bytes) -> BlobResult<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("S3 put_object failed: {}/{}", self.bucket, key);
                s3_error(e)
            })?;
        Ok(key.to_string())
    }

    async fn get(&self, key: &str) -> BlobResult<Bytes> {
        let res = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match res {
            Ok(output) => {
                let data = output.body.collect().await.map_err(s3_error)?;
                Ok(data.into_bytes())
            }
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    Err(BlobError::NotFound(key.to_string()))
                } else {
                    Err(s3_error(service_error))
                }
            }
        }
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        // DeleteObject succeeds on missing keys, so check first to report NotFound.
        if !self.exists(key).await? {
            return Err(BlobError::NotFound(key.to_string()));
        }

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(s3_error)?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> BlobResult<bool> {
        let res = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match res {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(s3_error(service_error))
                }
            }
        }
    }
}
