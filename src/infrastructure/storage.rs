use crate::config::{AppConfig, StorageBackend};
use crate::services::blob_store::{BlobStore, LocalBlobStore, S3BlobStore};
use anyhow::anyhow;
use aws_sdk_s3::config::Region;
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &AppConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    match config.storage_backend {
        StorageBackend::Local => {
            info!("💾 Local Storage: {}", config.storage_root);
            let store = LocalBlobStore::new(&config.storage_root).await?;
            Ok(Arc::new(store))
        }
        StorageBackend::S3 => {
            let s3 = config.s3.as_ref().ok_or_else(|| {
                anyhow!("STORAGE_BACKEND=s3 requires MINIO_ENDPOINT, MINIO_ACCESS_KEY and MINIO_SECRET_KEY")
            })?;

            info!("☁️  S3 Storage: {} (Bucket: {})", s3.endpoint, s3.bucket);

            let aws_config = aws_config::from_env()
                .endpoint_url(&s3.endpoint)
                .region(Region::new("us-east-1"))
                .credentials_provider(aws_sdk_s3::config::Credentials::new(
                    s3.access_key.clone(),
                    s3.secret_key.clone(),
                    None,
                    None,
                    "static",
                ))
                .load()
                .await;

            let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
                .force_path_style(true)
                .build();

            let s3_client = aws_sdk_s3::Client::from_conf(s3_config);

            // Ensure bucket exists
            match s3_client.head_bucket().bucket(&s3.bucket).send().await {
                Ok(_) => info!("✅ Bucket '{}' is ready", s3.bucket),
                Err(_) => {
                    info!("🪣 Bucket '{}' not found, creating...", s3.bucket);
                    if let Err(e) = s3_client.create_bucket().bucket(&s3.bucket).send().await {
                        tracing::error!("❌ Failed to create bucket '{}': {}", s3.bucket, e);
                    } else {
                        info!("✅ Bucket '{}' created successfully", s3.bucket);
                    }
                }
            }

            Ok(Arc::new(S3BlobStore::new(s3_client, s3.bucket.clone())))
        }
    }
}
