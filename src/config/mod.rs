use std::env;
use std::str::FromStr;

/// Where uploaded bytes are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Files under `storage_root` on the local disk
    Local,
    /// An S3-compatible bucket (MinIO in development)
    S3,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "fs" | "filesystem" => Ok(StorageBackend::Local),
            "s3" | "minio" => Ok(StorageBackend::S3),
            other => Err(format!("Unknown storage backend: {}", other)),
        }
    }
}

/// S3 connection settings, read from the MINIO_* variables.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Database connection string (default: "sqlite://drive.db?mode=rwc")
    pub database_url: String,

    /// Blob backend (default: local)
    pub storage_backend: StorageBackend,

    /// Root directory for the local backend (default: "./uploads")
    pub storage_root: String,

    /// Required when `storage_backend` is S3
    pub s3: Option<S3Settings>,

    /// JWT signing secret
    pub jwt_secret: String,

    /// Maximum size of one uploaded file in bytes (default: 100 MB)
    pub max_file_size: usize,

    /// Maximum number of files in one batch upload (default: 5)
    pub max_batch_files: usize,

    /// Seconds between reconciliation sweeps (default: 300)
    pub reconcile_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://drive.db?mode=rwc".to_string(),
            storage_backend: StorageBackend::Local,
            storage_root: "./uploads".to_string(),
            s3: None,
            jwt_secret: "secret".to_string(),
            max_file_size: 100 * 1024 * 1024, // 100 MB
            max_batch_files: 5,
            reconcile_interval_secs: 300,
        }
    }
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        let storage_backend = env::var("STORAGE_BACKEND")
            .ok()
            .and_then(|v| match v.parse() {
                Ok(backend) => Some(backend),
                Err(e) => {
                    tracing::warn!("{}; falling back to local storage", e);
                    None
                }
            })
            .unwrap_or(default.storage_backend);

        let s3 = match (
            env::var("MINIO_ENDPOINT"),
            env::var("MINIO_ACCESS_KEY"),
            env::var("MINIO_SECRET_KEY"),
        ) {
            (Ok(endpoint), Ok(access_key), Ok(secret_key)) => Some(S3Settings {
                endpoint,
                access_key,
                secret_key,
                bucket: env::var("MINIO_BUCKET").unwrap_or_else(|_| "uploads".to_string()),
            }),
            _ => None,
        };

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("⚠️  JWT_SECRET not set, using an insecure development secret");
            default.jwt_secret.clone()
        });

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),
            storage_backend,
            storage_root: env::var("STORAGE_ROOT").unwrap_or(default.storage_root),
            s3,
            jwt_secret,
            max_file_size: parsed("MAX_FILE_SIZE", default.max_file_size),
            max_batch_files: parsed("MAX_BATCH_FILES", default.max_batch_files),
            reconcile_interval_secs: parsed(
                "RECONCILE_INTERVAL_SECS",
                default.reconcile_interval_secs,
            ),
        }
    }

    /// Create config for tests and local runs (in-memory database, small limits)
    pub fn development() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "development-secret".to_string(),
            max_file_size: 10 * 1024 * 1024,
            ..Self::default()
        }
    }
}
