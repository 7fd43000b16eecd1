#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use drive_backend::AppState;
use drive_backend::config::AppConfig;
use drive_backend::infrastructure::database::setup_database;
use drive_backend::models::AuthenticatedIdentity;
use drive_backend::services::accounts::Registration;
use drive_backend::services::blob_store::{BlobError, BlobResult, BlobStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

/// In-memory blob store. Failures can be injected per operation for keys
/// containing a given fragment.
#[derive(Default)]
pub struct MockBlobStore {
    blobs: Mutex<HashMap<String, Bytes>>,
    fail_put: Mutex<Option<String>>,
    fail_get: Mutex<Option<String>>,
    fail_delete: Mutex<Option<String>>,
}

fn injected(rule: &Mutex<Option<String>>, key: &str) -> bool {
    rule.lock()
        .unwrap()
        .as_deref()
        .is_some_and(|fragment| key.contains(fragment))
}

impl MockBlobStore {
    pub fn fail_put_on(&self, fragment: &str) {
        *self.fail_put.lock().unwrap() = Some(fragment.to_string());
    }

    pub fn fail_get_on(&self, fragment: &str) {
        *self.fail_get.lock().unwrap() = Some(fragment.to_string());
    }

    pub fn fail_delete_on(&self, fragment: &str) {
        *self.fail_delete.lock().unwrap() = Some(fragment.to_string());
    }

    pub fn heal(&self) {
        *self.fail_put.lock().unwrap() = None;
        *self.fail_get.lock().unwrap() = None;
        *self.fail_delete.lock().unwrap() = None;
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.blobs.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn put(&self, key: &str, data: Bytes) -> BlobResult<String> {
        if injected(&self.fail_put, key) {
            return Err(BlobError::S3(format!("injected put failure for {}", key)));
        }
        self.blobs.lock().unwrap().insert(key.to_string(), data);
        Ok(key.to_string())
    }

    async fn get(&self, key: &str) -> BlobResult<Bytes> {
        if injected(&self.fail_get, key) {
            return Err(BlobError::S3(format!("injected get failure for {}", key)));
        }
        self.blobs
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        if injected(&self.fail_delete, key) {
            return Err(BlobError::S3(format!("injected delete failure for {}", key)));
        }
        self.blobs
            .lock()
            .unwrap()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| BlobError::NotFound(key.to_string()))
    }

    /// Reads share the `get` failure rule.
    async fn exists(&self, key: &str) -> BlobResult<bool> {
        if injected(&self.fail_get, key) {
            return Err(BlobError::S3(format!("injected exists failure for {}", key)));
        }
        Ok(self.blobs.lock().unwrap().contains_key(key))
    }
}

pub struct TestContext {
    pub state: AppState,
    pub blobs: Arc<MockBlobStore>,
}

pub async fn setup() -> TestContext {
    setup_with(AppConfig::development()).await
}

pub async fn setup_with(config: AppConfig) -> TestContext {
    let blobs = Arc::new(MockBlobStore::default());
    let state = state_with_blobs(config, blobs.clone()).await;
    TestContext { state, blobs }
}

/// State backed by an arbitrary blob store, for tests that wrap the mock.
pub async fn state_with_blobs(config: AppConfig, blobs: Arc<dyn BlobStore>) -> AppState {
    let db = setup_database(&config).await.unwrap();
    AppState::new(db, blobs, config)
}

pub async fn create_user(state: &AppState, email: &str) -> AuthenticatedIdentity {
    let user = state
        .accounts
        .register(Registration {
            email: email.to_string(),
            display_name: "Test User".to_string(),
            password: "password123".to_string(),
        })
        .await
        .unwrap();
    AuthenticatedIdentity::new(user.id, user.email)
}

impl TestContext {
    pub async fn create_user(&self, email: &str) -> AuthenticatedIdentity {
        create_user(&self.state, email).await
    }
}
