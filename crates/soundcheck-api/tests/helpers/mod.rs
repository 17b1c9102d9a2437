use axum_test::TestServer;
use soundcheck_api::setup::routes::setup_routes;
use soundcheck_api::AppState;
use soundcheck_core::models::CatalogItem;
use soundcheck_core::Config;
use soundcheck_db::CatalogStore;
use soundcheck_processing::fixtures::InMemoryCatalog;
use soundcheck_processing::{AudioProcessor, ExtractorSettings, MetadataExtractor, RetryPolicy};
use soundcheck_storage::{LocalStorage, Storage};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const BUCKET: &str = "products";
pub const WEBHOOK_SECRET: &str = "test-webhook-secret-0123456789";

/// Test application backed by an in-memory catalog and a temp-dir blob store
pub struct TestApp {
    pub server: TestServer,
    pub catalog: Arc<InMemoryCatalog>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    /// Get the HTTP test client
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Write an object into the local blob store
    pub fn put_object(&self, key: &str, data: &[u8]) {
        let path = self._temp_dir.path().join(BUCKET).join(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create object directory");
        }
        std::fs::write(&path, data).expect("Failed to write object");
    }
}

fn test_config(storage_path: &Path, webhook_secret: Option<&str>) -> Config {
    let mut vars: HashMap<&str, String> = HashMap::from([
        ("DATABASE_URL", "postgresql://localhost/soundcheck_test".to_string()),
        ("STORAGE_BACKEND", "local".to_string()),
        (
            "LOCAL_STORAGE_PATH",
            storage_path.to_string_lossy().into_owned(),
        ),
        ("RETRY_MAX_ATTEMPTS", "1".to_string()),
    ]);
    if let Some(secret) = webhook_secret {
        vars.insert("WEBHOOK_SECRET", secret.to_string());
    }

    let config = Config::from_source(|key| vars.get(key).cloned()).expect("Invalid test config");
    config.validate().expect("Test config failed validation");
    config
}

/// Setup a test application seeded with `items`
pub async fn setup_test_app(items: Vec<CatalogItem>) -> TestApp {
    setup_test_app_with_secret(items, None).await
}

/// Setup a test application that requires `secret` as a bearer token on the webhook
pub async fn setup_test_app_with_secret(
    items: Vec<CatalogItem>,
    secret: Option<&str>,
) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = test_config(temp_dir.path(), secret);

    let catalog = Arc::new(InMemoryCatalog::new(items));
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(temp_dir.path())
            .await
            .expect("Failed to create local storage"),
    );

    let settings = ExtractorSettings {
        retry: RetryPolicy {
            max_attempts: 1,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        },
        ..ExtractorSettings::from_config(&config)
    };

    let catalog_store: Arc<dyn CatalogStore> = catalog.clone();
    let extractor = Arc::new(MetadataExtractor::new(
        catalog_store.clone(),
        storage,
        Arc::new(AudioProcessor::new()),
        settings,
    ));

    let state = Arc::new(AppState::new(
        extractor,
        catalog_store,
        config.webhook_secret().map(String::from),
    ));

    let app = setup_routes(&config, state).expect("Failed to build routes");
    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp {
        server,
        catalog,
        _temp_dir: temp_dir,
    }
}

/// Storage webhook payload for an inserted object
pub fn insert_event(name: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "INSERT",
        "table": "objects",
        "schema": "storage",
        "record": {
            "bucket_id": BUCKET,
            "name": name,
        },
        "old_record": null,
    })
}
