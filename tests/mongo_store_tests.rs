//! MongoDB backend against a live server.
//!
//! Ignored by default. Run with a server available:
//! `MONGO_URI=mongodb://localhost:27017 cargo test --test mongo_store_tests -- --ignored`
//! Each test works in its own throwaway database and drops it afterwards.

use chrono::{Duration, Utc};
use device_tracker::config::DatabaseConfig;
use device_tracker::db::{MongoStore, UserStore};
use device_tracker::models::Device;
use device_tracker::services::{LoginAttempt, RegistryService, StoreRegistryService};
use std::sync::Arc;

struct TestDatabase {
    config: DatabaseConfig,
    store: Arc<MongoStore>,
}

impl TestDatabase {
    async fn create() -> Self {
        let url = std::env::var("MONGO_URI").expect("MONGO_URI must point at a MongoDB server");
        let config = DatabaseConfig {
            url,
            name: format!("device_tracker_test_{}", uuid::Uuid::new_v4().simple()),
            ..DatabaseConfig::default()
        };

        let store = MongoStore::connect(&config).await.unwrap();
        store.ping().await.unwrap();
        store.prepare().await.unwrap();

        Self {
            config,
            store: Arc::new(store),
        }
    }

    async fn drop_database(self) {
        let client = mongodb::Client::with_uri_str(&self.config.url).await.unwrap();
        client.database(&self.config.name).drop().await.unwrap();
    }
}

#[tokio::test]
#[ignore = "needs a MongoDB server in MONGO_URI"]
async fn test_login_history_round_trips_through_mongo() {
    let db = TestDatabase::create().await;
    let service = StoreRegistryService::new(db.store.clone());

    let d1 = service
        .record_login(LoginAttempt::new("alice").with_device_type("desktop"))
        .await
        .unwrap()
        .device_id;
    service
        .record_login(LoginAttempt::new("alice").with_device_id(d1.clone()))
        .await
        .unwrap();
    let d2 = service
        .record_login(LoginAttempt::new("alice"))
        .await
        .unwrap()
        .device_id;

    let devices = service.list_devices("alice").await.unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].device_id, d1);
    assert_eq!(devices[0].login_count, 2);
    assert_eq!(devices[0].device_type.as_deref(), Some("desktop"));
    assert_eq!(devices[1].device_id, d2);
    assert_eq!(devices[1].login_count, 1);

    assert!(service.list_devices("bob").await.is_err());

    db.drop_database().await;
}

#[tokio::test]
#[ignore = "needs a MongoDB server in MONGO_URI"]
async fn test_concurrent_first_logins_create_one_user_and_one_device() {
    let db = TestDatabase::create().await;
    let service = Arc::new(StoreRegistryService::new(db.store.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .record_login(LoginAttempt::new("carol").with_device_id("shared"))
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let user = db.store.find_user("carol").await.unwrap().unwrap();
    assert_eq!(user.devices.len(), 1);
    assert_eq!(user.devices[0].login_count, 8);

    db.drop_database().await;
}

#[tokio::test]
#[ignore = "needs a MongoDB server in MONGO_URI"]
async fn test_device_writes_are_conditional_and_monotonic() {
    let db = TestDatabase::create().await;
    let store = db.store.clone();

    store.insert_user("dave").await.unwrap();
    assert!(matches!(
        store.insert_user("dave").await,
        Err(device_tracker::db::StoreError::Duplicate(_))
    ));

    let user = store.find_user("dave").await.unwrap().unwrap();
    let now = Utc::now();
    let device = Device::first_seen("d1", now, Some("mobile".to_string()));

    assert!(store.push_device(&user.id, &device).await.unwrap());
    assert!(!store.push_device(&user.id, &device).await.unwrap());

    // An older timestamp bumps the count but keeps last_login.
    assert!(
        store
            .touch_device(&user.id, "d1", now - Duration::hours(1), None)
            .await
            .unwrap()
    );
    assert!(
        !store
            .touch_device(&user.id, "missing", now, None)
            .await
            .unwrap()
    );

    let user = store.find_user("dave").await.unwrap().unwrap();
    assert_eq!(user.devices.len(), 1);
    assert_eq!(user.devices[0].login_count, 2);
    assert_eq!(
        user.devices[0].last_login.timestamp_millis(),
        now.timestamp_millis()
    );
    assert_eq!(user.devices[0].device_type.as_deref(), Some("mobile"));

    db.drop_database().await;
}
