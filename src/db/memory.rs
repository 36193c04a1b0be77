//! Process-local [`UserStore`], selected with a `memory://` database URL.
//!
//! Same semantics as the MongoDB backend, but nothing survives a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::models::{Device, User, UserId};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn insert_user(&self, username: &str) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == username) {
            return Err(StoreError::Duplicate(username.to_string()));
        }

        users.push(User {
            id: UserId::new(Uuid::new_v4().to_string()),
            username: username.to_string(),
            devices: Vec::new(),
        });
        Ok(())
    }

    async fn push_device(&self, user_id: &UserId, device: &Device) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        let Some(user) = users.iter_mut().find(|u| &u.id == user_id) else {
            return Ok(false);
        };
        if user.has_device(&device.device_id) {
            return Ok(false);
        }

        user.devices.push(device.clone());
        Ok(true)
    }

    async fn touch_device(
        &self,
        user_id: &UserId,
        device_id: &str,
        at: DateTime<Utc>,
        device_type: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        let device = users
            .iter_mut()
            .find(|u| &u.id == user_id)
            .and_then(|u| u.devices.iter_mut().find(|d| d.device_id == device_id));

        match device {
            Some(device) => {
                device.record_login(at, device_type);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_user_rejects_duplicate_username() {
        let store = MemoryStore::new();
        store.insert_user("alice").await.unwrap();

        let err = store.insert_user("alice").await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(name) if name == "alice"));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_push_device_is_conditional() {
        let store = MemoryStore::new();
        store.insert_user("alice").await.unwrap();
        let user = store.find_user("alice").await.unwrap().unwrap();

        let device = Device::first_seen("d1", Utc::now(), None);
        assert!(store.push_device(&user.id, &device).await.unwrap());
        assert!(!store.push_device(&user.id, &device).await.unwrap());

        let user = store.find_user("alice").await.unwrap().unwrap();
        assert_eq!(user.devices.len(), 1);
    }

    #[tokio::test]
    async fn test_touch_device_only_updates_matching_device() {
        let store = MemoryStore::new();
        store.insert_user("alice").await.unwrap();
        let user = store.find_user("alice").await.unwrap().unwrap();

        let first = Utc::now();
        store
            .push_device(&user.id, &Device::first_seen("d1", first, None))
            .await
            .unwrap();
        store
            .push_device(&user.id, &Device::first_seen("d2", first, None))
            .await
            .unwrap();

        let later = first + chrono::Duration::seconds(5);
        assert!(
            store
                .touch_device(&user.id, "d1", later, Some("mobile"))
                .await
                .unwrap()
        );
        assert!(!store.touch_device(&user.id, "d3", later, None).await.unwrap());

        let user = store.find_user("alice").await.unwrap().unwrap();
        let d1 = user.device("d1").unwrap();
        let d2 = user.device("d2").unwrap();
        assert_eq!(d1.login_count, 2);
        assert_eq!(d1.last_login, later);
        assert_eq!(d1.device_type.as_deref(), Some("mobile"));
        assert_eq!(d2.login_count, 1);
        assert_eq!(d2.last_login, first);
    }

    #[tokio::test]
    async fn test_unknown_user_id_matches_nothing() {
        let store = MemoryStore::new();
        let ghost = UserId::new("ghost");
        let device = Device::first_seen("d1", Utc::now(), None);

        assert!(!store.push_device(&ghost, &device).await.unwrap());
        assert!(!store.touch_device(&ghost, "d1", Utc::now(), None).await.unwrap());
    }
}
