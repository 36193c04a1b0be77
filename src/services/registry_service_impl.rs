//! [`UserStore`]-backed implementation of the `RegistryService` trait.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::{StoreError, UserStore};
use crate::models::{Device, User};
use crate::services::registry_service::{
    LoginAttempt, LoginReceipt, RegistryError, RegistryService, require_username,
};

pub struct StoreRegistryService {
    store: Arc<dyn UserStore>,
}

impl StoreRegistryService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Fetches the user, creating it first if needed. The boolean is true
    /// when this call created the document.
    async fn find_or_create_user(&self, username: &str) -> Result<(User, bool), RegistryError> {
        if let Some(user) = self.store.find_user(username).await? {
            return Ok((user, false));
        }

        let created = match self.store.insert_user(username).await {
            Ok(()) => {
                info!(username, "Created user");
                true
            }
            Err(StoreError::Duplicate(_)) => {
                debug!(username, "User created by a concurrent login");
                false
            }
            Err(err) => return Err(err.into()),
        };

        // Re-read so the store-assigned id is what the device write targets.
        let user = self.store.find_user(username).await?.ok_or_else(|| {
            RegistryError::StoreUnavailable(format!("user {username} missing right after insert"))
        })?;

        Ok((user, created))
    }

    /// Appends or refreshes `device_id` on `user`. Returns true if appended.
    async fn upsert_device(
        &self,
        user: &User,
        device_id: &str,
        device_type: Option<String>,
    ) -> Result<bool, RegistryError> {
        let now = Utc::now();

        if !user.has_device(device_id) {
            let device = Device::first_seen(device_id, now, device_type.clone());
            if self.store.push_device(&user.id, &device).await? {
                return Ok(true);
            }
            debug!(
                username = %user.username,
                device_id,
                "Device appended by a concurrent login, updating instead"
            );
        }

        if self
            .store
            .touch_device(&user.id, device_id, now, device_type.as_deref())
            .await?
        {
            return Ok(false);
        }

        warn!(username = %user.username, device_id, "Device write matched nothing");
        Err(RegistryError::StoreUnavailable(format!(
            "device {device_id} of user {} could not be written",
            user.username
        )))
    }
}

#[async_trait]
impl RegistryService for StoreRegistryService {
    async fn record_login(&self, attempt: LoginAttempt) -> Result<LoginReceipt, RegistryError> {
        let username = require_username(attempt.username.as_deref())?;

        let device_id = attempt
            .device_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let device_type = attempt.device_type.filter(|kind| !kind.is_empty());

        let (user, new_user) = self.find_or_create_user(username).await?;
        let new_device = self.upsert_device(&user, &device_id, device_type).await?;

        let outcome = if new_device { "new_device" } else { "returning_device" };
        metrics::counter!("device_logins_total", "outcome" => outcome).increment(1);
        info!(username, device_id = %device_id, outcome, "Login recorded");

        Ok(LoginReceipt {
            device_id,
            new_user,
            new_device,
        })
    }

    async fn list_devices(&self, username: &str) -> Result<Vec<Device>, RegistryError> {
        let user = self
            .store
            .find_user(username)
            .await?
            .ok_or_else(|| RegistryError::NotFound("User not found".to_string()))?;

        Ok(user.devices)
    }
}
