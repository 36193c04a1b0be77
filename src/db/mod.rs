//! User document persistence.
//!
//! One collection, one document per user, devices nested inside it. The
//! [`UserStore`] trait exposes exactly the single-document primitives the
//! registry needs so that every mutation is one atomic write on the backend.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::models::{Device, User, UserId};

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("User '{0}' already exists")]
    Duplicate(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Round-trips to the backend without touching any document.
    async fn ping(&self) -> Result<(), StoreError>;

    /// One-time setup run at startup (indexes). Backends without any
    /// setup keep the default.
    async fn prepare(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Creates `{username, devices: []}`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] if the username is already taken.
    async fn insert_user(&self, username: &str) -> Result<(), StoreError>;

    /// Appends `device` unless the user already holds a device with the same id.
    /// Returns `false` when nothing was appended.
    async fn push_device(&self, user_id: &UserId, device: &Device) -> Result<bool, StoreError>;

    /// Refreshes `last_login` (never backwards) and adds one to `login_count`
    /// of the matching device. Returns `false` when no device matched.
    async fn touch_device(
        &self,
        user_id: &UserId,
        device_id: &str,
        at: DateTime<Utc>,
        device_type: Option<&str>,
    ) -> Result<bool, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl StoreBackend {
    pub fn from_url(url: &str) -> Result<Self> {
        if url.starts_with("mongodb://") || url.starts_with("mongodb+srv://") {
            Ok(Self::Mongo)
        } else if url.starts_with("memory://") {
            Ok(Self::Memory)
        } else {
            anyhow::bail!("Unsupported database URL '{url}': expected mongodb://, mongodb+srv:// or memory://")
        }
    }
}

/// Builds the store named by `config.url`.
///
/// Creating a MongoDB client does not contact the server, so this succeeds
/// while the database is down; callers run [`UserStore::ping`] separately.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn UserStore>> {
    match StoreBackend::from_url(&config.url)? {
        StoreBackend::Memory => {
            info!("Using in-process user store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Mongo => {
            let store = MongoStore::connect(config)
                .await
                .context("Failed to configure MongoDB client")?;
            info!(
                database = %config.name,
                collection = %config.collection,
                "MongoDB client configured"
            );
            Ok(Arc::new(store))
        }
    }
}
