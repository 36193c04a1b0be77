//! Domain service for the user-device registry.
//!
//! Records which devices a user logged in from and serves that history back.

use serde::Serialize;
use thiserror::Error;

use crate::db::StoreError;
use crate::models::Device;

/// Errors specific to registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

/// Input to [`RegistryService::record_login`].
///
/// Every field is optional at this level: a missing username is a
/// validation failure, a missing or empty device id gets generated.
#[derive(Debug, Clone, Default)]
pub struct LoginAttempt {
    pub username: Option<String>,
    pub device_id: Option<String>,
    pub device_type: Option<String>,
}

impl LoginAttempt {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    #[must_use]
    pub fn with_device_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }
}

/// What a recorded login did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginReceipt {
    /// The id used for this login: the caller's, or a freshly generated one.
    pub device_id: String,
    pub new_user: bool,
    pub new_device: bool,
}

/// Returns the username if it is present and non-empty.
///
/// # Errors
///
/// Returns [`RegistryError::Validation`] for a missing or empty username.
pub fn require_username(username: Option<&str>) -> Result<&str, RegistryError> {
    match username {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(RegistryError::Validation("Username is required".to_string())),
    }
}

/// Domain service trait for the registry.
#[async_trait::async_trait]
pub trait RegistryService: Send + Sync {
    /// Records one login of `attempt.username` from `attempt.device_id`,
    /// creating the user and/or device on first sight.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Validation`] if the username is missing and
    /// [`RegistryError::StoreUnavailable`] if the store cannot be reached.
    async fn record_login(&self, attempt: LoginAttempt) -> Result<LoginReceipt, RegistryError>;

    /// Returns the user's devices in storage order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for an unknown username.
    async fn list_devices(&self, username: &str) -> Result<Vec<Device>, RegistryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_username() {
        assert_eq!(require_username(Some("alice")).unwrap(), "alice");
        assert_eq!(require_username(Some(" alice ")).unwrap(), " alice ");
        assert!(matches!(
            require_username(None),
            Err(RegistryError::Validation(_))
        ));
        assert!(require_username(Some("")).is_err());
        assert_eq!(require_username(Some("   ")).unwrap(), "   ");
    }

    #[test]
    fn test_store_errors_surface_as_unavailable() {
        let err: RegistryError = StoreError::Unavailable("connection refused".to_string()).into();
        assert!(matches!(err, RegistryError::StoreUnavailable(msg) if msg.contains("connection refused")));
    }
}
