use serde::{Deserialize, Serialize};
use std::fmt;

use super::Device;

/// Store-assigned identity of a user document.
///
/// Opaque to everything above the store: the MongoDB backend puts an
/// `ObjectId` hex string here, the in-process backend a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub devices: Vec<Device>,
}

impl User {
    #[must_use]
    pub fn device(&self, device_id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.device_id == device_id)
    }

    #[must_use]
    pub fn has_device(&self, device_id: &str) -> bool {
        self.device(device_id).is_some()
    }
}
