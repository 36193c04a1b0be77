use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: String,
    pub last_login: DateTime<Utc>,
    pub login_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
}

impl Device {
    /// A device seen for the first time: one login, stamped `at`.
    #[must_use]
    pub fn first_seen(
        device_id: impl Into<String>,
        at: DateTime<Utc>,
        device_type: Option<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            last_login: at,
            login_count: 1,
            device_type,
        }
    }

    /// Applies one more login to this device.
    ///
    /// `last_login` never moves backwards, even if `at` is older than the
    /// stored value. A `None` device type keeps whatever was stored.
    pub fn record_login(&mut self, at: DateTime<Utc>, device_type: Option<&str>) {
        self.last_login = self.last_login.max(at);
        self.login_count += 1;
        if let Some(kind) = device_type {
            self.device_type = Some(kind.to_string());
        }
    }
}
