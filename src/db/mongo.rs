//! MongoDB implementation of [`UserStore`].

use async_trait::async_trait;
use bson::{Document, doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{StoreError, UserStore};
use crate::config::DatabaseConfig;
use crate::models::{Device, User, UserId};

const APP_NAME: &str = "device-tracker";
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    username: String,
    #[serde(default)]
    devices: Vec<DeviceDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DeviceDocument {
    device_id: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    last_login: DateTime<Utc>,
    login_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    device_type: Option<String>,
}

impl TryFrom<DeviceDocument> for Device {
    type Error = StoreError;

    fn try_from(doc: DeviceDocument) -> Result<Self, Self::Error> {
        let login_count = u64::try_from(doc.login_count)
            .ok()
            .filter(|count| *count >= 1)
            .ok_or_else(|| {
                StoreError::InvalidDocument(format!(
                    "device {} has login_count {}",
                    doc.device_id, doc.login_count
                ))
            })?;

        Ok(Self {
            device_id: doc.device_id,
            last_login: doc.last_login,
            login_count,
            device_type: doc.device_type,
        })
    }
}

impl TryFrom<&Device> for DeviceDocument {
    type Error = StoreError;

    fn try_from(device: &Device) -> Result<Self, Self::Error> {
        let login_count = i64::try_from(device.login_count).map_err(|_| {
            StoreError::InvalidDocument(format!(
                "login_count {} does not fit in a BSON int64",
                device.login_count
            ))
        })?;

        Ok(Self {
            device_id: device.device_id.clone(),
            last_login: device.last_login,
            login_count,
            device_type: device.device_type.clone(),
        })
    }
}

impl TryFrom<UserDocument> for User {
    type Error = StoreError;

    fn try_from(doc: UserDocument) -> Result<Self, Self::Error> {
        let id = doc.id.ok_or_else(|| {
            StoreError::InvalidDocument(format!("user {} has no _id", doc.username))
        })?;

        let devices = doc
            .devices
            .into_iter()
            .map(Device::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: UserId::new(id.to_hex()),
            username: doc.username,
            devices,
        })
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

fn object_id(user_id: &UserId) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(user_id.as_str())
        .map_err(|e| StoreError::InvalidDocument(format!("bad user id {user_id}: {e}")))
}

pub struct MongoStore {
    database: Database,
    users: Collection<UserDocument>,
}

impl MongoStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let timeout = Duration::from_secs(config.connect_timeout_seconds);

        let mut options = ClientOptions::parse(&config.url).await?;
        options.app_name = Some(APP_NAME.to_string());
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);

        let client = Client::with_options(options)?;
        let database = client.database(&config.name);
        let users = database.collection::<UserDocument>(&config.collection);

        Ok(Self { database, users })
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn prepare(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users.create_index(index).await?;
        Ok(())
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.users
            .find_one(doc! { "username": username })
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn insert_user(&self, username: &str) -> Result<(), StoreError> {
        let document = UserDocument {
            id: None,
            username: username.to_string(),
            devices: Vec::new(),
        };

        match self.users.insert_one(&document).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => Err(StoreError::Duplicate(username.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    async fn push_device(&self, user_id: &UserId, device: &Device) -> Result<bool, StoreError> {
        let entry: Document = bson::to_document(&DeviceDocument::try_from(device)?)
            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;

        let result = self
            .users
            .update_one(
                doc! {
                    "_id": object_id(user_id)?,
                    "devices.device_id": { "$ne": device.device_id.as_str() },
                },
                doc! { "$push": { "devices": entry } },
            )
            .await?;

        Ok(result.matched_count == 1)
    }

    async fn touch_device(
        &self,
        user_id: &UserId,
        device_id: &str,
        at: DateTime<Utc>,
        device_type: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut update = doc! {
            "$max": { "devices.$.last_login": bson::DateTime::from_chrono(at) },
            "$inc": { "devices.$.login_count": 1_i64 },
        };
        if let Some(kind) = device_type {
            update.insert("$set", doc! { "devices.$.device_type": kind });
        }

        let result = self
            .users
            .update_one(
                doc! { "_id": object_id(user_id)?, "devices.device_id": device_id },
                update,
            )
            .await?;

        Ok(result.matched_count == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_document_decodes_legacy_shape() {
        let id = ObjectId::new();
        let now = bson::DateTime::now();
        let raw = doc! {
            "_id": id,
            "username": "alice",
            "devices": [
                { "device_id": "d1", "last_login": now, "login_count": 3_i32 },
            ],
        };

        let document: UserDocument = bson::from_document(raw).unwrap();
        let user = User::try_from(document).unwrap();

        assert_eq!(user.id.as_str(), id.to_hex());
        assert_eq!(user.devices.len(), 1);
        assert_eq!(user.devices[0].login_count, 3);
        assert_eq!(user.devices[0].last_login, now.to_chrono());
        assert!(user.devices[0].device_type.is_none());
    }

    #[test]
    fn test_zero_login_count_is_rejected() {
        let raw = doc! {
            "_id": ObjectId::new(),
            "username": "alice",
            "devices": [
                { "device_id": "d1", "last_login": bson::DateTime::now(), "login_count": 0_i64 },
            ],
        };

        let document: UserDocument = bson::from_document(raw).unwrap();
        assert!(matches!(
            User::try_from(document),
            Err(StoreError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_missing_devices_field_defaults_to_empty() {
        let raw = doc! { "_id": ObjectId::new(), "username": "bob" };
        let document: UserDocument = bson::from_document(raw).unwrap();
        let user = User::try_from(document).unwrap();
        assert!(user.devices.is_empty());
    }

    #[test]
    fn test_user_id_must_be_object_id() {
        assert!(object_id(&UserId::new("not-an-object-id")).is_err());
        let id = ObjectId::new();
        assert_eq!(object_id(&UserId::new(id.to_hex())).unwrap(), id);
    }
}
