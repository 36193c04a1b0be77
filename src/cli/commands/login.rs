//! Record-login command handler

use crate::config::Config;
use crate::db;
use crate::services::{LoginAttempt, RegistryService, StoreRegistryService};

pub async fn cmd_login(
    config: &Config,
    username: &str,
    device_id: Option<String>,
    device_type: Option<String>,
) -> anyhow::Result<()> {
    let store = db::connect(&config.database).await?;
    let registry = StoreRegistryService::new(store);

    let receipt = registry
        .record_login(LoginAttempt {
            username: Some(username.to_string()),
            device_id,
            device_type,
        })
        .await?;

    println!("✓ Login recorded for {}", username);
    println!("  Device ID: {}", receipt.device_id);
    if receipt.new_user {
        println!("  New user created");
    }
    if receipt.new_device {
        println!("  First login from this device");
    }

    Ok(())
}
