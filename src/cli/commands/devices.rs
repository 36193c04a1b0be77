//! Device history command handler

use crate::config::Config;
use crate::db;
use crate::models::Device;
use crate::services::{RegistryService, StoreRegistryService};

pub async fn cmd_devices(config: &Config, username: &str) -> anyhow::Result<()> {
    let store = db::connect(&config.database).await?;
    let registry = StoreRegistryService::new(store);

    let devices = registry.list_devices(username).await?;

    if devices.is_empty() {
        println!("{} has no recorded devices.", username);
        return Ok(());
    }

    println!("Devices for {} ({} total)", username, devices.len());
    println!("{:-<90}", "");
    println!(
        "{:<38} {:<10} {:<25} {:>6}",
        "DEVICE ID", "TYPE", "LAST LOGIN", "LOGINS"
    );

    for device in &devices {
        println!("{}", format_device_row(device));
    }

    Ok(())
}

fn format_device_row(device: &Device) -> String {
    format!(
        "{:<38} {:<10} {:<25} {:>6}",
        device.device_id,
        device.device_type.as_deref().unwrap_or("unknown"),
        device.last_login.format("%Y-%m-%d %H:%M:%S UTC"),
        device.login_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_format_device_row() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        let mut device = Device::first_seen("d1", at, None);
        device.record_login(at, None);

        let row = format_device_row(&device);
        assert!(row.starts_with("d1 "));
        assert!(row.contains("unknown"));
        assert!(row.contains("2026-03-01 12:30:00 UTC"));
        assert!(row.trim_end().ends_with('2'));
    }
}
