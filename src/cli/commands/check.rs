//! Store connectivity check command handler

use anyhow::Context;

use crate::config::Config;
use crate::db;

pub async fn cmd_check(config: &Config) -> anyhow::Result<()> {
    println!(
        "Checking user store ({}/{}) ...",
        config.database.name, config.database.collection
    );

    let store = db::connect(&config.database).await?;
    store
        .ping()
        .await
        .context("User store is not reachable")?;

    println!("✓ Store is reachable");
    Ok(())
}
