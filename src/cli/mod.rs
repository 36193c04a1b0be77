//! CLI module - Command-line interface for the device tracker
//!
//! This module provides a structured CLI using clap for argument parsing.

pub mod commands;

use clap::{Parser, Subcommand};

/// Device Tracker - records which devices each user logs in from
#[derive(Parser)]
#[command(name = "device-tracker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP API server (default)
    Serve,

    /// Record a login directly against the configured store
    Login {
        /// Username to record the login for
        username: String,
        /// Existing device id; a new one is generated when omitted
        #[arg(long)]
        device_id: Option<String>,
        /// Device type, e.g. "mobile" or "desktop"
        #[arg(long)]
        device_type: Option<String>,
    },

    /// Show the devices a user has logged in from
    #[command(alias = "ls")]
    Devices {
        /// Username to look up
        username: String,
    },

    /// Check connectivity to the configured store
    Check,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["device-tracker"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_login_arguments() {
        let cli = Cli::try_parse_from([
            "device-tracker",
            "login",
            "alice",
            "--device-id",
            "d1",
            "--device-type",
            "mobile",
        ])
        .unwrap();

        assert_eq!(
            cli.command,
            Some(Commands::Login {
                username: "alice".to_string(),
                device_id: Some("d1".to_string()),
                device_type: Some("mobile".to_string()),
            })
        );
    }

    #[test]
    fn test_devices_alias() {
        let cli = Cli::try_parse_from(["device-tracker", "ls", "bob"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Devices {
                username: "bob".to_string()
            })
        );
    }
}
