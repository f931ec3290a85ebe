use calid_provision::config::AppConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    #[command(flatten)]
    pub device: AppConfig,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show live sensor readings until interrupted
    Monitor,
    /// Print the device log
    Logs,
    /// Print device and chip information
    System,
    /// Read or change the stored configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Look for Wi-Fi networks or I2C devices
    #[command(subcommand)]
    Scan(ScanCommand),
    /// Upload a firmware image; the device restarts into it
    Firmware { image: PathBuf },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the configuration as key=value pairs
    Show,
    /// Change settings, e.g. `ssid=home sensorType1=22`, and save
    Set {
        #[arg(required = true, value_name = "KEY=VALUE")]
        edits: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ScanCommand {
    Wifi,
    I2c,
}
