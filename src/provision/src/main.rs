mod args;

use anyhow::{Context, Result, bail};
use args::{Args, Command, ConfigCommand, ScanCommand};
use calid_provision::{
    device_client::{DeviceGateway, HttpDeviceGateway},
    poller::TelemetryPoller,
    report, workflow,
};
use calid_ui_core::{I2cScan, UploadState, WifiScan};
use clap::Parser as _;
use env_logger::{Builder, Env, Target};
use log::{error, info};
use std::{io::Write, process::ExitCode, sync::Arc, time::Duration};

#[tokio::main]
async fn main() -> ExitCode {
    initialize();

    if let Err(e) = run(Args::parse()).await {
        error!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

fn initialize() {
    log_panics::init();

    let mut builder = if cfg!(debug_assertions) {
        Builder::from_env(Env::default().default_filter_or("debug"))
    } else {
        Builder::from_env(Env::default().default_filter_or("info"))
    };

    builder.format(|f, record| writeln!(f, "[{}] {}", record.level(), record.args()));

    // stdout carries command output only
    builder.target(Target::Stderr).init();

    info!("calid-provision {}", env!("CARGO_PKG_VERSION"));
}

async fn run(args: Args) -> Result<()> {
    let poll_interval = args.device.poll_interval();
    let gateway = HttpDeviceGateway::new(args.device).context("failed to create device client")?;

    match args.command {
        Command::Monitor => monitor(gateway, poll_interval).await,
        Command::Logs => {
            print!("{}", gateway.fetch_logs().await);
            Ok(())
        }
        Command::System => {
            let Some(info) = gateway.fetch_system_info().await else {
                bail!("failed to fetch system info")
            };
            print!("{}", report::render_system_info(&info));
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => {
            let session = workflow::load_session(&gateway).await?;
            print!("{}", report::render_config(&session.config));
            Ok(())
        }
        Command::Config(ConfigCommand::Set { edits }) => {
            let edits = edits
                .iter()
                .map(|edit| workflow::parse_edit(edit))
                .collect::<Result<Vec<_>>>()?;
            workflow::provision(&gateway, &edits).await?;
            println!("Configuration saved! Device is restarting...");
            Ok(())
        }
        Command::Scan(ScanCommand::Wifi) => {
            let mut scan = WifiScan::default();
            if !workflow::scan_wifi(&gateway, &mut scan).await {
                bail!("failed to scan for Wi-Fi networks")
            }
            print!("{}", report::render_networks(&scan.networks));
            Ok(())
        }
        Command::Scan(ScanCommand::I2c) => {
            let mut scan = I2cScan::default();
            if !workflow::scan_i2c(&gateway, &mut scan).await {
                bail!("failed to scan the I2C bus")
            }
            print!("{}", report::render_i2c_devices(&scan.devices));
            Ok(())
        }
        Command::Firmware { image } => {
            match workflow::upload_firmware(&gateway, image).await {
                UploadState::Completed => {
                    println!("Firmware uploaded! Device is restarting...");
                    Ok(())
                }
                UploadState::Failed(reason) => bail!("{reason}"),
                state => bail!("unexpected upload state {state:?}"),
            }
        }
    }
}

async fn monitor(gateway: HttpDeviceGateway, poll_interval: Duration) -> Result<()> {
    if let Some(info) = gateway.fetch_system_info().await {
        print!("{}", report::render_system_info(&info));
    }

    let (poller, mut updates) = TelemetryPoller::start(Arc::new(gateway), poll_interval);
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                changed.context("telemetry poller stopped")?;
                let state = updates.borrow_and_update().clone();
                match &state.snapshot {
                    Some(snapshot) if state.failed_polls == 0 => {
                        println!();
                        print!("{}", report::render_snapshot(snapshot));
                    }
                    Some(_) => info!(
                        "poll failed, showing last readings ({} in a row)",
                        state.failed_polls
                    ),
                    None => info!("waiting for first readings"),
                }
            }
            _ = &mut interrupted => {
                info!("interrupted");
                break;
            }
        }
    }

    poller.stop();
    Ok(())
}
