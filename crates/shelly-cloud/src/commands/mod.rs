//! Command dispatch: bridges CLI args -> core Bridge -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod entities;
pub mod status;
pub mod switch;
pub mod watch;

use std::time::Duration;

use shelly_cloud_core::{Bridge, BridgeConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a cloud-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: BridgeConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Command::Watch(args) = cmd {
        return watch::handle(config, &args, global).await;
    }

    let bridge = snapshot_bridge(config).await?;
    let result = match cmd {
        Command::Devices => devices::handle(&bridge, global),
        Command::Status(args) => status::handle(&bridge, &args, global),
        Command::Entities => entities::handle(&bridge, global),
        Command::Switch(args) => switch::handle(&bridge, &args, global).await,
        // Handled before dispatch
        Command::Watch(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    };
    bridge.disconnect().await;
    result
}

/// Log in and take one device and status snapshot, without periodic tasks.
///
/// Unlike `Bridge::connect`, a failed poll is an error here.
async fn snapshot_bridge(mut config: BridgeConfig) -> Result<Bridge, CliError> {
    config.status_interval = Duration::ZERO;
    config.discovery_interval = Duration::ZERO;

    let bridge = Bridge::new(config)?;
    bridge.login().await?;
    bridge.refresh_devices().await?;
    bridge.refresh_status().await?;
    Ok(bridge)
}

/// Look a device up in the snapshot, or fail with a not-found error.
pub fn require_device(bridge: &Bridge, id: &str) -> Result<(), CliError> {
    if bridge.device(id).is_some() {
        Ok(())
    } else {
        Err(CliError::NotFound {
            resource_type: "device".into(),
            identifier: id.into(),
            list_command: "devices".into(),
        })
    }
}
