//! Relay switch command handler.

use shelly_cloud_core::{Bridge, Turn};

use crate::cli::{GlobalOpts, SwitchArgs, SwitchState};
use crate::error::CliError;

use super::require_device;

impl From<SwitchState> for Turn {
    fn from(state: SwitchState) -> Self {
        match state {
            SwitchState::On => Turn::On,
            SwitchState::Off => Turn::Off,
        }
    }
}

pub async fn handle(bridge: &Bridge, args: &SwitchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    require_device(bridge, &args.device)?;

    let turn = Turn::from(args.state);
    if !bridge.set_channel(&args.device, args.channel, turn).await {
        return Err(CliError::CommandRejected {
            device: args.device.clone(),
            channel: args.channel,
            turn: turn.to_string(),
        });
    }

    if !global.quiet {
        eprintln!("✓ {} channel {} switched {turn}", args.device, args.channel);
    }
    Ok(())
}
