//! Foreground bridge: polls on the configured timers, builds entities as
//! they are discovered, and prints every state change until Ctrl-C.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use shelly_cloud_core::{Bridge, BridgeConfig, BridgeState, Entity, ShellyEntity, build_entity};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output::Output;

use super::entities::EntitySummary;

/// How often local entities re-read the bridge snapshots.
const RENDER_TICK: Duration = Duration::from_secs(1);

pub async fn handle(
    mut config: BridgeConfig,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(every) = args.status_interval {
        config.status_interval = every;
    }
    if let Some(every) = args.discovery_interval {
        config.discovery_interval = every;
    }

    let bridge = Bridge::new(config)?;
    let mut discoveries = bridge.subscribe_discoveries();
    let mut state_rx = bridge.connection_state();

    bridge.connect().await?;

    let out = Output::new(global);
    let mut entities: BTreeMap<String, (ShellyEntity, String)> = BTreeMap::new();

    let mut ticker = tokio::time::interval(RENDER_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted, shutting down");
                break;
            }

            received = discoveries.recv() => match received {
                Ok(discovered) => {
                    if let Some(entity) = build_entity(&bridge, &discovered) {
                        emit(&EntitySummary::from(&entity), "new", &out)?;
                        let state = entity.display_state();
                        entities.insert(entity.entity_id().to_owned(), (entity, state));
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "discovery announcements dropped");
                    rebuild_missing(&bridge, &mut entities);
                }
                Err(RecvError::Closed) => break,
            },

            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *state_rx.borrow_and_update();
                debug!(?state, "bridge state changed");
                if state == BridgeState::SessionExpired {
                    match bridge.reauthenticate().await {
                        Ok(()) => info!("session renewed"),
                        Err(e) => warn!(error = %e, "re-authentication failed"),
                    }
                }
            }

            _ = ticker.tick() => {
                for (entity, last_state) in entities.values_mut() {
                    entity.update(&bridge);
                    let state = entity.display_state();
                    if state != *last_state {
                        emit(&EntitySummary::from(&*entity), "changed", &out)?;
                        *last_state = state;
                    }
                }
            }
        }
    }

    bridge.disconnect().await;
    Ok(())
}

/// Build entities for candidates whose announcement was lost to lag.
fn rebuild_missing(bridge: &Bridge, entities: &mut BTreeMap<String, (ShellyEntity, String)>) {
    for candidate in bridge.store().entity_candidates() {
        if let Some(entity) = build_entity(bridge, &candidate) {
            entities
                .entry(entity.entity_id().to_owned())
                .or_insert_with(|| {
                    let state = entity.display_state();
                    (entity, state)
                });
        }
    }
}

fn emit(entity: &EntitySummary, event: &str, out: &Output) -> Result<(), CliError> {
    let line = if out.is_structured() {
        // One JSON object per line keeps the stream parseable.
        serde_json::json!({ "event": event, "entity": entity }).to_string()
    } else {
        let unit = entity.unit.unwrap_or_default();
        let availability = if entity.available { "" } else { " (unavailable)" };
        let label = out.emphasis(&entity.entity_id);
        format!("{event:<7} {label} = {}{unit}{availability}", entity.state)
    };
    out.line(&line)
}
