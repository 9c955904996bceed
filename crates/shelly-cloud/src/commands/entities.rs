//! Entity list command handler.

use serde::Serialize;
use tabled::Tabled;

use shelly_cloud_core::{Bridge, Entity, ShellyEntity, build_entity};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::Output;

#[derive(Debug, Serialize)]
pub(super) struct EntitySummary {
    pub entity_id: String,
    pub name: String,
    pub state: String,
    pub unit: Option<&'static str>,
    pub available: bool,
}

impl From<&ShellyEntity> for EntitySummary {
    fn from(e: &ShellyEntity) -> Self {
        Self {
            entity_id: e.entity_id().to_owned(),
            name: e.name().to_owned(),
            state: e.display_state(),
            unit: e.unit_of_measurement(),
            available: e.is_available(),
        }
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Entity ID")]
    entity_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Available")]
    available: String,
}

impl EntityRow {
    fn new(e: &EntitySummary, out: &Output) -> Self {
        Self {
            entity_id: e.entity_id.clone(),
            name: e.name.clone(),
            state: e.state.clone(),
            unit: e.unit.unwrap_or_default().to_owned(),
            available: out.flag(e.available, "yes", "no"),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(bridge: &Bridge, global: &GlobalOpts) -> Result<(), CliError> {
    let entities: Vec<EntitySummary> = bridge
        .store()
        .entity_candidates()
        .iter()
        .filter_map(|candidate| build_entity(bridge, candidate))
        .map(|e| EntitySummary::from(&e))
        .collect();

    let out = Output::new(global);
    out.list(
        &entities,
        |e| EntityRow::new(e, &out),
        |e| format!("{}\t{}", e.entity_id, e.state),
    )
}
