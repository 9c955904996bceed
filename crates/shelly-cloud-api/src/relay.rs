// Relay control endpoint

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::Session;
use crate::client::CloudClient;
use crate::error::Error;

/// Requested relay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Turn {
    On,
    Off,
}

impl Turn {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }

    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl From<bool> for Turn {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CloudClient {
    /// Switch one relay channel on or off.
    ///
    /// `POST {user_api_url}/device/relay/control` with form `{id, channel, turn}`.
    pub async fn set_relay(
        &self,
        session: &Session,
        device_id: &str,
        channel: u32,
        turn: Turn,
    ) -> Result<(), Error> {
        let url = Self::session_url(session, "device/relay/control")?;
        let channel = channel.to_string();
        let form = [
            ("id", device_id),
            ("channel", channel.as_str()),
            ("turn", turn.as_str()),
        ];

        debug!(device_id, %channel, %turn, "relay control");
        let _: Option<serde_json::Value> =
            self.post_form(url, &form, Some(session.token())).await?;
        Ok(())
    }
}
