// Device list and status endpoints
//
// Both are session-scoped and served from the account's `user_api_url`.

use std::collections::HashMap;

use tracing::debug;

use crate::auth::Session;
use crate::client::{CloudClient, missing_data};
use crate::error::Error;
use crate::models::{AllStatusData, DeviceListData, RawDevice, RawDeviceStatus};

impl CloudClient {
    /// List every device registered to the account.
    ///
    /// `POST {user_api_url}/interface/device/list`
    pub async fn list_devices(&self, session: &Session) -> Result<Vec<RawDevice>, Error> {
        let url = Self::session_url(session, "interface/device/list")?;
        let no_fields: [(&str, &str); 0] = [];

        let data: DeviceListData = self
            .post_form(url, &no_fields, Some(session.token()))
            .await?
            .ok_or_else(|| missing_data("interface/device/list"))?;

        let devices: Vec<RawDevice> = data
            .devices
            .into_iter()
            .map(|(id, mut device)| {
                if device.id.is_empty() {
                    device.id = id;
                }
                device
            })
            .collect();

        debug!(count = devices.len(), "listed devices");
        Ok(devices)
    }

    /// Fetch the latest status of every device, keyed by device id.
    ///
    /// `GET {user_api_url}/device/all_status?_=<unix_time>`; the timestamp
    /// defeats intermediate caches.
    pub async fn all_status(
        &self,
        session: &Session,
    ) -> Result<HashMap<String, RawDeviceStatus>, Error> {
        let url = Self::session_url(session, "device/all_status")?;
        let query = [("_", chrono::Utc::now().timestamp().to_string())];

        let data: AllStatusData = self
            .get(url, &query, session.token())
            .await?
            .ok_or_else(|| missing_data("device/all_status"))?;

        debug!(count = data.devices_status.len(), "fetched device status");
        Ok(data.devices_status.into_iter().collect())
    }
}
