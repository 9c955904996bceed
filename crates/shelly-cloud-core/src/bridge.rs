// ── Bridge ──
//
// Lifecycle of one Shelly Cloud account: login, periodic status and
// device-list polls, discovery announcements and relay commands.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use shelly_cloud_api::transport::{TlsMode, TransportConfig};
use shelly_cloud_api::{ApiErrors, CloudClient, Session, Turn};

use crate::config::{BridgeConfig, TlsVerification, WritePolicy};
use crate::convert;
use crate::error::CoreError;
use crate::model::{Device, DeviceStatus, DiscoveredEntity, SensorKind};
use crate::store::{DataStore, DeviceMap, DiscoveredEntitySet, StatusMap};

const DISCOVERY_CHANNEL_SIZE: usize = 256;

// ── BridgeState ──────────────────────────────────────────────────

/// Session state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// No session: never logged in, login failed, or disconnected.
    Unauthenticated,
    Authenticating,
    Authenticated,
    /// The cloud answered 401; polls are skipped until a new login.
    SessionExpired,
}

// ── Bridge ───────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<BridgeInner>`. Reads never touch the network;
/// they serve the snapshots kept fresh by the background polls.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    config: BridgeConfig,
    client: CloudClient,
    session: ArcSwapOption<Session>,
    store: Arc<DataStore>,
    discovered: DiscoveredEntitySet,
    state: watch::Sender<BridgeState>,
    discovery_tx: broadcast::Sender<DiscoveredEntity>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    /// Set once the initial polls have run and the tasks were spawned.
    polling: AtomicBool,
}

impl Bridge {
    /// Create a bridge from configuration. Does NOT log in --
    /// call [`connect()`](Self::connect) or use [`start()`](Self::start).
    pub fn new(config: BridgeConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let client = CloudClient::new(config.auth_url.clone(), &transport)?;
        let (state, _) = watch::channel(BridgeState::Unauthenticated);
        let (discovery_tx, _) = broadcast::channel(DISCOVERY_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(BridgeInner {
                config,
                client,
                session: ArcSwapOption::empty(),
                store: Arc::new(DataStore::new()),
                discovered: DiscoveredEntitySet::new(),
                state,
                discovery_tx,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
                polling: AtomicBool::new(false),
            }),
        })
    }

    /// Create a bridge and connect it.
    ///
    /// A failed login is logged and leaves the bridge degraded in
    /// [`BridgeState::Unauthenticated`] with empty snapshots; it is not
    /// an error. Only an unusable configuration fails.
    pub async fn start(config: BridgeConfig) -> Result<Self, CoreError> {
        let bridge = Self::new(config)?;
        if let Err(e) = bridge.connect().await {
            error!(error = %e, "Shelly Cloud bridge started without a session");
        }
        Ok(bridge)
    }

    /// Access the bridge configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Access the underlying DataStore.
    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Log in, run the initial device and status polls, and spawn the
    /// periodic tasks.
    ///
    /// Fails only when login fails. A failed initial poll is logged and
    /// retried by the periodic tasks.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.login().await?;
        self.start_polling().await;
        info!(
            devices = self.inner.store.device_count(),
            "connected to Shelly Cloud"
        );
        Ok(())
    }

    /// Log in again with the configured credentials.
    ///
    /// This is the recovery path out of [`BridgeState::SessionExpired`] and
    /// out of a failed [`start()`](Self::start); the bridge never
    /// re-authenticates on its own. If the periodic tasks were never
    /// spawned, the initial polls run and the tasks start here.
    pub async fn reauthenticate(&self) -> Result<(), CoreError> {
        self.login().await?;
        if !self.inner.polling.load(Ordering::Acquire) {
            self.start_polling().await;
        }
        Ok(())
    }

    async fn start_polling(&self) {
        self.inner.polling.store(true, Ordering::Release);
        if let Err(e) = self.refresh_devices().await {
            warn!(error = %e, "initial device refresh failed");
        }
        if let Err(e) = self.refresh_status().await {
            warn!(error = %e, "initial status refresh failed");
        }
        self.spawn_tasks().await;
    }

    /// Cancel the periodic tasks, wait for them, and drop the session.
    ///
    /// Snapshots stay readable. A disconnected bridge does not restart its
    /// periodic tasks; build a new one instead.
    pub async fn disconnect(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        self.inner.session.store(None);
        self.set_state(BridgeState::Unauthenticated);
        debug!("disconnected");
    }

    /// Log in without polling or spawning tasks. Each `title : message`
    /// pair of a rejected login is logged at error level.
    pub async fn login(&self) -> Result<(), CoreError> {
        self.set_state(BridgeState::Authenticating);
        let credentials = &self.inner.config.credentials;

        match self
            .inner
            .client
            .login(&credentials.username, &credentials.password)
            .await
        {
            Ok(session) => {
                self.inner.session.store(Some(Arc::new(session)));
                self.set_state(BridgeState::Authenticated);
                info!(user = %credentials.username, "logged in to Shelly Cloud");
                Ok(())
            }
            Err(e) => {
                if let Some(errors) = e.api_errors() {
                    log_api_errors(errors);
                }
                self.inner.session.store(None);
                self.set_state(BridgeState::Unauthenticated);
                Err(e.into())
            }
        }
    }

    // ── Polling ──────────────────────────────────────────────────

    /// Replace the status snapshot with a fresh `all_status` poll, then
    /// announce any entities the new statuses reveal.
    ///
    /// Returns the number of statuses stored.
    pub async fn refresh_status(&self) -> Result<usize, CoreError> {
        let session = self.session()?;
        let started = Instant::now();

        let raw = self
            .inner
            .client
            .all_status(&session)
            .await
            .map_err(|e| self.absorb(e))?;

        let statuses: Vec<DeviceStatus> = raw
            .into_iter()
            .map(|(id, status)| convert::device_status(id, &status))
            .collect();
        let dropped = self.inner.store.apply_statuses(statuses);
        if dropped > 0 {
            debug!(dropped, "ignored status for devices not in the device list");
        }

        self.announce_discoveries();
        warn_if_slow("status", started.elapsed(), self.inner.config.status_interval);

        let count = self.inner.store.status_count();
        debug!(statuses = count, "status refresh complete");
        Ok(count)
    }

    /// Replace the device snapshot with a fresh device list and announce
    /// entities of devices seen for the first time.
    ///
    /// Returns only the newly announced entities; a repeat call with an
    /// unchanged account returns an empty list.
    pub async fn refresh_devices(&self) -> Result<Vec<DiscoveredEntity>, CoreError> {
        let session = self.session()?;
        let started = Instant::now();

        let raw = self
            .inner
            .client
            .list_devices(&session)
            .await
            .map_err(|e| self.absorb(e))?;

        let devices: Vec<Device> = raw.into_iter().map(Device::from).collect();
        self.inner.store.apply_devices(devices);

        let announced = self.announce_discoveries();
        warn_if_slow(
            "devices",
            started.elapsed(),
            self.inner.config.discovery_interval,
        );

        debug!(
            devices = self.inner.store.device_count(),
            new_entities = announced.len(),
            "device refresh complete"
        );
        Ok(announced)
    }

    fn announce_discoveries(&self) -> Vec<DiscoveredEntity> {
        let fresh: Vec<DiscoveredEntity> = self
            .inner
            .store
            .entity_candidates()
            .into_iter()
            .filter(|candidate| self.inner.discovered.insert(candidate.key.clone()))
            .collect();

        for entity in &fresh {
            info!(
                device = %entity.key.device_id,
                entity = %entity.key.kind,
                name = %entity.device_name,
                "discovered entity"
            );
            // No receivers is fine: hosts may subscribe later.
            let _ = self.inner.discovery_tx.send(entity.clone());
        }

        fresh
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Switch one relay channel. Returns whether the cloud accepted it.
    ///
    /// With [`WritePolicy::Always`] the cached relay state is set to the
    /// requested value even on failure; with [`WritePolicy::OnSuccess`]
    /// only on success. Without a session nothing is sent and the cache is
    /// left alone. Failures are logged, never raised.
    pub async fn set_channel(&self, device_id: &str, channel: u32, turn: Turn) -> bool {
        let session = match self.session() {
            Ok(session) => session,
            Err(e) => {
                warn!(device = device_id, channel, %turn, error = %e, "relay command skipped");
                return false;
            }
        };

        let accepted = match self
            .inner
            .client
            .set_relay(&session, device_id, channel, turn)
            .await
        {
            Ok(()) => {
                info!(device = device_id, channel, %turn, "relay switched");
                true
            }
            Err(e) => {
                let err = self.absorb(e);
                warn!(device = device_id, channel, %turn, error = %err, "relay command failed");
                false
            }
        };

        if accepted || self.inner.config.write_policy == WritePolicy::Always {
            self.inner
                .store
                .patch_relay(device_id, channel, turn.is_on());
        }

        accepted
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Last known relay state; `false` for unknown devices or channels.
    pub fn switch_status(&self, device_id: &str, channel: u32) -> bool {
        self.inner
            .store
            .status(device_id)
            .is_some_and(|s| s.relay_is_on(channel))
    }

    /// Whether the cloud reports the device connected; `false` if unknown.
    pub fn availability(&self, device_id: &str) -> bool {
        self.inner
            .store
            .status(device_id)
            .is_some_and(|s| s.is_available())
    }

    pub fn sensor_value(&self, device_id: &str, kind: SensorKind) -> Option<f64> {
        self.inner.store.status(device_id)?.sensor(kind)
    }

    pub fn device(&self, device_id: &str) -> Option<Arc<Device>> {
        self.inner.store.device(device_id)
    }

    pub fn device_status(&self, device_id: &str) -> Option<Arc<DeviceStatus>> {
        self.inner.store.status(device_id)
    }

    pub fn devices_snapshot(&self) -> Arc<DeviceMap> {
        self.inner.store.devices_snapshot()
    }

    pub fn statuses_snapshot(&self) -> Arc<StatusMap> {
        self.inner.store.statuses_snapshot()
    }

    pub fn last_status_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.store.last_status_refresh()
    }

    pub fn last_device_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.store.last_device_refresh()
    }

    // ── State observation ────────────────────────────────────────

    pub fn state(&self) -> BridgeState {
        *self.inner.state.borrow()
    }

    /// Subscribe to session state changes.
    pub fn connection_state(&self) -> watch::Receiver<BridgeState> {
        self.inner.state.subscribe()
    }

    /// Subscribe to entity announcements. Each entity is announced once
    /// per bridge; late subscribers do not see earlier announcements.
    pub fn subscribe_discoveries(&self) -> broadcast::Receiver<DiscoveredEntity> {
        self.inner.discovery_tx.subscribe()
    }

    // ── Internals ────────────────────────────────────────────────

    /// Publish a new state. `send_replace` stores the value even while no
    /// one subscribes to [`connection_state()`](Self::connection_state).
    fn set_state(&self, state: BridgeState) {
        self.inner.state.send_replace(state);
    }

    fn session(&self) -> Result<Arc<Session>, CoreError> {
        if let Some(session) = self.inner.session.load_full() {
            return Ok(session);
        }
        match self.state() {
            BridgeState::SessionExpired => Err(CoreError::SessionExpired),
            _ => Err(CoreError::Unauthenticated),
        }
    }

    /// Fold an API error into bridge state and log the cloud's messages.
    fn absorb(&self, err: shelly_cloud_api::Error) -> CoreError {
        if err.is_auth_expired() {
            self.inner.session.store(None);
            self.set_state(BridgeState::SessionExpired);
            warn!("Shelly Cloud session expired");
        } else if let Some(errors) = err.api_errors() {
            log_api_errors(errors);
        } else if err.is_transient() {
            debug!(error = %err, "transient network failure, next poll retries");
        }
        err.into()
    }
}

// ── Background tasks ─────────────────────────────────────────────

impl Bridge {
    /// Idempotent. A disconnected bridge never restarts its tasks.
    async fn spawn_tasks(&self) {
        let mut handles = self.inner.task_handles.lock().await;
        if !handles.is_empty() || self.inner.cancel.is_cancelled() {
            return;
        }

        let status_every = self.inner.config.status_interval;
        if !status_every.is_zero() {
            let bridge = self.clone();
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(status_task(bridge, status_every, cancel)));
        }

        let discovery_every = self.inner.config.discovery_interval;
        if !discovery_every.is_zero() {
            let bridge = self.clone();
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(discovery_task(bridge, discovery_every, cancel)));
        }
    }
}

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Periodically poll device status.
async fn status_task(bridge: Bridge, period: Duration, cancel: CancellationToken) {
    let mut interval = ticker(period);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if bridge.state() == BridgeState::Authenticated {
                    match bridge.refresh_status().await {
                        Ok(_) => {}
                        Err(e) if e.needs_login() => debug!(error = %e, "status refresh needs a new login"),
                        Err(e) => warn!(error = %e, "periodic status refresh failed"),
                    }
                } else {
                    debug!(state = ?bridge.state(), "status refresh skipped");
                }
            }
        }
    }
}

/// Periodically poll the device list.
async fn discovery_task(bridge: Bridge, period: Duration, cancel: CancellationToken) {
    let mut interval = ticker(period);
    interval.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if bridge.state() == BridgeState::Authenticated {
                    match bridge.refresh_devices().await {
                        Ok(_) => {}
                        Err(e) if e.needs_login() => debug!(error = %e, "device refresh needs a new login"),
                        Err(e) => warn!(error = %e, "periodic device refresh failed"),
                    }
                } else {
                    debug!(state = ?bridge.state(), "device refresh skipped");
                }
            }
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn log_api_errors(errors: &ApiErrors) {
    for line in errors.lines() {
        error!("{line}");
    }
}

fn warn_if_slow(refresh: &'static str, elapsed: Duration, interval: Duration) {
    if !interval.is_zero() && elapsed > interval {
        warn!(
            refresh,
            ?elapsed,
            ?interval,
            "refresh took longer than its polling interval"
        );
    }
}

/// Build a [`TransportConfig`] from the bridge configuration.
fn build_transport(config: &BridgeConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        },
        timeout: config.timeout,
    }
}
