// shelly-cloud-api: Async Rust client for the Shelly Cloud REST API

pub mod auth;
pub mod client;
pub mod devices;
pub mod error;
pub mod models;
pub mod relay;
pub mod transport;

pub use auth::{Session, sha1_hex};
pub use client::CloudClient;
pub use error::{ApiErrors, Error};
pub use models::{RawCloudState, RawDevice, RawDeviceStatus, RawRelay};
pub use relay::Turn;
pub use transport::{TlsMode, TransportConfig};
