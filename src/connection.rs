//! Lifecycle of the authenticated bridge connection.

use std::time::Duration;

use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::bridge::{BridgeApi, ConnectionHandle, HueBridge};
use crate::config::Config;
use crate::credential::{CredentialStore, DeviceCredential, FileCredentialStore};
use crate::errors::Error;
use crate::light::Light;
use crate::payload::LightState;
use crate::runtime;

type Result<T> = std::result::Result<T, Error>;

/// How the manager pairs with a bridge when it has no usable credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingPolicy {
    /// Wait between two pairing attempts.
    pub backoff: Duration,
    /// Give up after this many attempts; `None` retries until cancelled.
    pub max_attempts: Option<u32>,
    /// The `devicetype` this client registers under.
    pub device_type: String,
}

impl Default for PairingPolicy {
    fn default() -> Self {
        PairingPolicy {
            backoff: Duration::from_secs(10),
            max_attempts: None,
            device_type: "hue_calendar_rs#daemon".to_string(),
        }
    }
}

/// Where the manager is in establishing its connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    Loading,
    Pairing { attempt: u32 },
    Connected,
}

/// A borrowed bridge together with the handle that authorizes its use.
pub struct Session<'a, B> {
    bridge: &'a B,
    handle: &'a ConnectionHandle,
}

impl<B: BridgeApi> Session<'_, B> {
    pub fn handle(&self) -> &ConnectionHandle {
        self.handle
    }

    pub async fn lights(&self) -> Result<Vec<Light>> {
        self.bridge.lights(self.handle).await
    }

    /// Resolve `name` against the lights the bridge reports right now.
    pub async fn find_light(&self, name: &str) -> Result<Light> {
        let lights = self.lights().await?;
        Light::find(&lights, name)
    }

    pub async fn set_state(&self, light: &Light, state: &LightState) -> Result<()> {
        self.bridge.set_state(self.handle, light, state).await
    }
}

/// Owns the single connection to one bridge.
///
/// The handle is built lazily: the first call to [`session`](Self::session)
/// or [`get_handle`](Self::get_handle) reuses a stored credential when one
/// exists and otherwise pairs, retrying until the operator presses the link
/// button, the attempt limit is reached, or `cancel` fires. All methods take
/// `&mut self`, so device operations through one manager never overlap.
pub struct ConnectionManager<B, S> {
    bridge_address: String,
    bridge: B,
    store: S,
    policy: PairingPolicy,
    cancel: CancellationToken,
    state: ConnectionState,
    handle: Option<ConnectionHandle>,
}

impl ConnectionManager<HueBridge, FileCredentialStore> {
    /// Build a manager for the configured bridge and credential file.
    pub fn from_config(config: &Config, cancel: CancellationToken) -> Result<Self> {
        let bridge = HueBridge::new(&config.bridge.address, config.request_timeout())?;
        let store = FileCredentialStore::new(&config.bridge.credential_path);
        Ok(ConnectionManager::new(
            &config.bridge.address,
            bridge,
            store,
            config.pairing_policy(),
            cancel,
        ))
    }
}

impl<B: BridgeApi, S: CredentialStore> ConnectionManager<B, S> {
    pub fn new(
        bridge_address: &str,
        bridge: B,
        store: S,
        policy: PairingPolicy,
        cancel: CancellationToken,
    ) -> Self {
        ConnectionManager {
            bridge_address: bridge_address.to_string(),
            bridge,
            store,
            policy,
            cancel,
            state: ConnectionState::Uninitialized,
            handle: None,
        }
    }

    pub fn bridge_address(&self) -> &str {
        &self.bridge_address
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The live handle, connecting first if necessary.
    ///
    /// May wait indefinitely while pairing.
    pub async fn get_handle(&mut self) -> Result<&ConnectionHandle> {
        Ok(self.session().await?.handle)
    }

    /// The bridge and a live handle, connecting first if necessary.
    pub async fn session(&mut self) -> Result<Session<'_, B>> {
        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => self.establish().await?,
        };
        let handle = self.handle.insert(handle);
        Ok(Session {
            bridge: &self.bridge,
            handle,
        })
    }

    /// Discard the current handle and any stored credential and pair again.
    pub async fn repair(&mut self) -> Result<&ConnectionHandle> {
        self.handle = None;
        let handle = self.pair().await?;
        Ok(self.handle.insert(handle))
    }

    async fn establish(&mut self) -> Result<ConnectionHandle> {
        self.state = ConnectionState::Loading;
        match self.store.load(&self.bridge_address) {
            Ok(Some(credential)) => {
                info!("reusing stored credential for bridge {}", self.bridge_address);
                self.state = ConnectionState::Connected;
                return Ok(ConnectionHandle::new(
                    &credential.bridge_address,
                    &credential.auth_token,
                ));
            }
            Ok(None) => {}
            Err(e) => warn!("ignoring unusable stored credential: {e}"),
        }
        self.pair().await
    }

    async fn pair(&mut self) -> Result<ConnectionHandle> {
        let mut attempt = 0;
        loop {
            if self.cancel.is_cancelled() {
                self.state = ConnectionState::Uninitialized;
                return Err(Error::PairingCancelled);
            }

            attempt += 1;
            self.state = ConnectionState::Pairing { attempt };
            info!(
                "pairing with Hue bridge {} (attempt {attempt})",
                self.bridge_address
            );

            match self.bridge.pair(&self.policy.device_type).await {
                Ok(token) => {
                    info!("paired with Hue bridge {}", self.bridge_address);
                    let credential = DeviceCredential::new(&self.bridge_address, &token);
                    if let Err(e) = self.store.save(&credential) {
                        error!("could not persist bridge credential: {e}");
                    }
                    self.state = ConnectionState::Connected;
                    return Ok(ConnectionHandle::new(&self.bridge_address, &token));
                }
                Err(e) if e.is_pairing_pending() => {
                    warn!("bridge {} refused pairing: {e}", self.bridge_address);
                }
                Err(e) => error!("pairing with bridge {} failed: {e}", self.bridge_address),
            }

            if self.policy.max_attempts.is_some_and(|max| attempt >= max) {
                self.state = ConnectionState::Uninitialized;
                return Err(Error::PairingExhausted(attempt));
            }

            info!(
                "press the link button on the Hue bridge; retrying in {:?}",
                self.policy.backoff
            );
            if !runtime::sleep_or_cancelled(self.policy.backoff, &self.cancel).await {
                self.state = ConnectionState::Uninitialized;
                return Err(Error::PairingCancelled);
            }
        }
    }
}
