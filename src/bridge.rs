//! Communication with the Hue bridge.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::errors::Error;
use crate::light::Light;
use crate::payload::LightState;
use crate::runtime;

type Result<T> = std::result::Result<T, Error>;

/// An authenticated session with one bridge.
///
/// Only [`ConnectionManager`](crate::ConnectionManager) creates handles; all
/// other code receives them by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionHandle {
    bridge_address: String,
    token: String,
}

impl ConnectionHandle {
    pub(crate) fn new(bridge_address: &str, token: &str) -> Self {
        ConnectionHandle {
            bridge_address: bridge_address.to_string(),
            token: token.to_string(),
        }
    }

    pub fn bridge_address(&self) -> &str {
        &self.bridge_address
    }

    /// The token to present to the bridge.
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// The operations the light engine needs from a bridge.
///
/// [`HueBridge`] talks to real hardware; tests substitute a recording double.
pub trait BridgeApi: Send + Sync {
    /// Ask the bridge for a new token.
    ///
    /// Fails with [`Error::LinkButtonNotPressed`] until the operator presses
    /// the bridge's link button.
    fn pair(&self, device_type: &str) -> impl Future<Output = Result<String>> + Send;

    /// All lights the bridge currently knows about.
    fn lights(&self, handle: &ConnectionHandle) -> impl Future<Output = Result<Vec<Light>>> + Send;

    /// Apply `state` to `light` in one round-trip.
    fn set_state(
        &self,
        handle: &ConnectionHandle,
        light: &Light,
        state: &LightState,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// One entry of the bridge's `[{"success": ...}, {"error": ...}]` answers.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiEntry {
    Success(Value),
    Error(ApiError),
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    kind: u16,
    #[serde(default)]
    address: String,
    #[serde(default)]
    description: String,
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        match err.kind {
            ApiError::LINK_BUTTON_NOT_PRESSED => Error::LinkButtonNotPressed,
            _ => Error::Bridge {
                kind: err.kind,
                address: err.address,
                description: err.description,
            },
        }
    }
}

impl ApiError {
    const LINK_BUTTON_NOT_PRESSED: u16 = 101;
}

#[derive(Debug, Deserialize)]
struct LightInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LightsResponse {
    Lights(BTreeMap<String, LightInfo>),
    Failure(Vec<ApiEntry>),
}

/// Fail on the first error entry in a bridge answer.
fn check_entries(entries: Vec<ApiEntry>) -> Result<Vec<Value>> {
    entries
        .into_iter()
        .map(|entry| match entry {
            ApiEntry::Success(value) => Ok(value),
            ApiEntry::Error(err) => Err(err.into()),
        })
        .collect()
}

/// A Philips Hue bridge reached over its local REST API.
#[derive(Debug, Clone)]
pub struct HueBridge {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HueBridge {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Create a client for the bridge at `address` (host or `http(s)://` URL).
    pub fn new(address: &str, timeout: Duration) -> Result<Self> {
        let base_url = if address.starts_with("http://") || address.starts_with("https://") {
            address.trim_end_matches('/').to_string()
        } else {
            format!("http://{address}")
        };
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http("build", e))?;
        Ok(HueBridge {
            base_url,
            client,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn round_trip<T: DeserializeOwned>(
        &self,
        action: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|e| Error::http(action, e))?
                .error_for_status()
                .map_err(|e| Error::http(action, e))?;
            response
                .json::<Value>()
                .await
                .map_err(|e| Error::http(action, e))
        };

        let body = runtime::timeout(self.timeout, exchange)
            .await
            .map_err(|_| Error::timeout(action, self.timeout))??;
        debug!("bridge {action} response: {body}");
        serde_json::from_value(body).map_err(Error::JsonLoad)
    }
}

impl BridgeApi for HueBridge {
    async fn pair(&self, device_type: &str) -> Result<String> {
        let request = self
            .client
            .post(format!("{}/api", self.base_url))
            .json(&json!({ "devicetype": device_type }));
        let entries: Vec<ApiEntry> = self.round_trip("pair", request).await?;

        let success = check_entries(entries)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::UnexpectedResponse("empty pairing answer".into()))?;
        success
            .get("username")
            .and_then(|u| u.as_str())
            .map(String::from)
            .ok_or_else(|| Error::UnexpectedResponse(success.to_string()))
    }

    async fn lights(&self, handle: &ConnectionHandle) -> Result<Vec<Light>> {
        let request = self
            .client
            .get(format!("{}/api/{}/lights", self.base_url, handle.token()));
        match self.round_trip("lights", request).await? {
            LightsResponse::Lights(lights) => Ok(lights
                .into_iter()
                .map(|(id, info)| Light::new(&id, &info.name))
                .collect()),
            LightsResponse::Failure(entries) => {
                check_entries(entries)?;
                Err(Error::UnexpectedResponse("light listing without lights".into()))
            }
        }
    }

    async fn set_state(
        &self,
        handle: &ConnectionHandle,
        light: &Light,
        state: &LightState,
    ) -> Result<()> {
        let request = self
            .client
            .put(format!(
                "{}/api/{}/lights/{}/state",
                self.base_url,
                handle.token(),
                light.id()
            ))
            .json(state);
        let entries: Vec<ApiEntry> = self.round_trip("set_state", request).await?;
        check_entries(entries)?;
        Ok(())
    }
}
