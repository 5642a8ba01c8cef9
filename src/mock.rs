//! Recording bridge double for unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::bridge::{BridgeApi, ConnectionHandle};
use crate::errors::Error;
use crate::light::Light;
use crate::payload::LightState;
use crate::types::{Color, Xy};

type Result<T> = std::result::Result<T, Error>;

/// A state the bridge accepted, with the paused-clock time it arrived.
#[derive(Debug, Clone)]
pub(crate) struct Write {
    pub light_id: String,
    pub state: LightState,
    pub at: tokio::time::Instant,
}

impl Write {
    pub fn xy(&self) -> Option<Xy> {
        self.state.xy()
    }
}

/// The chromaticity a write for `color` carries.
pub(crate) fn xy(color: Color) -> Xy {
    Xy::from_rgb(&color)
}

#[derive(Debug)]
pub(crate) struct MockBridge {
    lights: Mutex<Vec<Light>>,
    failing_pairs: AtomicU32,
    pair_calls: AtomicU32,
    writes: Mutex<Vec<Write>>,
}

impl MockBridge {
    /// A bridge reporting lights with the given names and ids "1", "2", ...
    pub fn new(names: &[&str]) -> Self {
        let lights = names
            .iter()
            .enumerate()
            .map(|(i, name)| Light::new(&(i + 1).to_string(), name))
            .collect();
        MockBridge {
            lights: Mutex::new(lights),
            failing_pairs: AtomicU32::new(0),
            pair_calls: AtomicU32::new(0),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Refuse the next `count` pairing requests as if the link button was not pressed.
    pub fn failing_pairs(self, count: u32) -> Self {
        self.failing_pairs.store(count, Ordering::SeqCst);
        self
    }

    pub fn pair_calls(&self) -> u32 {
        self.pair_calls.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }

    /// Chromaticities of all writes that carried a color, in order.
    pub fn colors(&self) -> Vec<Xy> {
        self.writes().iter().filter_map(Write::xy).collect()
    }
}

impl BridgeApi for MockBridge {
    async fn pair(&self, _device_type: &str) -> Result<String> {
        let call = self.pair_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let remaining = self.failing_pairs.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_pairs.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::LinkButtonNotPressed);
        }
        Ok(format!("token-{call}"))
    }

    async fn lights(&self, _handle: &ConnectionHandle) -> Result<Vec<Light>> {
        Ok(self.lights.lock().unwrap().clone())
    }

    async fn set_state(
        &self,
        _handle: &ConnectionHandle,
        light: &Light,
        state: &LightState,
    ) -> Result<()> {
        self.writes.lock().unwrap().push(Write {
            light_id: light.id().to_string(),
            state: state.clone(),
            at: tokio::time::Instant::now(),
        });
        Ok(())
    }
}
