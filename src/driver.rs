//! The operations the scheduler drives a light with.

use log::info;

use crate::bridge::BridgeApi;
use crate::connection::ConnectionManager;
use crate::credential::CredentialStore;
use crate::errors::Error;
use crate::payload::LightState;
use crate::transition::{self, CycleLimit, TransitionTiming};
use crate::types::{Brightness, Color, PowerMode};

type Result<T> = std::result::Result<T, Error>;

/// Sets a named light to a steady color, off, or a cycle of colors.
///
/// Lights are resolved by name on every call. A name the bridge does not
/// report fails that call with [`Error::LightNotFound`] and nothing else.
pub struct LightDriver<B, S> {
    connection: ConnectionManager<B, S>,
    timing: TransitionTiming,
}

impl<B: BridgeApi, S: CredentialStore> LightDriver<B, S> {
    pub fn new(connection: ConnectionManager<B, S>, timing: TransitionTiming) -> Self {
        LightDriver { connection, timing }
    }

    pub fn connection(&self) -> &ConnectionManager<B, S> {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut ConnectionManager<B, S> {
        &mut self.connection
    }

    pub fn timing(&self) -> &TransitionTiming {
        &self.timing
    }

    /// Switch the light off (`None`) or show `color` at `brightness`.
    ///
    /// Either way the change is a single state write.
    pub async fn set_steady(
        &mut self,
        light_name: &str,
        color: Option<Color>,
        brightness: &Brightness,
    ) -> Result<()> {
        let session = self.connection.session().await?;
        let light = session.find_light(light_name).await?;

        let state = match color {
            None => LightState::from(&PowerMode::Off),
            Some(color) => {
                let mut state = LightState::from(&PowerMode::On);
                state.brightness(brightness);
                state.color(&color);
                state
            }
        };
        session.set_state(&light, &state).await?;

        match color {
            None => info!("light '{light_name}' switched off"),
            Some(color) => info!(
                "light '{light_name}' set to rgb={color} xy={:?}",
                state.xy().map(|xy| (xy.x(), xy.y()))
            ),
        }
        Ok(())
    }

    /// Fade the light through `colors` for `iterations` transitions.
    ///
    /// A single color is shown directly without any fading. Unlike
    /// [`set_steady`](Self::set_steady), neither path writes a brightness, so
    /// the light keeps whatever brightness it was last given.
    ///
    /// # Panics
    ///
    /// Panics if `colors` is empty.
    pub async fn cycle(&mut self, light_name: &str, colors: &[Color], iterations: usize) -> Result<()> {
        assert!(!colors.is_empty(), "cannot cycle through an empty color sequence");

        let session = self.connection.session().await?;
        let light = session.find_light(light_name).await?;

        if let [color] = colors {
            let mut state = LightState::from(&PowerMode::On);
            state.color(color);
            session.set_state(&light, &state).await?;
            info!("light '{light_name}' set to rgb={color}");
            return Ok(());
        }

        info!(
            "cycling light '{light_name}' through {} colors for {iterations} transitions",
            colors.len()
        );
        transition::cycle(
            &session,
            &light,
            colors,
            CycleLimit::Iterations(iterations),
            &self.timing,
        )
        .await?;
        Ok(())
    }
}
