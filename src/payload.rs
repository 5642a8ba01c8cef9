//! State payload for Hue lights.

use std::time::Duration;

use serde::Serialize;

use crate::types::{Brightness, Color, PowerMode, Xy};

/// A state change to send to a Hue light.
///
/// A state can contain multiple attributes (power, brightness, color,
/// transition time) that the bridge applies in a single request. Colors only
/// enter a state through [`LightState::color`], which converts them to the
/// light's native chromaticity.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use hue_calendar_rs::{Brightness, Color, LightState, PowerMode};
///
/// let mut state = LightState::new();
/// state.power(&PowerMode::On);
/// state.brightness(&Brightness::create(200).unwrap());
/// state.color(&Color::rgb(0, 255, 0));
/// state.transition_time(Duration::from_millis(400));
/// assert!(state.is_valid());
/// assert_eq!(state.transition_deciseconds(), Some(4));
/// ```
#[serde_with::skip_serializing_none]
#[derive(Default, Debug, Serialize, Clone, PartialEq)]
pub struct LightState {
    pub(crate) on: Option<bool>,
    #[serde(rename = "bri")]
    pub(crate) brightness: Option<u8>,
    pub(crate) xy: Option<[f64; 2]>,
    #[serde(rename = "transitiontime")]
    pub(crate) transition: Option<u16>,
}

impl LightState {
    /// Create a new empty state.
    ///
    /// At least one attribute other than the transition time must be set for
    /// the state to be valid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if this state changes anything on the light.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use hue_calendar_rs::LightState;
    ///
    /// let mut state = LightState::new();
    /// state.transition_time(Duration::ZERO);
    /// assert!(!state.is_valid());
    /// ```
    pub fn is_valid(&self) -> bool {
        self.on.is_some() || self.brightness.is_some() || self.xy.is_some()
    }

    pub fn power(&mut self, power: &PowerMode) {
        self.on = Some(power.is_on());
    }

    pub fn brightness(&mut self, brightness: &Brightness) {
        self.brightness = Some(brightness.value);
    }

    /// Set the color, converted to chromaticity.
    pub fn color(&mut self, color: &Color) {
        self.xy = Some(Xy::from_rgb(color).to_array());
    }

    /// Set how long the light takes to reach this state.
    ///
    /// The bridge counts in 100 ms units; the remainder is dropped.
    pub fn transition_time(&mut self, duration: Duration) {
        let deciseconds = duration.as_millis() / 100;
        self.transition = Some(u16::try_from(deciseconds).unwrap_or(u16::MAX));
    }

    pub fn is_on(&self) -> Option<bool> {
        self.on
    }

    pub fn xy(&self) -> Option<Xy> {
        self.xy.map(|[x, y]| Xy { x, y })
    }

    pub fn transition_deciseconds(&self) -> Option<u16> {
        self.transition
    }
}

impl From<&PowerMode> for LightState {
    fn from(power: &PowerMode) -> Self {
        let mut s = LightState::new();
        s.power(power);
        s
    }
}

impl From<&Color> for LightState {
    fn from(color: &Color) -> Self {
        let mut s = LightState::new();
        s.color(color);
        s
    }
}

impl From<&Brightness> for LightState {
    fn from(brightness: &Brightness) -> Self {
        let mut s = LightState::new();
        s.brightness(brightness);
        s
    }
}
