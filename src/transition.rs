//! Stepwise color transitions and multi-color cycling.

use std::time::Duration;

use log::debug;

use crate::bridge::BridgeApi;
use crate::connection::Session;
use crate::errors::Error;
use crate::light::Light;
use crate::payload::LightState;
use crate::runtime::{self, Instant};
use crate::types::{Color, PowerMode};

type Result<T> = std::result::Result<T, Error>;

/// Operator-configured pacing of transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTiming {
    /// Interpolated writes before the final snap.
    pub steps: u32,
    /// Wait after each interpolated write; also the light's fade per step.
    pub step_delay: Duration,
    /// How long the end color is held before returning.
    pub dwell: Duration,
}

impl Default for TransitionTiming {
    fn default() -> Self {
        TransitionTiming {
            steps: 20,
            step_delay: Duration::from_millis(100),
            dwell: Duration::from_secs(5),
        }
    }
}

/// One fade of one light from `start` to `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    pub light: Light,
    pub start: Color,
    pub end: Color,
    pub steps: u32,
    pub step_delay: Duration,
    pub dwell: Duration,
}

impl TransitionPlan {
    pub fn new(light: &Light, start: Color, end: Color, timing: &TransitionTiming) -> Self {
        TransitionPlan {
            light: light.clone(),
            start,
            end,
            steps: timing.steps,
            step_delay: timing.step_delay,
            dwell: timing.dwell,
        }
    }
}

/// When a cycle stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleLimit {
    /// Run exactly this many transitions.
    Iterations(usize),
    /// Start new transitions until this much time has passed.
    Duration(Duration),
}

/// Fade the light through `plan`, then hold the end color for the dwell time.
///
/// Every interpolated step is sent with the step delay as its fade time.
/// Afterwards the exact end color is sent with no fade so that truncation in
/// the intermediate steps never leaves the light off target.
pub async fn transition<B: BridgeApi>(session: &Session<'_, B>, plan: &TransitionPlan) -> Result<()> {
    debug!(
        "transition of '{}' from {} to {} in {} steps",
        plan.light.name(),
        plan.start,
        plan.end,
        plan.steps
    );

    for step in 0..plan.steps {
        let color = plan.start.interpolate(&plan.end, step, plan.steps);
        session
            .set_state(&plan.light, &step_state(&color, plan.step_delay))
            .await?;
        runtime::sleep(plan.step_delay).await;
    }

    session
        .set_state(&plan.light, &step_state(&plan.end, Duration::ZERO))
        .await?;
    runtime::sleep(plan.dwell).await;
    Ok(())
}

fn step_state(color: &Color, fade: Duration) -> LightState {
    let mut state = LightState::from(&PowerMode::On);
    state.color(color);
    state.transition_time(fade);
    state
}

/// Fade `light` around the circular sequence `colors` until `limit` is reached.
///
/// Transition `i` goes from `colors[i % n]` to `colors[(i + 1) % n]`, so one
/// full pass over `[a, b, c]` is `a -> b`, `b -> c`, `c -> a`. Returns the
/// number of transitions performed.
///
/// # Panics
///
/// Panics if `colors` has fewer than two entries; a single color has nothing
/// to cycle through.
pub async fn cycle<B: BridgeApi>(
    session: &Session<'_, B>,
    light: &Light,
    colors: &[Color],
    limit: CycleLimit,
    timing: &TransitionTiming,
) -> Result<usize> {
    assert!(
        colors.len() >= 2,
        "cycling needs at least two colors, got {}",
        colors.len()
    );

    let started = Instant::now();
    let mut performed = 0;
    loop {
        let more = match limit {
            CycleLimit::Iterations(total) => performed < total,
            CycleLimit::Duration(total) => started.elapsed() < total,
        };
        if !more {
            break;
        }

        let start = colors[performed % colors.len()];
        let end = colors[(performed + 1) % colors.len()];
        transition(session, &TransitionPlan::new(light, start, end, timing)).await?;
        performed += 1;
    }

    debug!("cycle of '{}' finished after {performed} transitions", light.name());
    Ok(performed)
}
