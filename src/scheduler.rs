//! The poll loop that turns calendar events into light states.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::bridge::BridgeApi;
use crate::calendar::{CalendarEvent, CalendarSource};
use crate::config::Config;
use crate::credential::CredentialStore;
use crate::driver::LightDriver;
use crate::errors::Error;
use crate::policy::TitleColorMap;
use crate::runtime;
use crate::types::Color;

type Result<T> = std::result::Result<T, Error>;

/// Check if an event spanning `[start, end]` is active at `now`.
///
/// Events become active `offset` before their start and stay active until
/// their end, both bounds inclusive.
pub fn is_active(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
    offset: TimeDelta,
) -> bool {
    start - offset <= now && now <= end
}

/// Colors of all events active at `now`, in event order.
///
/// Events that lack a start or an end are skipped with a warning. Two active
/// events with the same title contribute their color twice.
pub fn active_colors(
    events: &[CalendarEvent],
    now: DateTime<Utc>,
    offset: TimeDelta,
    colors: &TitleColorMap,
) -> Vec<Color> {
    events
        .iter()
        .filter_map(|event| match (event.start, event.end) {
            (Some(start), Some(end)) => {
                is_active(start, end, now, offset).then(|| colors.resolve(&event.title))
            }
            _ => {
                warn!("skipping event '{}' without start or end", event.title);
                None
            }
        })
        .collect()
}

/// What one poll did to the light.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Off,
    Steady(Color),
    Cycled(Vec<Color>),
}

/// Drives the configured light from a calendar.
pub struct Scheduler<'a, C, B, S> {
    config: &'a Config,
    calendar: C,
    driver: LightDriver<B, S>,
}

impl<'a, C, B, S> Scheduler<'a, C, B, S>
where
    C: CalendarSource,
    B: BridgeApi,
    S: CredentialStore,
{
    pub fn new(config: &'a Config, calendar: C, driver: LightDriver<B, S>) -> Self {
        Scheduler {
            config,
            calendar,
            driver,
        }
    }

    pub fn calendar(&self) -> &C {
        &self.calendar
    }

    pub fn driver(&self) -> &LightDriver<B, S> {
        &self.driver
    }

    /// Fetch the events around `now` and update the light once.
    ///
    /// Blocks for the whole cycle when several events are active.
    pub async fn poll_once(&mut self, now: DateTime<Utc>) -> Result<PollOutcome> {
        let events = self.calendar.fetch_events(now).await?;
        let colors = active_colors(&events, now, self.config.pre_activation(), &self.config.colors);
        info!(
            "{} events fetched, active colors: [{}]",
            events.len(),
            colors
                .iter()
                .map(Color::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        );

        let light = self.config.bridge.light_name.as_str();
        let brightness = self.config.brightness();
        match colors.as_slice() {
            [] => {
                self.driver.set_steady(light, None, &brightness).await?;
                Ok(PollOutcome::Off)
            }
            [color] => {
                self.driver.set_steady(light, Some(*color), &brightness).await?;
                Ok(PollOutcome::Steady(*color))
            }
            _ => {
                self.driver
                    .cycle(light, &colors, self.config.transition.cycle_iterations)
                    .await?;
                Ok(PollOutcome::Cycled(colors))
            }
        }
    }

    /// Poll until `cancel` fires.
    ///
    /// Errors are logged and the loop carries on with the next poll. After a
    /// cycle the next poll starts right away, otherwise the loop waits for
    /// the poll interval.
    pub async fn run(&mut self, cancel: &CancellationToken) {
        let interval = self.config.poll_interval();
        info!(
            "driving light '{}' every {interval:?}",
            self.config.bridge.light_name
        );

        while !cancel.is_cancelled() {
            let wait = match self.poll_once(Utc::now()).await {
                Ok(PollOutcome::Cycled(_)) => Duration::ZERO,
                Ok(_) => interval,
                Err(e) => {
                    error!("poll failed: {e}");
                    interval
                }
            };
            if !runtime::sleep_or_cancelled(wait, cancel).await {
                break;
            }
        }
        info!("scheduler stopped");
    }
}
