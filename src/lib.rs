//! # hue_calendar_rs
//!
//! An async Rust library for driving a Philips Hue light from calendar events.
//!
//! Every few minutes the calendar is asked for its upcoming events. Events
//! that are about to start (or are running) are mapped to colors by title,
//! and the light is set accordingly: off when nothing is active, a steady
//! color for one active event, and a smooth cycle through all colors when
//! several are active at once.
//!
//! ## Quick Start
//!
//! ```ignore
//! use hue_calendar_rs::{
//!     Config, ConnectionManager, IcsCalendar, LightDriver, Scheduler,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! async fn drive() -> Result<(), hue_calendar_rs::Error> {
//!     let config = Config::load(None, None)?;
//!     let cancel = CancellationToken::new();
//!
//!     let connection = ConnectionManager::from_config(&config, cancel.clone())?;
//!     let driver = LightDriver::new(connection, config.transition_timing());
//!     let calendar = IcsCalendar::from_config(&config)?;
//!
//!     Scheduler::new(&config, calendar, driver).run(&cancel).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Colors**: RGB [`Color`]s are converted to the bridge's CIE [`Xy`] space
//! - **Title mapping**: event titles resolve to colors through a [`TitleColorMap`]
//! - **Pairing**: [`ConnectionManager`] persists the bridge credential and pairs
//!   again when it is missing, waiting for the link button to be pressed
//! - **Transitions**: interpolated fades and multi-color cycles with [`transition()`]
//!   and [`cycle()`]
//! - **Calendars**: any [`CalendarSource`]; [`IcsCalendar`] reads iCalendar feeds
//!
//! ## Communication
//!
//! The bridge is reached over its local REST API. Before the first use the
//! link button on the bridge has to be pressed so that it hands out a token;
//! the token is stored in a small JSON file and reused afterwards.
//!
//! ## Logging
//!
//! All components log through the [`log`] facade. Install any logger in the
//! application to see pairing prompts and poll results.

mod bridge;
mod calendar;
mod config;
mod connection;
mod credential;
mod driver;
mod errors;
mod light;
#[cfg(test)]
mod mock;
mod payload;
mod policy;
pub mod runtime;
mod scheduler;
mod transition;
mod types;

// Re-export public API
pub use bridge::{BridgeApi, ConnectionHandle, HueBridge};
pub use calendar::{CalendarEvent, CalendarSource, IcsCalendar, IcsFeed, parse_ics};
pub use config::{
    BridgeConfig, CalendarConfig, Config, DEFAULT_CONFIG_PATH, ENV_PREFIX, ScheduleConfig,
    TransitionConfig,
};
pub use connection::{ConnectionManager, ConnectionState, PairingPolicy, Session};
pub use credential::{
    CredentialStore, DeviceCredential, FileCredentialStore, MemoryCredentialStore,
};
pub use driver::LightDriver;
pub use errors::Error;
pub use light::Light;
pub use payload::LightState;
pub use policy::{TitleColorMap, resolve_color};
pub use scheduler::{PollOutcome, Scheduler, active_colors, is_active};
pub use transition::{CycleLimit, TransitionPlan, TransitionTiming, cycle, transition};
pub use types::{Brightness, Color, PowerMode, Xy};
