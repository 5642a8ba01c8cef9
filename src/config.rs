//! Operator configuration.
//!
//! Built once at start-up from, in increasing priority: built-in defaults, a
//! TOML file, the flat environment names used by earlier deployments, and
//! `HUE_CALENDAR_`-prefixed variables (`__` separates sections, e.g.
//! `HUE_CALENDAR_SCHEDULE__BRIGHTNESS=200`). A `.env` file is read into the
//! environment first when present.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use chrono_tz::Tz;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::connection::PairingPolicy;
use crate::errors::Error;
use crate::policy::TitleColorMap;
use crate::transition::TransitionTiming;
use crate::types::Brightness;

type Result<T> = std::result::Result<T, Error>;

/// Config file read when none is given explicitly.
pub const DEFAULT_CONFIG_PATH: &str = "hue-calendar.toml";

/// Variables prefixed with this override any other source.
pub const ENV_PREFIX: &str = "HUE_CALENDAR_";

/// Flat environment names and the settings they stand for.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("HUE_BRIDGE_IP", "bridge.address"),
    ("LIGHT_NAME", "bridge.light_name"),
    ("CALDAV_URL", "calendar.url"),
    ("CALDAV_USERNAME", "calendar.username"),
    ("CALDAV_PASSWORD", "calendar.password"),
    ("CALENDAR_NAME", "calendar.name"),
    ("LOG_LEVEL", "log_level"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bridge: BridgeConfig,
    pub calendar: CalendarConfig,
    pub schedule: ScheduleConfig,
    pub transition: TransitionConfig,
    /// Event title to `"r,g,b"`.
    pub colors: TitleColorMap,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bridge: BridgeConfig::default(),
            calendar: CalendarConfig::default(),
            schedule: ScheduleConfig::default(),
            transition: TransitionConfig::default(),
            colors: TitleColorMap::new(),
            log_level: "info".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Host name, IP address or base URL of the bridge.
    pub address: String,
    /// Name of the light to drive, as shown in the Hue app.
    pub light_name: String,
    pub credential_path: PathBuf,
    pub device_type: String,
    pub pairing_backoff_secs: u64,
    /// Unset retries pairing until interrupted.
    pub pairing_max_attempts: Option<u32>,
    pub request_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let pairing = PairingPolicy::default();
        BridgeConfig {
            address: String::new(),
            light_name: String::new(),
            credential_path: PathBuf::from("hue_connection.json"),
            device_type: pairing.device_type,
            pairing_backoff_secs: pairing.backoff.as_secs(),
            pairing_max_attempts: pairing.max_attempts,
            request_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// iCalendar feed URL.
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Expected calendar name; a feed with another name yields no events.
    pub name: Option<String>,
    pub lookahead_hours: u32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            url: String::new(),
            username: None,
            password: None,
            name: None,
            lookahead_hours: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub poll_interval_minutes: u64,
    /// How long before its start an event becomes active.
    pub pre_activation_hours: u32,
    /// IANA name used for floating and all-day calendar times.
    pub time_zone: String,
    pub brightness: u8,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            poll_interval_minutes: 5,
            pre_activation_hours: 12,
            time_zone: "Europe/Berlin".into(),
            brightness: 254,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub steps: u32,
    pub step_delay_ms: u64,
    pub dwell_secs: u64,
    /// Transitions per poll when several events are active.
    pub cycle_iterations: usize,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        TransitionConfig {
            steps: 20,
            step_delay_ms: 100,
            dwell_secs: 5,
            cycle_iterations: 60,
        }
    }
}

impl Config {
    /// Read the `.env` file, then merge and validate all sources.
    ///
    /// `config_path` defaults to [`DEFAULT_CONFIG_PATH`], which may be
    /// absent; an explicitly given file must exist.
    pub fn load(config_path: Option<&Path>, env_file: Option<&Path>) -> Result<Self> {
        load_env_file(env_file)?;

        let path = match config_path {
            Some(path) if !path.is_file() => {
                return Err(Error::invalid_config(
                    "config",
                    format!("{} does not exist", path.display()),
                ));
            }
            Some(path) => path,
            None => Path::new(DEFAULT_CONFIG_PATH),
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(legacy_env())
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(figment)
    }

    /// Extract and validate a config from already assembled sources.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bridge.address.trim().is_empty() {
            return Err(Error::invalid_config("bridge.address", "must not be empty"));
        }
        if self.bridge.light_name.trim().is_empty() {
            return Err(Error::invalid_config("bridge.light_name", "must not be empty"));
        }
        if self.bridge.pairing_max_attempts == Some(0) {
            return Err(Error::invalid_config(
                "bridge.pairing_max_attempts",
                "must be at least 1",
            ));
        }
        if self.bridge.request_timeout_secs == 0 {
            return Err(Error::invalid_config(
                "bridge.request_timeout_secs",
                "must be at least 1",
            ));
        }
        if self.schedule.poll_interval_minutes == 0 {
            return Err(Error::invalid_config(
                "schedule.poll_interval_minutes",
                "must be at least 1",
            ));
        }
        if self.transition.cycle_iterations == 0 {
            return Err(Error::invalid_config(
                "transition.cycle_iterations",
                "must be at least 1",
            ));
        }
        if Brightness::create(self.schedule.brightness).is_none() {
            return Err(Error::invalid_config(
                "schedule.brightness",
                format!("{} is outside 1..=254", self.schedule.brightness),
            ));
        }
        if self.calendar.lookahead_hours < self.schedule.pre_activation_hours {
            return Err(Error::invalid_config(
                "calendar.lookahead_hours",
                "must cover schedule.pre_activation_hours",
            ));
        }
        self.time_zone()?;
        self.log_filter()?;
        Ok(())
    }

    pub fn pairing_policy(&self) -> PairingPolicy {
        PairingPolicy {
            backoff: Duration::from_secs(self.bridge.pairing_backoff_secs),
            max_attempts: self.bridge.pairing_max_attempts,
            device_type: self.bridge.device_type.clone(),
        }
    }

    /// Bound on every bridge and calendar round-trip.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.bridge.request_timeout_secs)
    }

    pub fn transition_timing(&self) -> TransitionTiming {
        TransitionTiming {
            steps: self.transition.steps,
            step_delay: Duration::from_millis(self.transition.step_delay_ms),
            dwell: Duration::from_secs(self.transition.dwell_secs),
        }
    }

    pub fn time_zone(&self) -> Result<Tz> {
        self.schedule
            .time_zone
            .parse::<Tz>()
            .map_err(|e| Error::invalid_config("schedule.time_zone", e.to_string()))
    }

    pub fn brightness(&self) -> Brightness {
        Brightness::create_or(self.schedule.brightness)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.poll_interval_minutes * 60)
    }

    pub fn pre_activation(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.schedule.pre_activation_hours))
    }

    pub fn lookahead(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.calendar.lookahead_hours))
    }

    pub fn log_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse::<LevelFilter>()
            .map_err(|_| Error::invalid_config("log_level", format!("unknown level '{}'", self.log_level)))
    }
}

/// Load variables from `path`, or from `.env` in the working directory.
///
/// A missing file is not an error.
fn load_env_file(path: Option<&Path>) -> Result<bool> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };
    match loaded {
        Ok(()) => Ok(true),
        Err(dotenvy::Error::Io(_)) => Ok(false),
        Err(err) => Err(err.into()),
    }
}

fn legacy_env() -> Env {
    let names: Vec<&str> = LEGACY_ENV.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(|key| {
        LEGACY_ENV
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map_or_else(|| key.as_str().to_string(), |(_, dotted)| dotted.to_string())
            .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;
    use figment::Jail;

    const MINIMAL: &str = r#"
        [bridge]
        address = "192.168.1.2"
        light_name = "Hallway"
    "#;

    fn from_toml(toml: &str) -> Result<Config> {
        Config::from_figment(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::string(toml)),
        )
    }

    #[test]
    fn test_defaults() {
        let config = from_toml(MINIMAL).unwrap();
        assert_eq!(config.bridge.credential_path, PathBuf::from("hue_connection.json"));
        assert_eq!(config.pairing_policy(), PairingPolicy::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.transition_timing(), TransitionTiming::default());
        assert_eq!(config.transition.cycle_iterations, 60);
        assert_eq!(config.poll_interval(), Duration::from_secs(300));
        assert_eq!(config.pre_activation(), TimeDelta::hours(12));
        assert_eq!(config.lookahead(), TimeDelta::hours(24));
        assert_eq!(config.time_zone().unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(config.brightness(), Brightness::new());
        assert_eq!(config.log_filter().unwrap(), LevelFilter::Info);
        assert!(config.colors.is_empty());
    }

    #[test]
    fn test_full_file() {
        let config = from_toml(
            r#"
            log_level = "debug"

            [bridge]
            address = "bridge.local"
            light_name = "Hallway"
            pairing_backoff_secs = 3
            pairing_max_attempts = 4

            [schedule]
            brightness = 128
            time_zone = "America/New_York"

            [transition]
            steps = 10
            step_delay_ms = 250

            [colors]
            "Biotonne" = "0,255,0"
            "Gelbe Säcke" = "255, 255, 0"
            "#,
        )
        .unwrap();

        assert_eq!(config.pairing_policy().backoff, Duration::from_secs(3));
        assert_eq!(config.pairing_policy().max_attempts, Some(4));
        assert_eq!(config.brightness().value(), 128);
        assert_eq!(config.time_zone().unwrap(), chrono_tz::America::New_York);
        assert_eq!(config.transition_timing().steps, 10);
        assert_eq!(config.transition_timing().step_delay, Duration::from_millis(250));
        assert_eq!(config.transition_timing().dwell, Duration::from_secs(5));
        assert_eq!(config.colors.resolve("Gelbe Säcke"), Color::rgb(255, 255, 0));
        assert_eq!(config.colors.resolve("Biotonne"), Color::rgb(0, 255, 0));
        assert_eq!(config.log_filter().unwrap(), LevelFilter::Debug);
    }

    #[test]
    fn test_validation() {
        let invalid = |extra: &str| from_toml(&format!("{extra}\n{MINIMAL}")).unwrap_err();

        assert!(matches!(from_toml(""), Err(Error::InvalidConfig { ref field, .. }) if field == "bridge.address"));
        assert!(matches!(
            invalid("log_level = \"loud\""),
            Error::InvalidConfig { ref field, .. } if field == "log_level"
        ));
        assert!(matches!(
            from_toml(&format!("{MINIMAL}\n[schedule]\nbrightness = 0")),
            Err(Error::InvalidConfig { ref field, .. }) if field == "schedule.brightness"
        ));
        assert!(matches!(
            from_toml(&format!("{MINIMAL}\n[schedule]\ntime_zone = \"Mars/Olympus\"")),
            Err(Error::InvalidConfig { ref field, .. }) if field == "schedule.time_zone"
        ));
        assert!(matches!(
            from_toml(&format!("{MINIMAL}\n[calendar]\nlookahead_hours = 6")),
            Err(Error::InvalidConfig { ref field, .. }) if field == "calendar.lookahead_hours"
        ));
        assert!(matches!(
            from_toml(&format!("{MINIMAL}\n[schedule]\npoll_interval_minutes = 0")),
            Err(Error::InvalidConfig { ref field, .. }) if field == "schedule.poll_interval_minutes"
        ));
        assert!(matches!(
            from_toml(&format!("{MINIMAL}\n[transition]\ncycle_iterations = 0")),
            Err(Error::InvalidConfig { ref field, .. }) if field == "transition.cycle_iterations"
        ));
        assert!(matches!(
            from_toml(&format!("{MINIMAL}\n[colors]\nBiotonne = \"green\"")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_load_layers_file_and_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_PATH, MINIMAL)?;
            jail.set_env("LIGHT_NAME", "Kitchen");
            jail.set_env("CALDAV_URL", "https://cloud.example/cal.ics");
            jail.set_env("HUE_CALENDAR_SCHEDULE__BRIGHTNESS", "77");
            jail.set_env("HUE_CALENDAR_CALENDAR__NAME", "Abfall");

            let missing_env = jail.directory().join("missing.env");
            let config = Config::load(None, Some(missing_env.as_path())).unwrap();
            assert_eq!(config.bridge.address, "192.168.1.2");
            assert_eq!(config.bridge.light_name, "Kitchen");
            assert_eq!(config.calendar.url, "https://cloud.example/cal.ics");
            assert_eq!(config.calendar.name.as_deref(), Some("Abfall"));
            assert_eq!(config.schedule.brightness, 77);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_config_file_must_exist() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("nope.toml");
            let missing_env = jail.directory().join("missing.env");
            let err = Config::load(Some(path.as_path()), Some(missing_env.as_path())).unwrap_err();
            assert!(matches!(err, Error::InvalidConfig { ref field, .. } if field == "config"));
            Ok(())
        });
    }
}
