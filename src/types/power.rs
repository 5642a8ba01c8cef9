//! Power mode for light control.

use strum_macros::{Display, EnumString};

/// Power state for a light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PowerMode {
    /// Turn the light on
    On,
    /// Turn the light off
    Off,
}

impl PowerMode {
    pub(crate) fn is_on(self) -> bool {
        matches!(self, PowerMode::On)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_power_mode() {
        assert_eq!(PowerMode::from_str("on").unwrap(), PowerMode::On);
        assert_eq!(PowerMode::from_str("OFF").unwrap(), PowerMode::Off);
        assert!(PowerMode::from_str("reboot").is_err());
        assert_eq!(PowerMode::Off.to_string(), "off");
    }
}
