//! RGB color representation.

use std::fmt;
use std::str::FromStr;

use crate::errors::Error;

/// An RGB color with red, green, and blue components (0-255 each).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub(crate) red: u8,
    pub(crate) green: u8,
    pub(crate) blue: u8,
}

impl Color {
    /// Fallback for titles without a configured color.
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    /// Create a color with the given RGB values.
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }

    /// Returns the color `step / steps` of the way from `self` to `end`.
    ///
    /// Each channel is interpolated independently and truncated toward zero,
    /// so intermediate steps may sit slightly short of an exact rounding.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_calendar_rs::Color;
    ///
    /// let start = Color::rgb(255, 0, 0);
    /// let end = Color::rgb(0, 255, 0);
    /// // 255 - 3 * 12.75 = 216.75, truncated
    /// assert_eq!(start.interpolate(&end, 3, 20), Color::rgb(216, 38, 0));
    /// ```
    pub fn interpolate(&self, end: &Color, step: u32, steps: u32) -> Color {
        if steps == 0 {
            return *end;
        }
        let channel = |from: u8, to: u8| -> u8 {
            let delta = (f64::from(to) - f64::from(from)) / f64::from(steps);
            (f64::from(from) + delta * f64::from(step)) as u8
        };
        Color::rgb(
            channel(self.red, end.red),
            channel(self.green, end.green),
            channel(self.blue, end.blue),
        )
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.red, self.green, self.blue)
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Parse from comma-separated string (e.g., "255,128,0").
    fn from_str(s: &str) -> Result<Self, Error> {
        let parts = s
            .split(',')
            .map(|c| c.trim().parse::<u8>())
            .collect::<Result<Vec<u8>, _>>()
            .map_err(|_| Error::InvalidColorString(s.to_string()))?;
        match parts.as_slice() {
            [r, g, b] => Ok(Self::rgb(*r, *g, *b)),
            _ => Err(Error::InvalidColorString(s.to_string())),
        }
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Color::rgb(red, green, blue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(Color::from_str("0,255,0").unwrap(), Color::rgb(0, 255, 0));
        assert_eq!(
            Color::from_str(" 255, 255 ,0").unwrap(),
            Color::rgb(255, 255, 0)
        );
    }

    #[test]
    fn test_parse_color_rejects_garbage() {
        assert!(Color::from_str("0,255").is_err());
        assert!(Color::from_str("0,256,0").is_err());
        assert!(Color::from_str("red").is_err());
        assert!(Color::from_str("1,2,3,4").is_err());
    }

    #[test]
    fn test_display() {
        let color = Color::rgb(12, 34, 56);
        assert_eq!(color.to_string(), "12,34,56");
    }

    #[test]
    fn test_interpolate_truncates() {
        let start = Color::rgb(255, 0, 0);
        let end = Color::rgb(0, 255, 0);
        assert_eq!(start.interpolate(&end, 0, 20), start);
        assert_eq!(start.interpolate(&end, 1, 20), Color::rgb(242, 12, 0));
        // 255 - 19 * 12.75 = 12.75
        assert_eq!(start.interpolate(&end, 19, 20), Color::rgb(12, 242, 0));
    }

    #[test]
    fn test_interpolate_small_deltas() {
        let start = Color::rgb(10, 10, 10);
        let end = Color::rgb(11, 9, 10);
        // 10.5 -> 10 and 9.5 -> 9
        assert_eq!(start.interpolate(&end, 1, 2), Color::rgb(10, 9, 10));
    }

    #[test]
    fn test_interpolate_zero_steps_is_end() {
        let start = Color::rgb(1, 2, 3);
        let end = Color::rgb(4, 5, 6);
        assert_eq!(start.interpolate(&end, 0, 0), end);
    }
}
