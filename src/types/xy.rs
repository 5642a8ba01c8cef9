//! CIE 1931 chromaticity, the native color space of Hue lights.

use crate::types::Color;

/// A point in the CIE xy chromaticity plane.
///
/// Always derived from a [`Color`]; brightness is carried separately.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct Xy {
    pub(crate) x: f64,
    pub(crate) y: f64,
}

impl Xy {
    const GAMMA_THRESHOLD: f64 = 0.04045;

    // Wide gamut RGB (D65) to XYZ, rows yield X, Y and Z.
    const RGB_TO_XYZ: [[f64; 3]; 3] = [
        [0.649926, 0.103455, 0.197109],
        [0.234327, 0.743075, 0.022598],
        [0.000000, 0.053077, 1.035763],
    ];

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Convert an RGB color to its chromaticity point.
    ///
    /// Pure black has no chromaticity and maps to `(0.0, 0.0)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_calendar_rs::{Color, Xy};
    ///
    /// let black = Xy::from_rgb(&Color::BLACK);
    /// assert_eq!((black.x(), black.y()), (0.0, 0.0));
    /// ```
    pub fn from_rgb(color: &Color) -> Self {
        let r = Self::decode_gamma(color.red);
        let g = Self::decode_gamma(color.green);
        let b = Self::decode_gamma(color.blue);

        let [x_row, y_row, z_row] = Self::RGB_TO_XYZ;
        let big_x = r * x_row[0] + g * x_row[1] + b * x_row[2];
        let big_y = r * y_row[0] + g * y_row[1] + b * y_row[2];
        let big_z = r * z_row[0] + g * z_row[1] + b * z_row[2];

        let sum = big_x + big_y + big_z;
        if sum == 0.0 {
            return Xy { x: 0.0, y: 0.0 };
        }
        Xy {
            x: big_x / sum,
            y: big_y / sum,
        }
    }

    /// sRGB transfer function: channel byte to linear intensity.
    fn decode_gamma(channel: u8) -> f64 {
        let c = f64::from(channel) / 255.0;
        if c <= Self::GAMMA_THRESHOLD {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }

    pub(crate) fn to_array(self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl From<&Color> for Xy {
    fn from(color: &Color) -> Self {
        Xy::from_rgb(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Xy, x: f64, y: f64) {
        assert!(
            (actual.x - x).abs() < 1e-4 && (actual.y - y).abs() < 1e-4,
            "expected ({x}, {y}), got ({}, {})",
            actual.x,
            actual.y
        );
    }

    #[test]
    fn test_black_is_origin() {
        assert_eq!(Xy::from_rgb(&Color::BLACK), Xy { x: 0.0, y: 0.0 });
    }

    #[test]
    fn test_white_is_d65() {
        assert_close(Xy::from_rgb(&Color::WHITE), 0.3127, 0.3290);
    }

    #[test]
    fn test_gray_shares_white_point() {
        assert_close(Xy::from_rgb(&Color::rgb(128, 128, 128)), 0.3127, 0.3290);
        assert_close(Xy::from_rgb(&Color::rgb(1, 1, 1)), 0.3127, 0.3290);
    }

    #[test]
    fn test_primaries() {
        assert_close(Xy::from_rgb(&Color::rgb(255, 0, 0)), 0.7350, 0.2650);
        assert_close(Xy::from_rgb(&Color::rgb(0, 255, 0)), 0.1150, 0.8260);
        assert_close(Xy::from_rgb(&Color::rgb(0, 0, 255)), 0.1570, 0.0180);
    }

    #[test]
    fn test_deterministic() {
        let color = Color::rgb(17, 200, 93);
        let a = Xy::from_rgb(&color);
        let b = Xy::from_rgb(&color);
        assert_eq!(a.x.to_bits(), b.x.to_bits());
        assert_eq!(a.y.to_bits(), b.y.to_bits());
    }
}
