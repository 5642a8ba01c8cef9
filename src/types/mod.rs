//! Value types for light control parameters.

mod brightness;
mod color;
mod power;
mod xy;

pub use brightness::Brightness;
pub use color::Color;
pub use power::PowerMode;
pub use xy::Xy;
