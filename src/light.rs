//! Lights as reported by the bridge.

use serde::{Deserialize, Serialize};

use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// A controllable light on the bridge.
///
/// Lights are addressed by the id the bridge assigns them but configured by
/// their human-readable name, so a `Light` is looked up by name every time it
/// is needed instead of being cached.
///
/// # Example
///
/// ```
/// use hue_calendar_rs::Light;
///
/// let lights = vec![Light::new("1", "Hallway"), Light::new("4", "Kitchen")];
/// let light = Light::find(&lights, "Kitchen").unwrap();
/// assert_eq!(light.id(), "4");
/// assert!(Light::find(&lights, "Garage").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Light {
    id: String,
    name: String,
}

impl Light {
    pub fn new(id: &str, name: &str) -> Self {
        Light {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pick the light called `name` out of the bridge's current light set.
    pub fn find(lights: &[Light], name: &str) -> Result<Light> {
        lights
            .iter()
            .find(|light| light.name == name)
            .cloned()
            .ok_or_else(|| {
                Error::light_not_found(name, lights.iter().map(|l| l.name.clone()).collect())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_reports_available_names() {
        let lights = vec![Light::new("1", "Hallway"), Light::new("2", "Desk")];
        let err = Light::find(&lights, "hallway").unwrap_err();
        assert_eq!(
            err,
            Error::light_not_found("hallway", vec!["Hallway".into(), "Desk".into()])
        );
        assert!(err.is_transient());
    }
}
