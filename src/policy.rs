//! Event title to color mapping.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::types::Color;

/// Operator-supplied association of event titles with colors.
///
/// Titles are matched exactly; a title without an entry resolves to
/// [`Color::WHITE`].
///
/// # Examples
///
/// ```
/// use hue_calendar_rs::{Color, TitleColorMap};
///
/// let map = TitleColorMap::from_iter([("Paper".to_string(), Color::rgb(0, 0, 255))]);
/// assert_eq!(map.resolve("Paper"), Color::rgb(0, 0, 255));
/// assert_eq!(map.resolve("paper"), Color::WHITE);
/// ```
#[serde_as]
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TitleColorMap(#[serde_as(as = "HashMap<_, DisplayFromStr>")] HashMap<String, Color>);

impl TitleColorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, title: &str, color: Color) -> Option<Color> {
        self.0.insert(title.to_string(), color)
    }

    pub fn get(&self, title: &str) -> Option<&Color> {
        self.0.get(title)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The color for `title`, or white when the title is not mapped.
    pub fn resolve(&self, title: &str) -> Color {
        resolve_color(title, self)
    }
}

impl FromIterator<(String, Color)> for TitleColorMap {
    fn from_iter<I: IntoIterator<Item = (String, Color)>>(iter: I) -> Self {
        TitleColorMap(iter.into_iter().collect())
    }
}

/// Resolve the color for an event title against `mapping`.
pub fn resolve_color(title: &str, mapping: &TitleColorMap) -> Color {
    mapping.get(title).copied().unwrap_or(Color::WHITE)
}
