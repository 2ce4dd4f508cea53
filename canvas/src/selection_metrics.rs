//! Selection aggregate values for the properties panel.
//!
//! Each property is reduced over the selected shapes to a [`Shared`] value:
//! `Uniform` when every selected shape rounds to the same value, `Mixed`
//! otherwise, `Empty` when nothing is selected. Equality is compared
//! explicitly on the rounded values, so a uniform 0 is reported as `Uniform(0)`.

#[cfg(test)]
#[path = "selection_metrics_test.rs"]
mod selection_metrics_test;

use std::fmt;

use serde::Serialize;

use crate::doc::{Scene, Shape};

/// A property value reduced over the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum Shared<T> {
    /// Nothing selected.
    #[default]
    Empty,
    /// Every selected shape has this value.
    Uniform(T),
    /// Selected shapes disagree.
    Mixed,
}

impl<T: PartialEq> Shared<T> {
    /// Reduce `values` with explicit equality against the first.
    pub fn collect<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut iter = values.into_iter();
        let Some(first) = iter.next() else {
            return Self::Empty;
        };
        if iter.all(|v| v == first) { Self::Uniform(first) } else { Self::Mixed }
    }

    #[must_use]
    pub fn uniform(&self) -> Option<&T> {
        match self {
            Self::Uniform(v) => Some(v),
            Self::Empty | Self::Mixed => None,
        }
    }
}

/// Field text: the value when uniform, blank otherwise.
impl<T: fmt::Display> fmt::Display for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uniform(v) => write!(f, "{v}"),
            Self::Empty | Self::Mixed => Ok(()),
        }
    }
}

/// Rounded geometry of the selection as shown in the properties panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PropertySummary {
    pub count: usize,
    /// Center x in stage units.
    pub x: Shared<i64>,
    /// Center y in stage units.
    pub y: Shared<i64>,
    pub width: Shared<i64>,
    pub height: Shared<i64>,
    /// Rotation in whole degrees.
    pub rotation_deg: Shared<i64>,
}

impl PropertySummary {
    /// Summarize the current selection.
    ///
    /// With nothing selected, width and height show the stage size and the
    /// other fields stay empty.
    #[must_use]
    pub fn of_selection(scene: &Scene, stage_width: f64, stage_height: f64) -> Self {
        let shapes = scene.selected_shapes();
        if shapes.is_empty() {
            return Self {
                width: Shared::Uniform(round(stage_width)),
                height: Shared::Uniform(round(stage_height)),
                ..Self::default()
            };
        }
        Self::of_shapes(&shapes)
    }

    #[must_use]
    pub fn of_shapes(shapes: &[&Shape]) -> Self {
        let reduce = |f: fn(&Shape) -> f64| Shared::collect(shapes.iter().copied().map(|s| round(f(s))));
        Self {
            count: shapes.len(),
            x: reduce(|s| s.center.x),
            y: reduce(|s| s.center.y),
            width: reduce(|s| s.width),
            height: reduce(|s| s.height),
            rotation_deg: reduce(|s| s.rotation.to_degrees()),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn round(value: f64) -> i64 {
    value.round() as i64
}
