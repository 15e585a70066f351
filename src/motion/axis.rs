//! # Axis Model
//!
//! Machine axis identifiers and signed axis→distance maps.
//!
//! Jog requests travel through the engine as [`AxisMap`]s: an ordered map
//! from machine axis to a signed numeric value. Depending on context the
//! values are either distances (discrete jogs) or unit-vector components
//! (continuous jogs), matching the axis words a G-code sender would emit.
//!
//! ## Usage
//!
//! ```
//! use pendant_bridge::motion::{Axis, AxisMap};
//!
//! let unit = AxisMap::from_iter([(Axis::X, 1.0), (Axis::Y, -1.0)]);
//! let step = unit.scaled(0.25);
//!
//! assert_eq!(step.get(Axis::X), Some(0.25));
//! assert_eq!(step.get(Axis::Y), Some(-0.25));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Machine axis identifier.
///
/// Covers the linear axes plus the single rotary axis common on hobby
/// machines; axes the machine does not have simply never appear in a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
    A,
}

impl Axis {
    /// Returns the G-code axis letter.
    ///
    /// # Examples
    ///
    /// ```
    /// use pendant_bridge::motion::Axis;
    ///
    /// assert_eq!(Axis::X.letter(), 'X');
    /// ```
    #[must_use]
    pub fn letter(&self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
            Axis::A => 'A',
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for Axis {
    type Err = String;

    /// Parses a single axis letter, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            "a" => Ok(Axis::A),
            other => Err(format!("unknown axis: {:?}", other)),
        }
    }
}

/// Ordered map from machine axis to a signed numeric value.
///
/// The engine never interprets the values itself; they are distances for
/// discrete jogs and direction components for continuous jogs. Ordering is
/// fixed (X before Y before Z before A) so logged commands are stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisMap(BTreeMap<Axis, f64>);

impl AxisMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map holding a single axis entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use pendant_bridge::motion::{Axis, AxisMap};
    ///
    /// let map = AxisMap::single(Axis::Z, -0.01);
    /// assert_eq!(map.get(Axis::Z), Some(-0.01));
    /// assert_eq!(map.len(), 1);
    /// ```
    #[must_use]
    pub fn single(axis: Axis, value: f64) -> Self {
        let mut map = BTreeMap::new();
        map.insert(axis, value);
        Self(map)
    }

    /// Inserts or replaces an axis entry.
    pub fn insert(&mut self, axis: Axis, value: f64) {
        self.0.insert(axis, value);
    }

    /// Returns the value for an axis, if present.
    #[must_use]
    pub fn get(&self, axis: Axis) -> Option<f64> {
        self.0.get(&axis).copied()
    }

    /// Returns true if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of axis entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over `(axis, value)` pairs in axis order.
    pub fn iter(&self) -> impl Iterator<Item = (Axis, f64)> + '_ {
        self.0.iter().map(|(axis, value)| (*axis, *value))
    }

    /// Returns a copy with every value multiplied by `factor`.
    ///
    /// Used to turn a signed unit vector into a per-cycle increment.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self(
            self.0
                .iter()
                .map(|(axis, value)| (*axis, value * factor))
                .collect(),
        )
    }
}

impl FromIterator<(Axis, f64)> for AxisMap {
    fn from_iter<I: IntoIterator<Item = (Axis, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for AxisMap {
    /// Formats as G-code-style axis words, e.g. `X0.25 Y-0.25`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (axis, value) in self.iter() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}{}", axis.letter(), value)?;
            first = false;
        }
        Ok(())
    }
}
