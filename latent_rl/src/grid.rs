//! Hyperparameter grids.
//!
//! A grid maps each hyperparameter name to a list of candidate values and
//! expands to every combination, in standard product order: the first key
//! varies slowest, the last key fastest.
//!
//! # Usage
//!
//! ```ignore
//! use latent_rl::grid::{get_configs, ConfigGrid};
//! use serde_json::json;
//!
//! let grid = ConfigGrid::new()
//!     .with_axis("num_layers", [2, 4])
//!     .with_axis("hidden_dim", [64, 128]);
//! for overrides in grid.iter() {
//!     let config: BeliefConfig = apply_overrides(&base, &overrides)?;
//!     // ...
//! }
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{LatentRlError, Result};

/// One combination: hyperparameter name -> value, in grid key order.
pub type GridPoint = Map<String, Value>;

/// Expansions larger than this are logged as a warning.
const LARGE_GRID: usize = 10_000;

/// Ordered set of hyperparameter axes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigGrid {
    axes: Vec<(String, Vec<Value>)>,
}

impl ConfigGrid {
    /// Empty grid. Expands to a single empty combination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an axis, or replace the values of an existing one in place.
    pub fn with_axis<V: Into<Value>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let name = name.into();
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();

        match self.axes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = values,
            None => self.axes.push((name, values)),
        }
        self
    }

    /// Build from a JSON object whose values are all arrays.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let axes = map
            .iter()
            .map(|(key, value)| match value {
                Value::Array(values) => Ok((key.clone(), values.clone())),
                other => Err(LatentRlError::invalid_grid(format!(
                    "values for '{}' must be a list, got {}",
                    key, other
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { axes })
    }

    /// Parse a JSON object such as `{"lr": [0.1, 0.01], "layers": [2, 4]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(map) => Self::from_map(&map),
            other => Err(LatentRlError::invalid_grid(format!(
                "grid must be a JSON object, got {}",
                other
            ))),
        }
    }

    /// Axis names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().map(|(key, _)| key.as_str())
    }

    /// Number of combinations, without materializing them.
    pub fn len(&self) -> usize {
        self.axes.iter().map(|(_, values)| values.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lazily iterate combinations in product order.
    pub fn iter(&self) -> GridIter<'_> {
        GridIter {
            grid: self,
            indices: vec![0; self.axes.len()],
            done: self.is_empty(),
        }
    }

    /// All combinations in product order.
    pub fn configs(&self) -> Vec<GridPoint> {
        let n = self.len();
        if n > LARGE_GRID {
            log::warn!("expanding hyperparameter grid with {} combinations", n);
        }
        self.iter().collect()
    }
}

impl<'a> IntoIterator for &'a ConfigGrid {
    type Item = GridPoint;
    type IntoIter = GridIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the combinations of a [`ConfigGrid`].
#[derive(Debug, Clone)]
pub struct GridIter<'a> {
    grid: &'a ConfigGrid,
    /// Current value index per axis
    indices: Vec<usize>,
    done: bool,
}

impl Iterator for GridIter<'_> {
    type Item = GridPoint;

    fn next(&mut self) -> Option<GridPoint> {
        if self.done {
            return None;
        }

        let point = self
            .grid
            .axes
            .iter()
            .zip(&self.indices)
            .map(|((key, values), &i)| (key.clone(), values[i].clone()))
            .collect();

        // Odometer: last axis fastest
        self.done = true;
        for (axis, index) in self.indices.iter_mut().enumerate().rev() {
            *index += 1;
            if *index < self.grid.axes[axis].1.len() {
                self.done = false;
                break;
            }
            *index = 0;
        }

        Some(point)
    }
}

/// Expand a mapping of hyperparameter name -> candidate list into every
/// combination, preserving key order, first key slowest-varying.
pub fn get_configs(grid: &Map<String, Value>) -> Result<Vec<GridPoint>> {
    Ok(ConfigGrid::from_map(grid)?.configs())
}

/// Apply grid overrides to a typed base configuration.
///
/// The base is serialized to a JSON object, the overrides replace matching
/// fields, and the result is deserialized back. Unknown keys are rejected.
pub fn apply_overrides<T: Serialize + DeserializeOwned>(base: &T, overrides: &GridPoint) -> Result<T> {
    let mut fields = match serde_json::to_value(base)? {
        Value::Object(fields) => fields,
        other => {
            return Err(LatentRlError::invalid_grid(format!(
                "base configuration must serialize to an object, got {}",
                other
            )))
        }
    };

    for (key, value) in overrides {
        match fields.get_mut(key) {
            Some(slot) => *slot = value.clone(),
            None => {
                return Err(LatentRlError::invalid_grid(format!(
                    "unknown configuration field '{}'",
                    key
                )))
            }
        }
    }

    Ok(serde_json::from_value(Value::Object(fields))?)
}
