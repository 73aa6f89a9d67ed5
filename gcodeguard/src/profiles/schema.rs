//! Material profile and safe range types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Material used when a requested name is not in the registry.
pub const DEFAULT_MATERIAL: &str = "PLA";

/// Recommended temperatures for one filament type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialProfile {
    pub name: String,
    pub nozzle_min_c: f64,
    pub nozzle_max_c: f64,
    pub bed_c: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for MaterialProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_MATERIAL.to_string(),
            nozzle_min_c: 190.0,
            nozzle_max_c: 215.0,
            bed_c: 50.0,
            description: None,
        }
    }
}

/// Absolute bounds for one parameter letter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeRange {
    pub letter: char,
    pub min: f64,
    pub max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SafeRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Material-independent safe ranges keyed by parameter letter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SafeRangeTable {
    ranges: BTreeMap<char, SafeRange>,
}

impl SafeRangeTable {
    pub fn new(ranges: impl IntoIterator<Item = SafeRange>) -> Self {
        Self {
            ranges: ranges.into_iter().map(|r| (r.letter, r)).collect(),
        }
    }

    pub fn get(&self, letter: char) -> Option<&SafeRange> {
        self.ranges.get(&letter)
    }

    /// The range `value` violates, if any. Letters without a range never violate.
    pub fn violation(&self, letter: char, value: f64) -> Option<&SafeRange> {
        self.get(letter).filter(|range| !range.contains(value))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SafeRange> {
        self.ranges.values()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
