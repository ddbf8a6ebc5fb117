//! Script bundle model
//!
//! Defines the value types produced by directive expansion:
//! - `ScriptUnit`: one logical script with its expanded source text
//! - `ScriptBundle`: the ordered, deduplicated set of units for a build

use std::collections::HashSet;
use std::path::PathBuf;

/// One logical script destined for the output document.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptUnit {
    /// Logical name, unique within a bundle (e.g. `util.py`)
    pub name: String,

    /// Fully expanded source text
    pub source: String,

    /// File the unit was expanded from (informational)
    pub origin: PathBuf,
}

impl ScriptUnit {
    /// Create a new ScriptUnit
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        origin: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            origin: origin.into(),
        }
    }
}

/// Ordered, deduplicated set of script units.
///
/// Units keep the order in which they were first inserted; re-inserting
/// a name that is already present is a no-op.
#[derive(Debug, Clone, Default)]
pub struct ScriptBundle {
    units: Vec<ScriptUnit>,
    names: HashSet<String>,
}

impl ScriptBundle {
    /// Create an empty bundle
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a unit, keeping first-insertion order.
    ///
    /// Returns `false` (and leaves the bundle unchanged) when a unit
    /// with the same name is already present.
    pub fn insert(&mut self, unit: ScriptUnit) -> bool {
        if !self.names.insert(unit.name.clone()) {
            return false;
        }
        self.units.push(unit);
        true
    }

    /// Whether a logical name is already present
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Look up a unit by logical name
    pub fn get(&self, name: &str) -> Option<&ScriptUnit> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Units in first-insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ScriptUnit> {
        self.units.iter()
    }

    /// Logical names in first-insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|u| u.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
