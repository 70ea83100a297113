use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Minimum Jaro-Winkler similarity for a name to be offered as a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Cartesian coordinates of a location, in light-years.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Calculate the Euclidean distance to another position.
    pub fn distance_to(&self, other: &Self) -> f64 {
        self.distance_squared_to(other).sqrt()
    }

    pub fn distance_squared_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub(crate) fn minus(&self, other: &Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub(crate) fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub(crate) fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A planet carrying named settlements. Only used to annotate tour rows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Planet {
    pub name: String,
    #[serde(default)]
    pub settlements: Vec<String>,
}

/// A named point in space that routes can visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub planets: Vec<Planet>,
}

impl Location {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
            planets: Vec::new(),
        }
    }

    /// Attach planets (and their settlements) to the location.
    pub fn with_planets(mut self, planets: Vec<Planet>) -> Self {
        self.planets = planets;
        self
    }

    pub fn distance_to(&self, other: &Location) -> f64 {
        self.position.distance_to(&other.position)
    }

    /// Reject records that cannot take part in routing.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidLocation {
                name: self.name.clone(),
                message: "name must not be empty".to_string(),
            });
        }
        if !self.position.is_finite() {
            return Err(Error::InvalidLocation {
                name: self.name.clone(),
                message: "coordinates must be finite".to_string(),
            });
        }
        Ok(())
    }
}

/// Name-keyed store of every known location.
///
/// The catalog is created once at startup and only mutated through
/// [`Catalog::add`]. Solvers work on a [`Catalog::snapshot`], so adding a
/// location never affects a computation that is already running.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    locations: HashMap<String, Arc<Location>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a location, replacing any existing entry with the same name.
    pub fn add(&mut self, location: Location) {
        if let Some(previous) = self
            .locations
            .insert(location.name.clone(), Arc::new(location))
        {
            debug!(name = %previous.name, "replaced existing location");
        }
    }

    /// Lookup a location by its case-sensitive name.
    pub fn find(&self, name: &str) -> Option<Arc<Location>> {
        self.locations.get(name).cloned()
    }

    /// Lookup a location, producing an error with close-match suggestions when missing.
    pub fn resolve(&self, name: &str) -> Result<Arc<Location>> {
        self.find(name).ok_or_else(|| Error::UnknownLocation {
            name: name.to_string(),
            suggestions: self.fuzzy_matches(name, 3),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.locations.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Location>> {
        self.locations.values()
    }

    /// Capture the current contents, ordered by name.
    pub fn snapshot(&self) -> Arc<[Arc<Location>]> {
        let mut all: Vec<Arc<Location>> = self.locations.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all.into()
    }

    /// Names similar to `name`, best match first.
    pub fn fuzzy_matches(&self, name: &str, limit: usize) -> Vec<String> {
        let needle = name.to_lowercase();
        let mut scored: Vec<(f64, &str)> = self
            .locations
            .keys()
            .map(|candidate| {
                let score = strsim::jaro_winkler(&needle, &candidate.to_lowercase());
                (score, candidate.as_str())
            })
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, candidate)| candidate.to_string())
            .collect()
    }
}

impl Extend<Location> for Catalog {
    fn extend<T: IntoIterator<Item = Location>>(&mut self, iter: T) {
        for location in iter {
            self.add(location);
        }
    }
}

impl FromIterator<Location> for Catalog {
    fn from_iter<T: IntoIterator<Item = Location>>(iter: T) -> Self {
        let mut catalog = Catalog::new();
        catalog.extend(iter);
        catalog
    }
}
