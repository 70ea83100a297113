//! Geometric pre-filter that narrows a catalog down to a search corridor.
//!
//! The corridor is a cylinder of radius `buffer` around the straight line
//! through the start and goal positions. Only locations inside it become
//! search nodes. This bounds the cost of a point-to-point query, at the price
//! of ignoring useful stepping stones that sit just outside the cylinder.

use std::sync::Arc;

use tracing::debug;

use crate::catalog::{Location, Position};

/// Locations admitted by [`cull`], with the endpoints flagged.
#[derive(Debug, Clone, Default)]
pub struct Corridor {
    pub members: Vec<Arc<Location>>,
    /// Index into `members` of the start location, if it was retained.
    pub start: Option<usize>,
    /// Index into `members` of the goal location, if it was retained.
    pub goal: Option<usize>,
}

impl Corridor {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Squared perpendicular distance from `point` to the line through `from` and `to`.
///
/// Degenerates to the squared distance from `from` when both ends coincide.
pub fn line_distance_squared(point: &Position, from: &Position, to: &Position) -> f64 {
    let denominator = to.minus(from).length_squared();
    if denominator == 0.0 {
        return point.distance_squared_to(from);
    }
    let numerator = point.minus(from).cross(&point.minus(to)).length_squared();
    numerator / denominator
}

/// Keep every location whose perpendicular distance to the `from`→`to` line
/// is below `buffer`.
///
/// The start and goal are identified by name while culling; they are only
/// flagged when they fall inside the corridor themselves.
pub fn cull(all: &[Arc<Location>], from: &Location, to: &Location, buffer: f64) -> Corridor {
    let buffer_squared = buffer * buffer;
    let mut corridor = Corridor::default();

    for location in all {
        let distance = line_distance_squared(&location.position, &from.position, &to.position);
        if distance >= buffer_squared {
            continue;
        }

        let index = corridor.members.len();
        if location.name == from.name {
            corridor.start = Some(index);
        } else if location.name == to.name {
            corridor.goal = Some(index);
        }
        corridor.members.push(Arc::clone(location));
    }

    if from.name == to.name {
        corridor.goal = corridor.start;
    }

    debug!(
        from = %from.name,
        to = %to.name,
        candidates = corridor.members.len(),
        total = all.len(),
        "culled search corridor"
    );
    corridor
}
