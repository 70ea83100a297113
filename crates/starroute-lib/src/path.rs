use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::catalog::{Catalog, Location};
use crate::corridor::cull;
use crate::error::{Error, Result};
use crate::graph::{NodeId, SearchContext};

/// Jump range used when the caller does not provide one, in light-years.
pub const DEFAULT_JUMP_RANGE: f64 = 45.0;

/// Radius of the search corridor around the direct line, in light-years.
///
/// Stepping stones further than this from the direct line are never
/// considered, even when they would shorten the route.
pub const DEFAULT_CORRIDOR_BUFFER: f64 = 100.0;

/// Tuning for a point-to-point query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathOptions {
    /// Maximum length of a single jump. Edges must be strictly shorter.
    pub jump_range: f64,
    /// Corridor radius handed to the culler.
    pub corridor_buffer: f64,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            jump_range: DEFAULT_JUMP_RANGE,
            corridor_buffer: DEFAULT_CORRIDOR_BUFFER,
        }
    }
}

impl PathOptions {
    pub fn with_jump_range(jump_range: f64) -> Self {
        Self {
            jump_range,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.jump_range.is_finite() || self.jump_range <= 0.0 {
            return Err(Error::InvalidOption {
                option: "jump_range",
                message: format!("expected a positive distance, got {}", self.jump_range),
            });
        }
        if !self.corridor_buffer.is_finite() || self.corridor_buffer <= 0.0 {
            return Err(Error::InvalidOption {
                option: "corridor_buffer",
                message: format!("expected a positive distance, got {}", self.corridor_buffer),
            });
        }
        Ok(())
    }
}

/// Outcome of a point-to-point query.
///
/// Unknown endpoints and unreachable goals produce an invalid result rather
/// than an error, so the result can be used directly as a matrix cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathResult {
    pub valid: bool,
    pub path: Vec<Arc<Location>>,
    pub distance: f64,
}

impl PathResult {
    pub fn invalid() -> Self {
        Self {
            valid: false,
            path: Vec::new(),
            distance: 0.0,
        }
    }

    /// Build a valid result, summing the consecutive jump distances.
    pub fn from_path(path: Vec<Arc<Location>>) -> Self {
        let distance = path
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .sum();
        Self {
            valid: true,
            path,
            distance,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Number of jumps in the path.
    pub fn hop_count(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn names(&self) -> Vec<&str> {
        self.path.iter().map(|l| l.name.as_str()).collect()
    }
}

/// Re-entrant point-to-point solver over a frozen set of locations.
///
/// A router is cheap to clone and safe to share between threads. Every call
/// to [`Router::solve`] builds its own [`SearchContext`] and drops it before
/// returning.
#[derive(Debug, Clone, Default)]
pub struct Router {
    locations: Arc<[Arc<Location>]>,
    by_name: Arc<HashMap<String, usize>>,
}

impl Router {
    /// Capture the catalog's current contents.
    pub fn new(catalog: &Catalog) -> Self {
        Self::from_locations(catalog.snapshot())
    }

    pub fn from_locations(locations: Arc<[Arc<Location>]>) -> Self {
        let by_name = locations
            .iter()
            .enumerate()
            .map(|(index, location)| (location.name.clone(), index))
            .collect();
        Self {
            locations,
            by_name: Arc::new(by_name),
        }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&Arc<Location>> {
        self.by_name.get(name).map(|&index| &self.locations[index])
    }

    /// Find the shortest jump path between two named locations.
    pub fn solve(&self, start: &str, goal: &str, options: &PathOptions) -> PathResult {
        let (Some(from), Some(to)) = (self.find(start), self.find(goal)) else {
            debug!(start, goal, "unknown endpoint");
            return PathResult::invalid();
        };

        let corridor = cull(&self.locations, from, to, options.corridor_buffer);
        let context = SearchContext::from_corridor(corridor, options.jump_range);
        let (Some(start_id), Some(goal_id)) = (context.start(), context.goal()) else {
            debug!(start, goal, "endpoint outside search corridor");
            return PathResult::invalid();
        };

        match find_route_a_star(&context, start_id, goal_id) {
            Some(nodes) => PathResult::from_path(
                nodes
                    .into_iter()
                    .map(|id| Arc::clone(context.location(id)))
                    .collect(),
            ),
            None => {
                debug!(
                    start,
                    goal,
                    jump_range = options.jump_range,
                    "no path within jump range"
                );
                PathResult::invalid()
            }
        }
    }
}

/// Convenience wrapper that solves a single query against a catalog.
pub fn find_path(catalog: &Catalog, start: &str, goal: &str, options: &PathOptions) -> PathResult {
    Router::new(catalog).solve(start, goal, options)
}

/// Run A* over a search context using the straight-line distance to the goal
/// as heuristic.
///
/// Every edge is a straight jump, so no edge is shorter than the straight-line
/// distance it covers and the heuristic never overestimates.
pub fn find_route_a_star(
    context: &SearchContext,
    start: NodeId,
    goal: NodeId,
) -> Option<Vec<NodeId>> {
    if start == goal {
        return Some(vec![start]);
    }

    let goal_position = context.location(goal).position;
    let heuristic = |node: NodeId| context.location(node).position.distance_to(&goal_position);

    let mut g_score = vec![f64::INFINITY; context.len()];
    let mut parents: Vec<Option<NodeId>> = vec![None; context.len()];
    let mut queue = BinaryHeap::new();
    let mut expanded = 0usize;

    g_score[start] = 0.0;
    queue.push(AStarEntry::new(start, 0.0, heuristic(start)));

    while let Some(entry) = queue.pop() {
        // Skip stale entries superseded by a cheaper path.
        if entry.cost.0 > g_score[entry.node] {
            continue;
        }

        if entry.node == goal {
            debug!(expanded, nodes = context.len(), "a* reached goal");
            return Some(reconstruct_path(&parents, start, goal));
        }
        expanded += 1;

        for edge in context.neighbours(entry.node) {
            let tentative_g = entry.cost.0 + edge.distance;
            if tentative_g < g_score[edge.target] {
                g_score[edge.target] = tentative_g;
                parents[edge.target] = Some(entry.node);
                queue.push(AStarEntry::new(
                    edge.target,
                    tentative_g,
                    heuristic(edge.target),
                ));
            }
        }
    }

    debug!(expanded, nodes = context.len(), "a* exhausted open set");
    None
}

fn reconstruct_path(parents: &[Option<NodeId>], start: NodeId, goal: NodeId) -> Vec<NodeId> {
    let mut path = Vec::new();
    let mut current = Some(goal);
    while let Some(node) = current {
        path.push(node);
        if node == start {
            break;
        }
        current = parents[node];
    }
    path.reverse();
    path
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct AStarEntry {
    node: NodeId,
    cost: FloatOrd,
    estimate: FloatOrd,
}

impl AStarEntry {
    fn new(node: NodeId, cost: f64, heuristic: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
            estimate: FloatOrd(cost + heuristic),
        }
    }
}

impl Ord for AStarEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by estimate.
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for AStarEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
