use std::sync::Arc;

use once_cell::unsync::OnceCell;

use crate::catalog::Location;
use crate::corridor::Corridor;

/// Index of a node inside a [`SearchContext`].
pub type NodeId = usize;

/// Jump edge between two nodes of the same search context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub target: NodeId,
    pub distance: f64,
}

/// A location wrapped for pathfinding, with its lazily computed jump edges.
#[derive(Debug)]
pub struct GraphNode {
    location: Arc<Location>,
    neighbours: OnceCell<Vec<Edge>>,
}

impl GraphNode {
    fn new(location: Arc<Location>) -> Self {
        Self {
            location,
            neighbours: OnceCell::new(),
        }
    }

    pub fn location(&self) -> &Arc<Location> {
        &self.location
    }

    /// Whether the adjacency list has already been computed.
    pub fn is_expanded(&self) -> bool {
        self.neighbours.get().is_some()
    }
}

/// Arena of graph nodes owned by exactly one point-to-point query.
///
/// Edges are never materialised up front. The first call to
/// [`SearchContext::neighbours`] for a node scans the whole arena and links
/// every other node strictly closer than the jump range; later calls return
/// the stored list. The arena (and every adjacency list) is dropped with the
/// context, so nothing leaks between queries.
#[derive(Debug)]
pub struct SearchContext {
    nodes: Vec<GraphNode>,
    jump_range: f64,
    start: Option<NodeId>,
    goal: Option<NodeId>,
}

impl SearchContext {
    pub fn new(locations: Vec<Arc<Location>>, jump_range: f64) -> Self {
        Self {
            nodes: locations.into_iter().map(GraphNode::new).collect(),
            jump_range,
            start: None,
            goal: None,
        }
    }

    /// Build a context from a culled corridor, keeping its endpoint flags.
    pub fn from_corridor(corridor: Corridor, jump_range: f64) -> Self {
        let mut context = Self::new(corridor.members, jump_range);
        context.start = corridor.start;
        context.goal = corridor.goal;
        context
    }

    pub fn jump_range(&self) -> f64 {
        self.jump_range
    }

    pub fn start(&self) -> Option<NodeId> {
        self.start
    }

    pub fn goal(&self) -> Option<NodeId> {
        self.goal
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &GraphNode {
        &self.nodes[id]
    }

    pub fn location(&self, id: NodeId) -> &Arc<Location> {
        &self.nodes[id].location
    }

    /// Number of nodes whose adjacency list has been computed so far.
    pub fn expanded_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_expanded()).count()
    }

    /// Return the jump edges leaving `id`, computing them on first use.
    pub fn neighbours(&self, id: NodeId) -> &[Edge] {
        self.nodes[id]
            .neighbours
            .get_or_init(|| self.link(id))
            .as_slice()
    }

    fn link(&self, id: NodeId) -> Vec<Edge> {
        let origin = &self.nodes[id].location.position;
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(target, node)| {
                let distance = origin.distance_to(&node.location.position);
                (distance > 0.0 && distance < self.jump_range).then_some(Edge { target, distance })
            })
            .collect()
    }
}
