//! starroute library entry points.
//!
//! This crate keeps a catalog of named locations in space, finds jump paths
//! between two of them under a maximum jump range, and plans multi-stop tours
//! over a set of destinations. Higher-level consumers (the CLI) should only
//! depend on the functions exported here instead of reimplementing behavior.
//!
//! ```
//! use starroute_lib::{find_path, Catalog, Location, PathOptions, Position};
//!
//! let catalog: Catalog = [
//!     Location::new("A", Position::new(0.0, 0.0, 0.0)),
//!     Location::new("B", Position::new(10.0, 0.0, 0.0)),
//!     Location::new("C", Position::new(20.0, 0.0, 0.0)),
//! ]
//! .into_iter()
//! .collect();
//!
//! let result = find_path(&catalog, "A", "C", &PathOptions::with_jump_range(15.0));
//! assert_eq!(result.names(), vec!["A", "B", "C"]);
//! ```

pub mod catalog;
pub mod corridor;
pub mod dataset;
pub mod error;
pub mod graph;
pub mod matrix;
pub mod optimizer;
pub mod output;
pub mod path;
pub mod tour;

pub use catalog::{Catalog, Location, Planet, Position};
pub use corridor::{cull, Corridor};
pub use dataset::{
    default_dataset_path, load_catalog, load_destinations, resolve_dataset_path, DATASET_ENV,
};
pub use error::{Error, Result};
pub use graph::{Edge, NodeId, SearchContext};
pub use matrix::{
    build_matrix, build_matrix_with, CostModel, DistanceMatrix, EuclideanCost, JumpCountCost,
    MatrixCell, PairCost,
};
pub use optimizer::{
    FirstSolution, LocalSearchOptimizer, OptimizerOptions, RouteOptimizer, TourOrder,
};
pub use output::{format_distance, render_path, render_tour, RenderMode};
pub use path::{
    find_path, PathOptions, PathResult, Router, DEFAULT_CORRIDOR_BUFFER, DEFAULT_JUMP_RANGE,
};
pub use tour::{
    spawn_tour, spawn_tour_with, TourOutcome, TourPlanner, TourRequest, TourResult, TourRow,
    TourState, TourTask, DEFAULT_MAX_STOPS, ORIGIN_LABEL,
};
