//! Symmetric pairwise cost matrix built in parallel.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::catalog::Location;
use crate::path::{PathOptions, Router};

/// State of one matrix cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum MatrixCell {
    /// No task has been scheduled for the pair yet.
    NotComputed,
    /// A task for the unordered pair has been scheduled.
    Pending,
    /// The cost function found no way between the pair.
    Unreachable,
    Value(f64),
}

impl MatrixCell {
    /// Finite cost, if the cell holds one.
    pub fn value(self) -> Option<f64> {
        match self {
            MatrixCell::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_reachable(self) -> bool {
        matches!(self, MatrixCell::Value(_))
    }
}

/// Cost function evaluated for every unordered pair of the matrix.
///
/// Implementations are called concurrently from the worker pool.
pub trait PairCost: Sync {
    fn cost(&self, from: &Location, to: &Location) -> MatrixCell;
}

/// Straight-line distance between the two locations.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanCost;

impl PairCost for EuclideanCost {
    fn cost(&self, from: &Location, to: &Location) -> MatrixCell {
        MatrixCell::Value(from.distance_to(to))
    }
}

/// Number of jumps on the point-to-point path between the two locations.
#[derive(Debug, Clone)]
pub struct JumpCountCost {
    router: Router,
    options: PathOptions,
}

impl JumpCountCost {
    pub fn new(router: Router, options: PathOptions) -> Self {
        Self { router, options }
    }
}

impl PairCost for JumpCountCost {
    fn cost(&self, from: &Location, to: &Location) -> MatrixCell {
        let result = self.router.solve(&from.name, &to.name, &self.options);
        if result.is_valid() {
            MatrixCell::Value(result.hop_count() as f64)
        } else {
            MatrixCell::Unreachable
        }
    }
}

/// Which cost function a tour's matrix is built with.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CostModel {
    /// Straight-line distance.
    #[default]
    Euclidean,
    /// Jump count of the point-to-point path under the given options.
    JumpCount(PathOptions),
}

/// Square matrix indexed by position in the destination list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceMatrix {
    size: usize,
    cells: Vec<MatrixCell>,
}

impl DistanceMatrix {
    /// Matrix with a zero diagonal and every other cell not yet computed.
    pub fn new(size: usize) -> Self {
        let mut cells = vec![MatrixCell::NotComputed; size * size];
        for i in 0..size {
            cells[i * size + i] = MatrixCell::Value(0.0);
        }
        Self { size, cells }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, from: usize, to: usize) -> MatrixCell {
        self.cells[from * self.size + to]
    }

    /// Finite arc cost, `None` for unreachable or unfinished cells.
    pub fn cost(&self, from: usize, to: usize) -> Option<f64> {
        self.get(from, to).value()
    }

    /// Store `cell` in both `(a, b)` and `(b, a)`.
    pub fn set_pair(&mut self, a: usize, b: usize, cell: MatrixCell) {
        self.cells[a * self.size + b] = cell;
        self.cells[b * self.size + a] = cell;
    }

    /// Whether every cell holds a final state.
    pub fn is_complete(&self) -> bool {
        self.cells
            .iter()
            .all(|cell| !matches!(cell, MatrixCell::NotComputed | MatrixCell::Pending))
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| (0..i).all(|j| self.get(i, j) == self.get(j, i)))
    }

    /// Row-major copy of the cells, for display.
    pub fn rows(&self) -> Vec<Vec<MatrixCell>> {
        self.cells
            .chunks(self.size.max(1))
            .take(self.size)
            .map(<[MatrixCell]>::to_vec)
            .collect()
    }
}

/// Compute the full matrix for `locations`.
///
/// Each unordered pair is scheduled exactly once and evaluated on the rayon
/// pool. The call returns only after every task has finished, with each
/// result mirrored into both halves of the matrix.
pub fn build_matrix<C>(locations: &[Arc<Location>], cost: &C) -> DistanceMatrix
where
    C: PairCost + ?Sized,
{
    let started = Instant::now();
    let size = locations.len();
    let mut matrix = DistanceMatrix::new(size);

    let mut scheduled = Vec::new();
    for from in 0..size {
        for to in 0..size {
            if from != to && matrix.get(to, from) == MatrixCell::NotComputed {
                matrix.set_pair(from, to, MatrixCell::Pending);
                scheduled.push((from, to));
            }
        }
    }
    debug!(size, tasks = scheduled.len(), "scheduled distance matrix tasks");

    let computed: Vec<((usize, usize), MatrixCell)> = scheduled
        .into_par_iter()
        .map(|(from, to)| ((from, to), cost.cost(&locations[from], &locations[to])))
        .collect();

    for ((from, to), cell) in computed {
        matrix.set_pair(from, to, cell);
    }

    debug!(
        size,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "distance matrix complete"
    );
    matrix
}

/// Build a matrix using the cost function selected by `model`.
///
/// `router` is only consulted for [`CostModel::JumpCount`].
pub fn build_matrix_with(
    locations: &[Arc<Location>],
    model: &CostModel,
    router: &Router,
) -> DistanceMatrix {
    match model {
        CostModel::Euclidean => build_matrix(locations, &EuclideanCost),
        CostModel::JumpCount(options) => {
            build_matrix(locations, &JumpCountCost::new(router.clone(), *options))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::catalog::{Catalog, Position};

    fn points(coords: &[(f64, f64, f64)]) -> Vec<Arc<Location>> {
        coords
            .iter()
            .enumerate()
            .map(|(i, (x, y, z))| Arc::new(Location::new(format!("P{i}"), Position::new(*x, *y, *z))))
            .collect()
    }

    struct CountingCost(AtomicUsize);

    impl PairCost for CountingCost {
        fn cost(&self, from: &Location, to: &Location) -> MatrixCell {
            self.0.fetch_add(1, Ordering::SeqCst);
            MatrixCell::Value(from.distance_to(to))
        }
    }

    #[test]
    fn euclidean_matrix_is_symmetric_with_zero_diagonal() {
        let locations = points(&[(0.0, 0.0, 0.0), (3.0, 4.0, 0.0), (6.0, 8.0, 0.0)]);
        let matrix = build_matrix(&locations, &EuclideanCost);

        assert_eq!(matrix.len(), 3);
        assert!(matrix.is_complete());
        assert!(matrix.is_symmetric());
        for i in 0..3 {
            assert_eq!(matrix.cost(i, i), Some(0.0));
        }
        assert_eq!(matrix.cost(0, 1), Some(5.0));
        assert_eq!(matrix.cost(2, 0), Some(10.0));
    }

    #[test]
    fn each_unordered_pair_is_computed_once() {
        let locations = points(&[
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (2.0, 0.0, 0.0),
            (3.0, 0.0, 0.0),
            (4.0, 0.0, 0.0),
        ]);
        let counter = CountingCost(AtomicUsize::new(0));
        let matrix = build_matrix(&locations, &counter);

        assert_eq!(counter.0.load(Ordering::SeqCst), 10);
        assert!(matrix.is_symmetric());
    }

    #[test]
    fn empty_and_single_matrices() {
        let empty = build_matrix(&[], &EuclideanCost);
        assert!(empty.is_empty());
        assert!(empty.rows().is_empty());

        let single = build_matrix(&points(&[(1.0, 1.0, 1.0)]), &EuclideanCost);
        assert_eq!(single.rows(), vec![vec![MatrixCell::Value(0.0)]]);
    }

    #[test]
    fn jump_count_marks_unreachable_pairs() {
        let catalog: Catalog = [
            Location::new("A", Position::new(0.0, 0.0, 0.0)),
            Location::new("B", Position::new(10.0, 0.0, 0.0)),
            Location::new("C", Position::new(20.0, 0.0, 0.0)),
            Location::new("Island", Position::new(500.0, 0.0, 0.0)),
        ]
        .into_iter()
        .collect();
        let router = Router::new(&catalog);
        let destinations: Vec<Arc<Location>> = ["A", "C", "Island"]
            .iter()
            .filter_map(|name| catalog.find(name))
            .collect();

        let model = CostModel::JumpCount(PathOptions::with_jump_range(15.0));
        let matrix = build_matrix_with(&destinations, &model, &router);

        assert_eq!(matrix.get(0, 1), MatrixCell::Value(2.0));
        assert_eq!(matrix.get(0, 2), MatrixCell::Unreachable);
        assert_eq!(matrix.get(2, 1), MatrixCell::Unreachable);
        assert!(matrix.is_symmetric());
        assert!(matrix.is_complete());
    }

    #[test]
    fn cells_serialize_with_explicit_state() {
        let json = serde_json::to_string(&MatrixCell::Value(2.5)).unwrap();
        assert_eq!(json, r#"{"state":"value","value":2.5}"#);
        let json = serde_json::to_string(&MatrixCell::Unreachable).unwrap();
        assert_eq!(json, r#"{"state":"unreachable"}"#);
    }
}
